use crate::domain::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationType {
    Private,
    Group,
}

impl ConversationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Group => "GROUP",
        }
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIVATE" => Ok(Self::Private),
            "GROUP" => Ok(Self::Group),
            other => Err(format!("unknown conversation type: {other}")),
        }
    }
}

/// Normalized form of a member list: sorted and de-duplicated.
///
/// Two member lists describe the same set exactly when their keys are equal.
/// Stores guard PRIVATE inserts on this key so that identical concurrent creates converge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey(Vec<String>);

impl MemberKey {
    #[must_use]
    pub fn from_members(members: &[String]) -> Self {
        let mut key = members.to_vec();
        key.sort_unstable();
        key.dedup();
        Self(key)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Uuid,
    pub conversation_type: ConversationType,
    pub name: Option<String>,
    pub members: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: OffsetDateTime,
    // Reserved: nothing writes this yet.
    pub last_message_at: Option<OffsetDateTime>,
}

impl Conversation {
    #[must_use]
    pub fn has_all_members(&self, member_ids: &[String]) -> bool {
        member_ids.iter().all(|m| self.members.contains(m))
    }

    #[must_use]
    pub fn has_any_member(&self, member_ids: &[String]) -> bool {
        self.members.iter().any(|m| member_ids.contains(m))
    }
}

/// Fields supplied by a caller creating a conversation.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub owner_id: Option<String>,
    pub name: Option<String>,
    pub conversation_type: ConversationType,
    pub member_ids: Vec<String>,
}

/// A conversation together with a page of its messages.
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

impl ConversationDetail {
    #[must_use]
    pub const fn without_messages(conversation: Conversation) -> Self {
        Self { conversation, messages: Vec::new() }
    }
}
