use crate::api::dto::message::MessageResponse;
use crate::domain::conversation::{ConversationDetail, ConversationType, NewConversation};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl TryFrom<CreateConversationRequest> for NewConversation {
    type Error = AppError;

    fn try_from(request: CreateConversationRequest) -> Result<Self, Self::Error> {
        if request.member_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(AppError::InvalidArgument("Member ids cannot be blank".to_string()));
        }

        Ok(Self {
            owner_id: request.owner_id,
            name: request.name,
            conversation_type: request.conversation_type,
            member_ids: request.member_ids,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindConversationParams {
    pub message_page_number: Option<i32>,
    pub message_page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConversationsRequest {
    #[serde(rename = "type", default)]
    pub conversation_type: Option<ConversationType>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub term: Option<String>,
    pub page_number: Option<i32>,
    pub page_size: Option<i64>,
    pub message_page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    pub name: Option<String>,
    pub created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
    pub member_ids: Vec<String>,
    pub messages: Vec<MessageResponse>,
}

impl From<ConversationDetail> for ConversationResponse {
    fn from(detail: ConversationDetail) -> Self {
        let conversation = detail.conversation;
        Self {
            id: conversation.id,
            conversation_type: conversation.conversation_type,
            name: conversation.name,
            created_by: conversation.created_by,
            created_at: conversation.created_at,
            last_message_at: conversation.last_message_at,
            member_ids: conversation.members,
            messages: detail.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
}
