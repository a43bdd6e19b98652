use crate::adapters::{ConversationStore, MessageStore, Upsert};
use crate::domain::conversation::{Conversation, ConversationType, MemberKey};
use crate::domain::message::{Message, TimeWindow};
use crate::domain::pagination::{PageRequest, SortDirection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use uuid::Uuid;

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[derive(Debug, Clone)]
struct StoredConversation {
    seq: u64,
    conversation: Conversation,
}

/// Process-local conversation store.
///
/// PRIVATE conversations are indexed by member key; the index entry is held
/// while the conversation is inserted, which makes `create_private` atomic.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<Uuid, StoredConversation>,
    private_index: DashMap<MemberKey, Uuid>,
    next_seq: AtomicU64,
}

impl InMemoryConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &self,
        conversation_type: ConversationType,
        name: Option<String>,
        members: Vec<String>,
        created_by: Option<String>,
    ) -> Conversation {
        let conversation = Conversation {
            id: Uuid::now_v7(),
            conversation_type,
            name,
            members,
            created_by,
            created_at: OffsetDateTime::now_utc(),
            last_message_at: None,
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.conversations.insert(conversation.id, StoredConversation { seq, conversation: conversation.clone() });
        conversation
    }

    fn sorted_matching(&self, predicate: impl Fn(&Conversation) -> bool) -> Vec<Conversation> {
        let mut matches: Vec<StoredConversation> = self
            .conversations
            .iter()
            .filter(|entry| predicate(&entry.value().conversation))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by_key(|stored| (stored.conversation.created_at, stored.seq));
        matches.into_iter().map(|stored| stored.conversation).collect()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(
        &self,
        conversation_type: ConversationType,
        name: Option<String>,
        members: Vec<String>,
        created_by: Option<String>,
    ) -> Result<Conversation> {
        if conversation_type != ConversationType::Private {
            return Ok(self.insert(conversation_type, name, members, created_by));
        }

        match self.private_index.entry(MemberKey::from_members(&members)) {
            Entry::Occupied(_) => Err(AppError::InvalidArgument("private conversation already exists".to_string())),
            Entry::Vacant(slot) => {
                let conversation = self.insert(conversation_type, name, members, created_by);
                slot.insert(conversation.id);
                Ok(conversation)
            }
        }
    }

    async fn create_private(&self, members: Vec<String>) -> Result<Upsert<Conversation>> {
        match self.private_index.entry(MemberKey::from_members(&members)) {
            Entry::Occupied(slot) => self
                .conversations
                .get(slot.get())
                .map(|stored| Upsert::Existing(stored.conversation.clone()))
                .ok_or_else(|| AppError::Internal("private index points at a missing conversation".to_string())),
            Entry::Vacant(slot) => {
                let conversation = self.insert(ConversationType::Private, None, members, None);
                slot.insert(conversation.id);
                Ok(Upsert::Created(conversation))
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(&id).map(|stored| stored.conversation.clone()))
    }

    async fn find_by_members_and_type(
        &self,
        conversation_type: ConversationType,
        members: &[String],
    ) -> Result<Option<Conversation>> {
        Ok(self
            .sorted_matching(|c| c.conversation_type == conversation_type && c.has_all_members(members))
            .into_iter()
            .next())
    }

    async fn find_by_any_member(&self, member_ids: &[String], page: PageRequest) -> Result<Vec<Conversation>> {
        Ok(self
            .sorted_matching(|c| c.has_any_member(member_ids))
            .into_iter()
            .skip(to_usize(page.offset()))
            .take(page.limit().map_or(usize::MAX, to_usize))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    seq: u64,
    message: Message,
}

/// Process-local message store, bucketed by conversation.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    by_conversation: DashMap<Uuid, Vec<StoredMessage>>,
    next_seq: AtomicU64,
}

impl InMemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(&self, conversation_id: Uuid, from_user_id: String, content: String) -> Result<Message> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id,
            from_user_id,
            content,
            created_at: OffsetDateTime::now_utc(),
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.by_conversation
            .entry(conversation_id)
            .or_default()
            .push(StoredMessage { seq, message: message.clone() });
        Ok(message)
    }

    async fn find_by_conversation(
        &self,
        conversation_id: Uuid,
        direction: SortDirection,
        window: TimeWindow,
        page: PageRequest,
    ) -> Result<Vec<Message>> {
        let mut stored: Vec<StoredMessage> = self
            .by_conversation
            .get(&conversation_id)
            .map(|bucket| bucket.value().iter().filter(|s| window.contains(s.message.created_at)).cloned().collect())
            .unwrap_or_default();

        stored.sort_by_key(|s| (s.message.created_at, s.seq));
        if direction == SortDirection::Descending {
            stored.reverse();
        }

        Ok(stored
            .into_iter()
            .skip(to_usize(page.offset()))
            .take(page.limit().map_or(usize::MAX, to_usize))
            .map(|s| s.message)
            .collect())
    }
}
