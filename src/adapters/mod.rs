use crate::domain::conversation::{Conversation, ConversationType};
use crate::domain::message::{Message, TimeWindow};
use crate::domain::pagination::{PageRequest, SortDirection};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod database;
pub mod memory;

pub use database::{ConversationRepository, MessageRepository};
pub use memory::{InMemoryConversationStore, InMemoryMessageStore};

/// Outcome of an atomic find-or-insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    Created(T),
    Existing(T),
}

impl<T> Upsert<T> {
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persists a new conversation with a fresh identifier and creation time.
    async fn create(
        &self,
        conversation_type: ConversationType,
        name: Option<String>,
        members: Vec<String>,
        created_by: Option<String>,
    ) -> Result<Conversation>;

    /// Returns the PRIVATE conversation for this member set, inserting it if absent.
    ///
    /// Atomic with respect to concurrent calls for the same member set.
    async fn create_private(&self, members: Vec<String>) -> Result<Upsert<Conversation>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Finds the earliest conversation of `conversation_type` that includes every one of `members`.
    ///
    /// Its member set may be larger than `members`.
    async fn find_by_members_and_type(
        &self,
        conversation_type: ConversationType,
        members: &[String],
    ) -> Result<Option<Conversation>>;

    /// Lists conversations sharing at least one member with `member_ids`, oldest first.
    async fn find_by_any_member(&self, member_ids: &[String], page: PageRequest) -> Result<Vec<Conversation>>;

    /// Checks that the backing store answers.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    async fn create(&self, conversation_id: Uuid, from_user_id: String, content: String) -> Result<Message>;

    /// Returns one page of a conversation's messages inside `window`, ordered by `created_at`.
    async fn find_by_conversation(
        &self,
        conversation_id: Uuid,
        direction: SortDirection,
        window: TimeWindow,
        page: PageRequest,
    ) -> Result<Vec<Message>>;
}
