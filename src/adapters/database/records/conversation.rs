use crate::domain::conversation::Conversation;
use crate::error::AppError;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationRecord {
    pub(crate) id: Uuid,
    pub(crate) conversation_type: String,
    pub(crate) name: Option<String>,
    pub(crate) members: Vec<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) last_message_at: Option<OffsetDateTime>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = AppError;

    fn try_from(record: ConversationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            conversation_type: record.conversation_type.parse().map_err(AppError::Internal)?,
            name: record.name,
            members: record.members,
            created_by: record.created_by,
            created_at: record.created_at,
            last_message_at: record.last_message_at,
        })
    }
}
