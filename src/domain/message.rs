use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub from_user_id: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Exclusive bounds on a message's `created_at`. Unset bounds do not restrict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub before: Option<OffsetDateTime>,
    pub after: Option<OffsetDateTime>,
}

impl TimeWindow {
    pub const UNBOUNDED: Self = Self { before: None, after: None };

    #[must_use]
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.before.is_none_or(|before| at < before) && self.after.is_none_or(|after| at > after)
    }
}
