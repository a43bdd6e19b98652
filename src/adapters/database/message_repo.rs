use crate::adapters::MessageStore;
use crate::adapters::database::records::MessageRecord;
use crate::adapters::database::{DbPool, to_sql_bound};
use crate::domain::message::{Message, TimeWindow};
use crate::domain::pagination::{PageRequest, SortDirection};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    /// Records a new message in the database.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, from_user_id, content))]
    async fn create(&self, conversation_id: Uuid, from_user_id: String, content: String) -> Result<Message> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, conversation_id, from_user_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conversation_id, from_user_id, content, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(conversation_id)
        .bind(from_user_id)
        .bind(content)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record.into())
    }

    /// Fetches one page of a conversation's messages within `window`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_conversation(
        &self,
        conversation_id: Uuid,
        direction: SortDirection,
        window: TimeWindow,
        page: PageRequest,
    ) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;

        let sql = match direction {
            SortDirection::Ascending => {
                r#"
                SELECT id, conversation_id, from_user_id, content, created_at
                FROM messages
                WHERE conversation_id = $1
                  AND ($2::timestamptz IS NULL OR created_at < $2)
                  AND ($3::timestamptz IS NULL OR created_at > $3)
                ORDER BY created_at ASC, seq ASC
                OFFSET $4
                LIMIT $5
                "#
            }
            SortDirection::Descending => {
                r#"
                SELECT id, conversation_id, from_user_id, content, created_at
                FROM messages
                WHERE conversation_id = $1
                  AND ($2::timestamptz IS NULL OR created_at < $2)
                  AND ($3::timestamptz IS NULL OR created_at > $3)
                ORDER BY created_at DESC, seq DESC
                OFFSET $4
                LIMIT $5
                "#
            }
        };

        let messages = sqlx::query_as::<_, MessageRecord>(sql)
            .bind(conversation_id)
            .bind(window.before)
            .bind(window.after)
            .bind(to_sql_bound(page.offset()))
            .bind(page.limit().map(to_sql_bound))
            .fetch_all(&mut *conn)
            .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }
}
