use crate::adapters::database::records::ConversationRecord;
use crate::adapters::database::{DbPool, to_sql_bound};
use crate::adapters::{ConversationStore, Upsert};
use crate::domain::conversation::{Conversation, ConversationType, MemberKey};
use crate::domain::pagination::PageRequest;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct ConversationRepository {
    pool: DbPool,
}

impl ConversationRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(level = "debug", skip(conn, name, members))]
    async fn insert(
        conn: &mut PgConnection,
        conversation_type: ConversationType,
        name: Option<String>,
        members: Vec<String>,
        created_by: Option<String>,
    ) -> Result<Conversation> {
        let member_key = MemberKey::from_members(&members);

        let result = sqlx::query_as::<_, ConversationRecord>(
            r#"
            INSERT INTO conversations (id, conversation_type, name, members, member_key, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, conversation_type, name, members, created_by, created_at, last_message_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(conversation_type.as_str())
        .bind(name)
        .bind(members)
        .bind(member_key.as_slice())
        .bind(created_by)
        .fetch_one(conn)
        .await;

        match result {
            Ok(record) => record.try_into(),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                // Partial unique index on member_key for PRIVATE conversations
                Err(AppError::InvalidArgument("private conversation already exists".to_string()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    #[tracing::instrument(level = "debug", skip(conn))]
    async fn find_private_by_key(conn: &mut PgConnection, member_key: &MemberKey) -> Result<Option<Conversation>> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, conversation_type, name, members, created_by, created_at, last_message_at
            FROM conversations
            WHERE conversation_type = 'PRIVATE' AND member_key = $1
            "#,
        )
        .bind(member_key.as_slice())
        .fetch_optional(conn)
        .await?;

        record.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn create(
        &self,
        conversation_type: ConversationType,
        name: Option<String>,
        members: Vec<String>,
        created_by: Option<String>,
    ) -> Result<Conversation> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, conversation_type, name, members, created_by).await
    }

    #[tracing::instrument(level = "debug", skip(self, members), fields(member_count = members.len()))]
    async fn create_private(&self, members: Vec<String>) -> Result<Upsert<Conversation>> {
        let mut conn = self.pool.acquire().await?;
        let member_key = MemberKey::from_members(&members);

        let inserted = sqlx::query_as::<_, ConversationRecord>(
            r#"
            INSERT INTO conversations (id, conversation_type, name, members, member_key, created_by)
            VALUES ($1, 'PRIVATE', NULL, $2, $3, NULL)
            ON CONFLICT (member_key) WHERE conversation_type = 'PRIVATE' DO NOTHING
            RETURNING id, conversation_type, name, members, created_by, created_at, last_message_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(members)
        .bind(member_key.as_slice())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(record) = inserted {
            return Ok(Upsert::Created(record.try_into()?));
        }

        // Lost the race to a concurrent insert; the winner's row is visible now.
        Self::find_private_by_key(&mut conn, &member_key)
            .await?
            .map(Upsert::Existing)
            .ok_or_else(|| AppError::Internal("private conversation vanished after conflict".to_string()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        let mut conn = self.pool.acquire().await?;
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, conversation_type, name, members, created_by, created_at, last_message_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        record.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, members))]
    async fn find_by_members_and_type(
        &self,
        conversation_type: ConversationType,
        members: &[String],
    ) -> Result<Option<Conversation>> {
        let mut conn = self.pool.acquire().await?;

        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, conversation_type, name, members, created_by, created_at, last_message_at
            FROM conversations
            WHERE conversation_type = $1 AND members @> $2
            ORDER BY created_at ASC, seq ASC
            LIMIT 1
            "#,
        )
        .bind(conversation_type.as_str())
        .bind(members)
        .fetch_optional(&mut *conn)
        .await?;

        record.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, member_ids), fields(member_count = member_ids.len()))]
    async fn find_by_any_member(&self, member_ids: &[String], page: PageRequest) -> Result<Vec<Conversation>> {
        let mut conn = self.pool.acquire().await?;

        let records = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, conversation_type, name, members, created_by, created_at, last_message_at
            FROM conversations
            WHERE members && $1
            ORDER BY created_at ASC, seq ASC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(member_ids)
        .bind(to_sql_bound(page.offset()))
        .bind(page.limit().map(to_sql_bound))
        .fetch_all(&mut *conn)
        .await?;

        records.into_iter().map(TryInto::try_into).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
