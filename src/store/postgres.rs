use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::{
    events::{Event, EventAction, StoreId, StoredEvent},
    store::{EventStore, StorageError},
};

const MAX_CONNECTIONS: u32 = 10;

// `seq` only exists to order events stamped with the same timestamp
const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id UUID PRIMARY KEY,
    seq BIGSERIAL NOT NULL,
    request_id TEXT NOT NULL,
    author TEXT NOT NULL,
    action TEXT NOT NULL,
    from_branch TEXT,
    to_branch TEXT NOT NULL,
    received_at TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS events_timestamp_idx ON events (received_at DESC, seq DESC)";

const INSERT_EVENT: &str = r#"
INSERT INTO events (id, request_id, author, action, from_branch, to_branch, received_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

const SELECT_RECENT: &str = r#"
SELECT id, request_id, author, action, from_branch, to_branch, received_at
FROM events
ORDER BY received_at DESC, seq DESC
LIMIT $1
"#;

/// Event store backed by a PostgreSQL `events` table.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects to `url` and creates the `events` table if it doesn't exist yet.
    ///
    /// `acquire_timeout` bounds how long an operation may wait for a pooled connection.
    pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        debug!("ensuring events table exists");
        sqlx::query(CREATE_EVENTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_TIMESTAMP_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[rocket::async_trait]
impl EventStore for PostgresStore {
    async fn insert(&self, event: Event) -> Result<StoreId, StorageError> {
        let id = Uuid::new_v4();

        sqlx::query(INSERT_EVENT)
            .bind(id)
            .bind(&event.request_id)
            .bind(&event.author)
            .bind(event.action.as_str())
            .bind(&event.from_branch)
            .bind(&event.to_branch)
            .bind(event.timestamp)
            .execute(&self.pool)
            .await?;

        Ok(id.to_string())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<EventRow> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(StoredEvent::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    request_id: String,
    author: String,
    action: String,
    from_branch: Option<String>,
    to_branch: String,
    #[sqlx(rename = "received_at")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = StorageError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let action: EventAction = row
            .action
            .parse()
            .map_err(|e| StorageError::Corrupted(format!("event {}: {}", row.id, e)))?;

        Ok(StoredEvent {
            id: row.id.to_string(),
            event: Event {
                request_id: row.request_id,
                author: row.author,
                action,
                from_branch: row.from_branch,
                to_branch: row.to_branch,
                timestamp: row.timestamp,
            },
        })
    }
}
