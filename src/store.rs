use std::{sync::Arc, time::Duration};

use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::events::{Event, StoreId, StoredEvent};

mod memory;
pub use memory::MemoryStore;

mod postgres;
pub use postgres::PostgresStore;

mod timed;
pub use timed::Timed;

/// Append-only storage for canonical events.
///
/// Implementations must accept concurrent inserts and reads: handlers share a single store
/// through [`StoreHandle`] and never lock around it.
#[rocket::async_trait]
pub trait EventStore: Send + Sync {
    /// Persists `event` and returns the id the store assigned to it.
    async fn insert(&self, event: Event) -> Result<StoreId, StorageError>;

    /// Returns at most `limit` events, newest `timestamp` first.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>, StorageError>;
}

/// Store shared by every route, kept in Rocket's managed state.
#[derive(Clone)]
pub struct StoreHandle(pub Arc<dyn EventStore>);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("stored event is corrupted: {0}")]
    Corrupted(String),
}

impl<'r> Responder<'r, 'static> for StorageError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        error!("storage failure: {}", self);
        let body = json!({
            "error": "Database error",
            "message": self.to_string(),
        });
        (Status::InternalServerError, Json(body)).respond_to(request)
    }
}

/// Opens the store described by the configuration: PostgreSQL when a connection string is
/// given, an in-memory store otherwise. Every operation is bounded by `timeout`.
pub async fn connect(
    database_url: Option<&str>,
    timeout: Duration,
) -> Result<StoreHandle, StorageError> {
    let store: Arc<dyn EventStore> = match database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, timeout).await?;
            info!("connected to postgres event store");
            Arc::new(Timed::new(store, timeout))
        }
        None => {
            warn!("no database configured, events will only be kept in memory");
            Arc::new(Timed::new(MemoryStore::new(), timeout))
        }
    };

    Ok(StoreHandle(store))
}
