use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    events::{Event, StoreId, StoredEvent},
    store::{EventStore, StorageError},
};

/// Keeps events in process memory. Used when no database is configured, and by tests.
///
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, event: Event) -> Result<StoreId, StorageError> {
        let id = Uuid::new_v4().to_string();
        self.events.write().await.push(StoredEvent {
            id: id.clone(),
            event,
        });
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>, StorageError> {
        let events = self.events.read().await;

        // walk newest insertions first so the stable sort keeps them ahead on equal timestamps
        let mut recent: Vec<&StoredEvent> = events.iter().rev().collect();
        recent.sort_by(|a, b| b.event.timestamp.cmp(&a.event.timestamp));

        Ok(recent.into_iter().take(limit).cloned().collect())
    }
}
