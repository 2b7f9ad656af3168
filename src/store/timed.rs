use std::time::Duration;

use tokio::time::timeout;

use crate::{
    events::{Event, StoreId, StoredEvent},
    store::{EventStore, StorageError},
};

/// Bounds every call to the wrapped store; a call that doesn't finish in time fails with
/// [`StorageError::Timeout`].
pub struct Timed<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Timed<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[rocket::async_trait]
impl<S: EventStore> EventStore for Timed<S> {
    async fn insert(&self, event: Event) -> Result<StoreId, StorageError> {
        timeout(self.timeout, self.inner.insert(event))
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>, StorageError> {
        timeout(self.timeout, self.inner.recent(limit))
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }
}
