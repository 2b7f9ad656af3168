use rocket::{response::content::RawHtml, serde::json::Json, State};
use tracing::debug;

use crate::{
    events::StoredEvent,
    store::{StorageError, StoreHandle},
};

/// How many events `/api/events` returns.
pub struct EventsLimit(pub usize);

const INDEX: &str = include_str!("../static/index.html");

#[rocket::get("/")]
pub fn index() -> RawHtml<&'static str> {
    RawHtml(INDEX)
}

/// Latest events, newest first. Polled by the page served on `/`.
#[rocket::get("/api/events")]
pub async fn events(
    store: &State<StoreHandle>,
    limit: &State<EventsLimit>,
) -> Result<Json<Vec<StoredEvent>>, StorageError> {
    let events = store.0.recent(limit.0).await?;
    debug!("serving {} events", events.len());
    Ok(Json(events))
}
