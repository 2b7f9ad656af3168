use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Identifier assigned by an [`EventStore`](crate::store::EventStore) when an event is inserted.
pub type StoreId = String;

/// The three kinds of repository activity we keep track of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Push,
    PullRequest,
    Merge,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Push => "PUSH",
            EventAction::PullRequest => "PULL_REQUEST",
            EventAction::Merge => "MERGE",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUSH" => Ok(EventAction::Push),
            "PULL_REQUEST" => Ok(EventAction::PullRequest),
            "MERGE" => Ok(EventAction::Merge),
            other => Err(anyhow!("unknown event action `{}`", other)),
        }
    }
}

/// Canonical record derived from a single GitHub delivery.
///
/// Events are never modified once created. `from_branch` is only `None` for
/// [`EventAction::Push`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub request_id: String,
    pub author: String,
    pub action: EventAction,
    pub from_branch: Option<String>,
    pub to_branch: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// An [`Event`] together with the id its store gave it, as served by `/api/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEvent {
    #[serde(rename = "_id")]
    pub id: StoreId,
    #[serde(flatten)]
    pub event: Event,
}

/// Renders a timestamp as `2024-01-01T12:00:00.000000`: microsecond precision, no offset.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(timestamp))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_action_round_trips_through_its_name() {
        for action in [EventAction::Push, EventAction::PullRequest, EventAction::Merge] {
            assert_eq!(action.as_str().parse::<EventAction>().unwrap(), action);
        }
        assert!("push".parse::<EventAction>().is_err());
    }

    #[test]
    fn test_stored_event_serialization() {
        let timestamp = Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(42))
            .unwrap();
        let stored = StoredEvent {
            id: "507f1f77bcf86cd799439011".to_string(),
            event: Event {
                request_id: "abc123".to_string(),
                author: "alice".to_string(),
                action: EventAction::Push,
                from_branch: None,
                to_branch: "main".to_string(),
                timestamp,
            },
        };

        assert_eq!(
            serde_json::to_value(&stored).unwrap(),
            json!({
                "_id": "507f1f77bcf86cd799439011",
                "request_id": "abc123",
                "author": "alice",
                "action": "PUSH",
                "from_branch": null,
                "to_branch": "main",
                "timestamp": "2024-01-01T12:00:00.000042",
            })
        );
    }
}
