use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::events::Event;

mod pull_request;
mod push;

/// Placeholder for missing ids and branch names.
pub(crate) const UNKNOWN: &str = "unknown";
/// Placeholder for a missing author.
pub(crate) const UNKNOWN_AUTHOR: &str = "Unknown";

/// Value of the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEventType {
    Push,
    PullRequest,
    Other(String),
}

impl From<&str> for GitHubEventType {
    fn from(event_type: &str) -> Self {
        match event_type {
            "push" => GitHubEventType::Push,
            "pull_request" => GitHubEventType::PullRequest,
            other => GitHubEventType::Other(other.to_owned()),
        }
    }
}

impl Display for GitHubEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitHubEventType::Push => f.write_str("push"),
            GitHubEventType::PullRequest => f.write_str("pull_request"),
            GitHubEventType::Other(other) => f.write_str(other),
        }
    }
}

/// Turns a delivery into a canonical [`Event`] stamped with `timestamp`, the time it was
/// processed at.
///
/// Returns `None` for event types and pull request actions we don't track.
pub fn normalize(
    event_type: &GitHubEventType,
    payload: &Value,
    timestamp: DateTime<Utc>,
) -> Option<Event> {
    match event_type {
        GitHubEventType::Push => Some(push::normalize(payload, timestamp)),
        GitHubEventType::PullRequest => pull_request::normalize(payload, timestamp),
        GitHubEventType::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::events::EventAction;

    use super::*;

    fn normalize_now(event_type: &str, payload: &Value) -> Option<Event> {
        normalize(&GitHubEventType::from(event_type), payload, Utc::now())
    }

    #[test]
    fn test_push() {
        let payload = json!({
            "after": "sha1",
            "pusher": { "name": "alice" },
            "ref": "refs/heads/main",
        });

        let event = normalize_now("push", &payload).expect("push events are always handled");
        assert_eq!(event.action, EventAction::Push);
        assert_eq!(event.request_id, "sha1");
        assert_eq!(event.author, "alice");
        assert_eq!(event.from_branch, None);
        assert_eq!(event.to_branch, "main");
    }

    #[test]
    fn test_pull_request_opened() {
        let payload = json!({
            "action": "opened",
            "pull_request": {
                "id": 42,
                "user": { "login": "bob" },
                "head": { "ref": "feat" },
                "base": { "ref": "main" },
            },
        });

        let event = normalize_now("pull_request", &payload).expect("opened PRs are handled");
        assert_eq!(event.action, EventAction::PullRequest);
        assert_eq!(event.request_id, "42");
        assert_eq!(event.author, "bob");
        assert_eq!(event.from_branch.as_deref(), Some("feat"));
        assert_eq!(event.to_branch, "main");
    }

    #[test]
    fn test_pull_request_merged() {
        let payload = json!({
            "action": "closed",
            "pull_request": {
                "id": 42,
                "user": { "login": "bob" },
                "merged": true,
                "merge_commit_sha": "sha9",
                "merged_by": { "login": "carol" },
                "head": { "ref": "feat" },
                "base": { "ref": "main" },
            },
        });

        let event = normalize_now("pull_request", &payload).expect("merged PRs are handled");
        assert_eq!(event.action, EventAction::Merge);
        assert_eq!(event.request_id, "sha9");
        assert_eq!(event.author, "carol");
        assert_eq!(event.from_branch.as_deref(), Some("feat"));
        assert_eq!(event.to_branch, "main");
    }

    #[test]
    fn test_pull_request_closed_without_merge_is_ignored() {
        let payload = json!({
            "action": "closed",
            "pull_request": { "id": 42, "merged": false },
        });

        assert_eq!(normalize_now("pull_request", &payload), None);
    }

    #[test]
    fn test_unhandled_event_types_are_ignored() {
        let payload = json!({ "action": "opened", "issue": { "number": 1 } });

        assert_eq!(normalize_now("issues", &payload), None);
        assert_eq!(normalize_now("", &payload), None);
        assert_eq!(normalize_now("PUSH", &payload), None);
    }

    #[test]
    fn test_timestamp_is_processing_time() {
        let before = Utc::now();
        let event = normalize_now("push", &json!({ "ref": "refs/heads/main" })).unwrap();
        let after = Utc::now();

        assert!(before <= event.timestamp && event.timestamp <= after);
    }

    #[test]
    fn test_event_type_names() {
        for name in ["push", "pull_request", "issues"] {
            assert_eq!(GitHubEventType::from(name).to_string(), name);
        }
    }
}
