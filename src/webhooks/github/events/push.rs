use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    events::{Event, EventAction},
    webhooks::github::{
        events::{UNKNOWN, UNKNOWN_AUTHOR},
        payload,
    },
};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

pub(super) fn normalize(payload: &Value, timestamp: DateTime<Utc>) -> Event {
    let r#ref = payload::text_or(payload, &["ref"], "");
    let to_branch = match r#ref.strip_prefix(BRANCH_REF_PREFIX) {
        Some(branch) => branch.to_owned(),
        None => r#ref,
    };

    Event {
        request_id: payload::text_or(payload, &["after"], UNKNOWN),
        author: payload::text_or(payload, &["pusher", "name"], UNKNOWN_AUTHOR),
        action: EventAction::Push,
        from_branch: None,
        to_branch,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_fields_use_placeholders() {
        let event = normalize(&json!({ "zen": "Keep it logically awesome." }), Utc::now());

        assert_eq!(event.request_id, "unknown");
        assert_eq!(event.author, "Unknown");
        assert_eq!(event.from_branch, None);
        assert_eq!(event.to_branch, "");
    }

    #[test]
    fn test_non_branch_refs_are_kept() {
        let event = normalize(&json!({ "ref": "refs/tags/v1.0" }), Utc::now());
        assert_eq!(event.to_branch, "refs/tags/v1.0");
    }

    #[test]
    fn test_only_leading_prefix_is_stripped() {
        let event = normalize(&json!({ "ref": "refs/heads/refs/heads/x" }), Utc::now());
        assert_eq!(event.to_branch, "refs/heads/x");
    }

    #[test]
    fn test_malformed_pusher() {
        let event = normalize(&json!({ "pusher": "alice" }), Utc::now());
        assert_eq!(event.author, "Unknown");
    }
}
