use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    events::{Event, EventAction},
    webhooks::github::{
        events::{UNKNOWN, UNKNOWN_AUTHOR},
        payload,
    },
};

/// The `action` of a `pull_request` delivery, as far as we care about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Closed,
    Other,
}

impl From<&str> for PullRequestAction {
    fn from(action: &str) -> Self {
        match action {
            "opened" => PullRequestAction::Opened,
            "reopened" => PullRequestAction::Reopened,
            "closed" => PullRequestAction::Closed,
            _ => PullRequestAction::Other,
        }
    }
}

const ID: &[&str] = &["pull_request", "id"];
const USER: &[&str] = &["pull_request", "user", "login"];
const MERGE_COMMIT: &[&str] = &["pull_request", "merge_commit_sha"];
const MERGED_BY: &[&str] = &["pull_request", "merged_by", "login"];
const MERGED: &[&str] = &["pull_request", "merged"];
const HEAD_REF: &[&str] = &["pull_request", "head", "ref"];
const BASE_REF: &[&str] = &["pull_request", "base", "ref"];

pub(super) fn normalize(payload: &Value, timestamp: DateTime<Utc>) -> Option<Event> {
    let action = payload::lookup(payload, &["action"])
        .and_then(Value::as_str)
        .map_or(PullRequestAction::Other, PullRequestAction::from);

    let (kind, request_id, author) = match (action, payload::flag(payload, MERGED)) {
        (PullRequestAction::Opened | PullRequestAction::Reopened, _) => {
            (EventAction::PullRequest, ID, USER)
        }
        (PullRequestAction::Closed, true) => (EventAction::Merge, MERGE_COMMIT, MERGED_BY),
        _ => return None,
    };

    Some(Event {
        request_id: payload::text_or(payload, request_id, UNKNOWN),
        author: payload::text_or(payload, author, UNKNOWN_AUTHOR),
        action: kind,
        from_branch: Some(payload::text_or(payload, HEAD_REF, UNKNOWN)),
        to_branch: payload::text_or(payload, BASE_REF, UNKNOWN),
        timestamp,
    })
}
