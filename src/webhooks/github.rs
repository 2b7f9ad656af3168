use anyhow::anyhow;
use chrono::Utc;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    serde::json::Json,
    Request, State,
};
use serde::Serialize;
use tracing::{error, info, trace};

use crate::{
    events::{format_timestamp, StoreId},
    store::StoreHandle,
    webhooks::WebhookError,
};

pub mod events;
pub use events::GitHubEventType;

pub mod payload;

pub mod signing;
use signing::SignedGitHubPayload;

const X_GITHUB_EVENT: &str = "X-GitHub-Event";

/// Secret shared with GitHub, as configured. See [`signing::verify`] for bypass mode.
pub struct GitHubSecret(pub Option<String>);

impl GitHubSecret {
    /// The secret deliveries must be signed with, if signatures are checked at all.
    pub fn configured(&self) -> Option<&str> {
        signing::effective_secret(self.0.as_deref())
    }
}

/// Body of a successful webhook response.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Receipt {
    Success { id: StoreId },
    Ignored { reason: &'static str },
}

#[rocket::post("/receiver", data = "<payload>")]
pub async fn receiver(
    event_type: Option<GitHubEventType>,
    payload: Result<SignedGitHubPayload, WebhookError>,
    store: &State<StoreHandle>,
) -> Result<Json<Receipt>, WebhookError> {
    let SignedGitHubPayload(payload) = payload?;
    trace!("payload: {}", payload);

    let event = match event_type
        .as_ref()
        .and_then(|event_type| events::normalize(event_type, &payload, Utc::now()))
    {
        Some(event) => event,
        None => {
            info!(
                "ignoring event {} ({})",
                event_type.map_or_else(|| "<none>".to_owned(), |t| t.to_string()),
                payload::text_or(&payload, &["action"], "no action"),
            );
            return Ok(Json(Receipt::Ignored {
                reason: "Event type not handled",
            }));
        }
    };

    let summary = format!(
        "{} by {} to {}",
        event.action, event.author, event.to_branch
    );
    let id = store.0.insert(event).await.map_err(|e| {
        error!("couldn't save {}: {}", summary, e);
        e
    })?;
    info!("saved {} with id {}", summary, id);

    Ok(Json(Receipt::Success { id }))
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

#[rocket::get("/test")]
pub fn health() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok",
        message: "Webhook endpoint is working",
        timestamp: format_timestamp(&Utc::now()),
    })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GitHubEventType {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let event_types = request.headers().get(X_GITHUB_EVENT).collect::<Vec<_>>();
        if event_types.len() != 1 {
            return Outcome::Error((
                Status::BadRequest,
                anyhow!("request header needs exactly one event type"),
            ));
        }

        Outcome::Success(GitHubEventType::from(event_types[0]))
    }
}
