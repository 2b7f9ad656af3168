use std::io;

use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::StorageError;

pub mod github;

/// Why a delivery body couldn't be used.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("no payload")]
    Missing,
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("payload isn't a JSON object")]
    NotAnObject,
    #[error("content type `{0}` isn't JSON")]
    NotJson(String),
    #[error("missing content type")]
    NoContentType,
}

/// Everything that can go wrong while accepting a delivery.
///
/// An event we don't track isn't an error: it is acknowledged with an `ignored` receipt.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("payload exceeds the size limit")]
    TooLarge,
    #[error("couldn't read payload: {0}")]
    Io(#[source] io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WebhookError {
    pub fn status(&self) -> Status {
        match self {
            WebhookError::InvalidSignature => Status::Unauthorized,
            WebhookError::Payload(_) | WebhookError::Io(_) => Status::BadRequest,
            WebhookError::TooLarge => Status::PayloadTooLarge,
            WebhookError::Storage(_) => Status::InternalServerError,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature => "Invalid signature",
            WebhookError::Payload(PayloadError::Missing) | WebhookError::Io(_) => "No payload",
            WebhookError::Payload(_) => "Invalid JSON",
            WebhookError::TooLarge => "Payload too large",
            WebhookError::Storage(_) => "Database error",
        }
    }
}

impl<'r> Responder<'r, 'static> for WebhookError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            WebhookError::Storage(e) => e.respond_to(request),
            WebhookError::InvalidSignature => {
                warn!("rejected delivery: {}", self);
                (self.status(), Json(json!({ "error": self.message() }))).respond_to(request)
            }
            _ => {
                debug!("rejected delivery: {}", self);
                (self.status(), Json(json!({ "error": self.message() }))).respond_to(request)
            }
        }
    }
}
