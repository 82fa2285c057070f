//! Error type for backend calls and its reduction to a display string.
//!
//! ERROR HANDLING
//! ==============
//! Views never show raw errors. They call [`ApiError::display_message`],
//! which prefers whatever message the backend put in the body and otherwise
//! falls back to a status-based sentence.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

use super::endpoints::EndpointError;
use crate::state::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid endpoint call: {0}")]
    Endpoint(#[from] EndpointError),
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unauthorized: {body}")]
    Unauthorized { body: Value },
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: Value },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status carried by the error, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// One line suitable for an inline error or toast.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Unauthorized { body } => {
                backend_message(body).unwrap_or_else(|| status_message(401))
            }
            Self::Status { status, body } => backend_message(body).unwrap_or_else(|| status_message(*status)),
            Self::Transport(error) if error.is_timeout() => "The server took too long to respond.".to_owned(),
            Self::Transport(error) if error.is_connect() => "Could not reach the server.".to_owned(),
            Self::Transport(_) => "The request could not be completed.".to_owned(),
            Self::Decode(_) => "The server sent a response the console could not read.".to_owned(),
            Self::Endpoint(error) => error.to_string(),
            Self::Storage(_) => "Could not access the saved session.".to_owned(),
        }
    }
}

/// Pull a human message out of an error body.
///
/// Looks at `message`, `error` (string or `{message}`), `detail`, then the
/// first entry of `errors`. A bare non-empty string body is used as is.
#[must_use]
pub fn backend_message(body: &Value) -> Option<String> {
    let text = match body {
        Value::String(raw) => Some(raw.as_str()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| {
                map.get("error").and_then(|error| {
                    error.as_str().or_else(|| error.get("message").and_then(Value::as_str))
                })
            })
            .or_else(|| map.get("detail").and_then(Value::as_str))
            .or_else(|| {
                map.get("errors").and_then(Value::as_array).and_then(|errors| errors.first()).and_then(|first| {
                    first.as_str().or_else(|| first.get("message").and_then(Value::as_str))
                })
            }),
        _ => None,
    }?;
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

fn status_message(status: u16) -> String {
    match status {
        400 => "The request was invalid.".to_owned(),
        401 => "Your session has expired. Please sign in again.".to_owned(),
        403 => "You do not have permission to do that.".to_owned(),
        404 => "The requested record was not found.".to_owned(),
        409 => "The record was changed by someone else.".to_owned(),
        500..=599 => "The server encountered an error. Please try again later.".to_owned(),
        other => format!("Request failed with status {other}."),
    }
}
