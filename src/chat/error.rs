use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::RETRY_AFTER;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Rate limit exceeded. Try again later.")]
    RateLimited { retry_after: Duration },

    #[error("Chat API key not configured.")]
    NotConfigured,

    #[error("chat request body could not be read")]
    InvalidRequest,

    #[error("chat completion rejected with {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::RateLimited { .. } => "rate_limited",
            ChatError::NotConfigured => "not_configured",
            ChatError::InvalidRequest => "invalid_request",
            ChatError::Upstream { .. } => "upstream_rejected",
            ChatError::Transport(_) => "transport",
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            ChatError::RateLimited { retry_after } => {
                // round up so clients never retry early
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(RETRY_AFTER, secs.to_string())],
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ChatError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ChatError::InvalidRequest | ChatError::Upstream { .. } | ChatError::Transport(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Sorry, I am having trouble connecting to my brain right now." })),
            )
                .into_response(),
        }
    }
}
