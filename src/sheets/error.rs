use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Invalid formType")]
    InvalidFormType(Option<String>),

    #[error("Invalid request body.")]
    InvalidRequest,

    #[error("Google Sheets credentials are not configured")]
    NotConfigured,

    #[error("invalid sheets endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("append rejected with {status}: {body}")]
    AppendRejected { status: StatusCode, body: String },

    #[error("append request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SheetError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SheetError::Auth(AuthError::ExchangeRejected(_)) => true,
            SheetError::Auth(_) => false,
            SheetError::AppendRejected { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            SheetError::Transport(_) => true,
            SheetError::InvalidFormType(_)
            | SheetError::InvalidRequest
            | SheetError::NotConfigured
            | SheetError::InvalidEndpoint(_) => false,
        }
    }
}

impl IntoResponse for SheetError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SheetError::InvalidFormType(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            SheetError::InvalidRequest | SheetError::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            // upstream details stay in the logs
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to write to Google Sheets.".to_owned(),
            ),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
