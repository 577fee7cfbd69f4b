use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::debug;

use crate::server::server::AppState;
use crate::sheets::error::SheetError;
use crate::sheets::form::FormSubmission;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/submit", post(submit))
}

async fn submit(State(state): State<AppState>, payload: Result<Json<FormSubmission>, JsonRejection>) -> Response {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            debug!("unreadable submission body: {}", rejection.body_text());
            return SheetError::InvalidRequest.into_response();
        }
    };
    let Some(appender) = state.sheets.as_ref() else {
        return SheetError::NotConfigured.into_response();
    };

    match appender.append(&submission).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Added to Google Sheets properly."
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}
