use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::debug;

use crate::chat::relay::ChatRequest;
use crate::server::server::AppState;
use crate::utils::constants::UNKNOWN_CLIENT;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let client = client_id(&headers);
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    let request = match payload {
        Ok(Json(request)) => Some(request),
        Err(rejection) => {
            debug!(client = %client, "unreadable chat body: {}", rejection.body_text());
            None
        }
    };

    match state.chat.reply(&client, origin, request.as_ref()).await {
        Ok(text) => Json(json!({ "response": text })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// First `X-Forwarded-For` hop, or `"unknown"`.
pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_owned()
}
