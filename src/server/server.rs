use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::auth::{build_token_source, normalize_private_key, ServiceAccountIdentity, TokenSource};
use crate::chat::{self, ChatRelay, RateLimiter};
use crate::config::settings::{ServiceConfig, SettingsConfig};
use crate::config::values::SecretValue;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::sheets::{self, SheetAppender};

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    /// `None` when spreadsheet credentials are incomplete
    pub sheets: Option<Arc<SheetAppender<TokenSource>>>,
    pub chat: Arc<ChatRelay>,
}

impl AppState {
    pub fn new(
        metrics: &Metrics,
        sheets: Option<SheetAppender<TokenSource>>,
        chat: ChatRelay,
    ) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            sheets: sheets.map(Arc::new),
            chat: Arc::new(chat),
        }
    }

    /// Resolves secrets and builds both relays. Missing secrets disable the
    /// affected endpoint instead of failing startup.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        let metrics = get_metrics().await;
        let sheets = build_sheet_appender(service_config)?;

        let chat_key = resolve_optional("chat.api_key", service_config.chat.api_key.as_ref());
        let limiter = RateLimiter::from_config(&service_config.chat.rate_limit);
        let chat = ChatRelay::new(&service_config.chat, chat_key, limiter)?;

        Ok(Self::new(metrics, sheets, chat))
    }
}

fn resolve_optional(ctx: &str, value: Option<&SecretValue>) -> Option<String> {
    let value = value?;
    match value.resolve() {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            warn!("{} unavailable from {}: {:#}", ctx, value.describe(), e);
            None
        }
    }
}

fn build_sheet_appender(service_config: &ServiceConfig) -> Result<Option<SheetAppender<TokenSource>>> {
    let auth = &service_config.auth;
    let issuer = resolve_optional("auth.issuer", auth.issuer.as_ref());
    let private_key = resolve_optional("auth.private_key", auth.private_key.as_ref())
        .map(|raw| normalize_private_key(&raw));
    let spreadsheet_id = resolve_optional("sheets.spreadsheet_id", service_config.sheets.spreadsheet_id.as_ref());

    let (Some(issuer), Some(private_key), Some(spreadsheet_id)) = (issuer, private_key, spreadsheet_id) else {
        warn!("form submissions disabled: spreadsheet credentials are incomplete");
        return Ok(None);
    };

    let identity = ServiceAccountIdentity::new(issuer, private_key)?;
    info!(issuer = %identity.issuer_email(), cache = auth.cache.is_enabled, "service account configured");
    let tokens = build_token_source(identity, auth)?;
    let appender = SheetAppender::new(tokens, spreadsheet_id, &service_config.sheets)?;
    Ok(Some(appender))
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::OPTIONS, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(sheets::routes::router())
        .merge(chat::routes::router())
        .layer(cors_layer())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn start(settings_config: &SettingsConfig, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(settings_config, state);

    let addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    metrics.up.set(0);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
