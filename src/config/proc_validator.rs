//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - server address, logging, metrics path
//! - endpoint URLs and timeouts of every upstream
//! - retry and rate-limit invariants

use tracing::{error, info};

use crate::config::settings::{
    AuthSettings, ChatSettings, RetryConfig, ServiceConfig, SettingsConfig, SheetsSettings,
};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::ASSERTION_TTL_SECS;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_auth(&cfg.auth, &mut errors);
    validate_sheets(&cfg.sheets, &mut errors);
    validate_chat(&cfg.chat, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        return Ok(());
    }

    let metrics = get_metrics().await;
    metrics.config_validation_errors.inc_by(errors.len() as u64);
    for e in &errors {
        error!("config: {}", e);
    }
    Err(errors)
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }
    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
    if !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
}

fn validate_auth(auth: &AuthSettings, errors: &mut Vec<String>) {
    validate_url("auth.token_url", &auth.token_url, errors);
    validate_timeout("auth.timeout_ms", auth.timeout_ms, errors);
    if auth.cache.is_enabled && auth.cache.safety_margin_seconds >= ASSERTION_TTL_SECS as u64 {
        errors.push(format!(
            "auth.cache.safety_margin_seconds must be lower than {}",
            ASSERTION_TTL_SECS
        ));
    }
}

fn validate_sheets(sheets: &SheetsSettings, errors: &mut Vec<String>) {
    validate_url("sheets.base_url", &sheets.base_url, errors);
    validate_timeout("sheets.timeout_ms", sheets.timeout_ms, errors);
    validate_retry("sheets.retry", &sheets.retry, errors);
}

fn validate_chat(chat: &ChatSettings, errors: &mut Vec<String>) {
    validate_url("chat.endpoint", &chat.endpoint, errors);
    validate_timeout("chat.timeout_ms", chat.timeout_ms, errors);
    if chat.model.trim().is_empty() {
        errors.push("chat.model must not be empty".to_string());
    }
    if chat.max_tokens == 0 {
        errors.push("chat.max_tokens must be > 0".to_string());
    }
    if chat.history_turns == 0 {
        errors.push("chat.history_turns must be > 0".to_string());
    }
    if chat.rate_limit.max_requests == 0 {
        errors.push("chat.rate_limit.max_requests must be > 0".to_string());
    }
    if chat.rate_limit.window_seconds == 0 {
        errors.push("chat.rate_limit.window_seconds must be > 0".to_string());
    }
}

fn validate_retry(ctx: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == 0 {
        errors.push(format!("{}.attempts must be >= 1", ctx));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(format!(
            "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
            ctx, retry.max_delay_ms, retry.base_delay_ms
        ));
    }
}

fn validate_url(ctx: &str, url: &str, errors: &mut Vec<String>) {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(format!(
            "{} '{}' has unsupported scheme '{}'",
            ctx,
            url,
            parsed.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", ctx, url, e)),
    }
}

fn validate_timeout(ctx: &str, timeout_ms: u64, errors: &mut Vec<String>) {
    if timeout_ms == 0 {
        errors.push(format!("{} must be > 0", ctx));
    }
}
