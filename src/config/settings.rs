use serde::Deserialize;

use crate::config::values::SecretValue;
use crate::utils::constants::*;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub sheets: SheetsSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub path: String,
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: "/metrics".to_owned(),
            is_enabled: false,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// ================================
/// Service-account token exchange
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthSettings {
    pub issuer: Option<SecretValue>,
    pub private_key: Option<SecretValue>,
    /// where assertions are posted; `aud` stays the Google token URL
    pub token_url: String,
    pub timeout_ms: u64,
    pub cache: TokenCacheConfig,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            issuer: Some(SecretValue::from_env("GOOGLE_SERVICE_ACCOUNT_EMAIL")),
            private_key: Some(SecretValue::from_env("GOOGLE_PRIVATE_KEY")),
            token_url: GOOGLE_TOKEN_URL.to_owned(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            cache: TokenCacheConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TokenCacheConfig {
    pub is_enabled: bool,
    /// cached token is refreshed this many seconds before it expires
    pub safety_margin_seconds: u64,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            is_enabled: false,
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
        }
    }
}

/// ================================
/// Spreadsheet append
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SheetsSettings {
    pub spreadsheet_id: Option<SecretValue>,
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry: RetryConfig,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: Some(SecretValue::from_env("GOOGLE_SHEET_ID")),
            base_url: SHEETS_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// 1 means a single attempt, no retry
    pub attempts: u32,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: u64,
    /// invariant: >= base_delay_ms
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

/// ================================
/// Chat relay
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatSettings {
    pub api_key: Option<SecretValue>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    /// how many trailing conversation turns are forwarded
    pub history_turns: usize,
    pub title: String,
    pub system_prompt: String,
    pub timeout_ms: u64,
    pub rate_limit: RateLimitConfig,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: Some(SecretValue::from_env("OPENROUTER_API_KEY")),
            endpoint: CHAT_COMPLETIONS_URL.to_owned(),
            model: DEFAULT_CHAT_MODEL.to_owned(),
            max_tokens: DEFAULT_CHAT_MAX_TOKENS,
            history_turns: DEFAULT_CHAT_HISTORY_TURNS,
            title: DEFAULT_CHAT_TITLE.to_owned(),
            system_prompt: default_system_prompt(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS * 3,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_seconds: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

fn default_system_prompt() -> String {
    "You are the assistant of a community event website. Answer briefly and help visitors find their way around the site.".to_owned()
}
