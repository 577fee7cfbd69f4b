//! Shared constants and invariants

// OAuth2 service-account exchange
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime of a signed assertion, not configurable.
pub const ASSERTION_TTL_SECS: i64 = 3600;

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 60;

// Spreadsheet append
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

// Chat relay
pub const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "anthropic/claude-3-haiku";
pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 400;
pub const DEFAULT_CHAT_HISTORY_TURNS: usize = 6;
pub const DEFAULT_CHAT_TITLE: &str = "Event Assistant";
pub const DEFAULT_REFERER: &str = "http://localhost:3000";
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 15;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const UNKNOWN_CLIENT: &str = "unknown";
