use crate::cache::token::AccessToken;

/// Cached token plus the moment it stops being handed out.
#[derive(Debug, Clone)]
pub struct TokenContext {
    pub token: AccessToken,
    /// refresh starts at, unix seconds
    pub refresh_at_unix_ts: u64,
}

impl TokenContext {
    pub fn new(token: AccessToken, safety_margin_seconds: u64) -> Self {
        let refresh_at_unix_ts = token.exp_unix_ts.saturating_sub(safety_margin_seconds);
        Self {
            token,
            refresh_at_unix_ts,
        }
    }

    /// Check if token should be updated
    pub fn should_update(&self, now_unix_ts: u64) -> bool {
        now_unix_ts >= self.refresh_at_unix_ts
    }
}
