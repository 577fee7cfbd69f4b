use std::fmt;

/// Bearer token returned by the authorization server.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub exp_unix_ts: u64, // UNIX TIMESTAMP
}

impl AccessToken {
    pub fn new(value: String, exp_unix_ts: u64) -> Self {
        Self { value, exp_unix_ts }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("exp_unix_ts", &self.exp_unix_ts)
            .finish()
    }
}
