//! Service-account token acquisition errors.
//!
//! Every variant is terminal for the call that produced it. Retrying is the
//! caller's decision (see `sheets::appender`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Identity rejected before any signing, e.g. an empty issuer.
    #[error("invalid service account identity: {0}")]
    InvalidIdentity(String),

    /// PEM could not be decoded, the signer refused the key material, or no
    /// assertion could be assembled for it.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Non-2xx from the token endpoint, or the request never completed
    /// (connect failure, timeout). Carries the response body when there is one.
    #[error("token exchange rejected: {0}")]
    ExchangeRejected(String),

    /// 2xx response that carries no `access_token`.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::ExchangeRejected(format!("request timed out: {err}"))
        } else {
            AuthError::ExchangeRejected(err.to_string())
        }
    }
}

impl AuthError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidIdentity(_) => "invalid_identity",
            AuthError::InvalidKey(_) => "invalid_key",
            AuthError::ExchangeRejected(_) => "exchange_rejected",
            AuthError::MalformedResponse(_) => "malformed_response",
        }
    }
}
