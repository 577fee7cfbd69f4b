use std::fmt;

use crate::auth::error::AuthError;

/// Service account used to sign token assertions.
///
/// Built once at startup and shared read-only between concurrent token
/// requests. The private key is kept as PEM text and decoded on every signing
/// call, so a broken key surfaces as [`AuthError::InvalidKey`] from
/// `acquire_token` rather than at construction.
#[derive(Clone)]
pub struct ServiceAccountIdentity {
    issuer_email: String,
    private_key_pem: String,
}

impl ServiceAccountIdentity {
    pub fn new(issuer_email: impl Into<String>, private_key_pem: impl Into<String>) -> Result<Self, AuthError> {
        let issuer_email = issuer_email.into().trim().to_owned();
        if issuer_email.is_empty() {
            return Err(AuthError::InvalidIdentity("issuer email is empty".to_owned()));
        }
        Ok(Self {
            issuer_email,
            private_key_pem: private_key_pem.into(),
        })
    }

    pub fn issuer_email(&self) -> &str {
        &self.issuer_email
    }

    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }
}

impl fmt::Debug for ServiceAccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountIdentity")
            .field("issuer_email", &self.issuer_email)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Turns a private key as it usually arrives from an env file into real PEM:
/// surrounding whitespace and one pair of wrapping double quotes are dropped,
/// literal `\n` sequences become newlines.
pub fn normalize_private_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.replace("\\n", "\n")
}
