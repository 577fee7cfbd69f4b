use serde::{Deserialize, Serialize};

use crate::utils::constants::{ASSERTION_TTL_SECS, GOOGLE_TOKEN_URL, SPREADSHEETS_SCOPE};

/// JOSE header of the assertion. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JwtHeader {
    fn default() -> Self {
        Self {
            alg: "RS256".to_owned(),
            typ: "JWT".to_owned(),
        }
    }
}

/// Claim set for the JWT-bearer grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl TokenClaims {
    /// Claims issued at `iat` (epoch seconds), valid for exactly one hour.
    pub fn new(issuer: &str, iat: i64) -> Self {
        Self {
            iss: issuer.to_owned(),
            scope: SPREADSHEETS_SCOPE.to_owned(),
            aud: GOOGLE_TOKEN_URL.to_owned(),
            exp: iat + ASSERTION_TTL_SECS,
            iat,
        }
    }
}
