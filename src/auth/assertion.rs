//! JWT assertion assembly: `base64url(header).base64url(claims).base64url(signature)`.
//!
//! Header and claims are serialized exactly once; the signature covers those
//! bytes and the same string is what goes on the wire.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey};
use serde::Serialize;

use crate::auth::claims::{JwtHeader, TokenClaims};
use crate::auth::error::AuthError;

/// Unpadded base64url, `-` and `_` in place of `+` and `/`.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Header and claims are plain string/integer structs, so serialization does
/// not fail in practice; if it ever did, no signable assertion exists and the
/// call is reported the same way as an unusable key.
fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| AuthError::InvalidKey(format!("cannot serialize assertion segment: {e}")))?;
    Ok(base64url_encode(json))
}

/// `base64url(header) + "." + base64url(claims)`
pub fn signing_input(header: &JwtHeader, claims: &TokenClaims) -> Result<String, AuthError> {
    Ok(format!("{}.{}", encode_segment(header)?, encode_segment(claims)?))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAssertion {
    signing_input: String,
    signature: String,
}

impl SignedAssertion {
    /// Signs header and claims with RS256. Accepts PKCS#1 and PKCS#8 PEM.
    pub fn sign(header: &JwtHeader, claims: &TokenClaims, private_key_pem: &str) -> Result<Self, AuthError> {
        let signing_input = signing_input(header, claims)?;
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        // already base64url without padding
        let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), &key, Algorithm::RS256)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        Ok(Self {
            signing_input,
            signature,
        })
    }

    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn as_jwt(&self) -> String {
        format!("{}.{}", self.signing_input, self.signature)
    }
}
