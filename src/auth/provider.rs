use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::assertion::SignedAssertion;
use crate::auth::claims::{JwtHeader, TokenClaims};
use crate::auth::error::AuthError;
use crate::auth::identity::ServiceAccountIdentity;
use crate::cache::token::AccessToken;
use crate::helpers::time::{get_instant, now_i64};
use crate::observability::metrics::{get_metrics, OUTCOME_SUCCESS};
use crate::utils::constants::JWT_BEARER_GRANT_TYPE;

/// Exchanges a self-signed JWT for an OAuth2 bearer token (JWT-bearer grant).
///
/// Every call signs a fresh assertion and makes exactly one request to the
/// token endpoint. Nothing is cached here; see `cache::token_cache` for that.
#[derive(Debug, Clone)]
pub struct ServiceAccountTokenProvider {
    identity: Arc<ServiceAccountIdentity>,
    token_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    // some servers send a string or a float
    expires_in: Option<Value>,
}

impl ServiceAccountTokenProvider {
    pub fn new(identity: ServiceAccountIdentity, token_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build token HTTP client")?;
        Ok(Self::with_client(identity, token_url, client))
    }

    pub fn with_client(identity: ServiceAccountIdentity, token_url: impl Into<String>, client: Client) -> Self {
        Self {
            identity: Arc::new(identity),
            token_url: token_url.into(),
            client,
        }
    }

    pub fn identity(&self) -> &ServiceAccountIdentity {
        &self.identity
    }

    pub async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let result = self.exchange(now_i64()).await;

        let outcome = match &result {
            Ok(_) => OUTCOME_SUCCESS,
            Err(e) => e.kind(),
        };
        metrics.token_requests.with_label_values(&[outcome]).inc();
        metrics
            .token_request_duration
            .observe(start.elapsed().as_secs_f64());
        result
    }

    async fn exchange(&self, iat: i64) -> Result<AccessToken, AuthError> {
        let claims = TokenClaims::new(self.identity.issuer_email(), iat);
        let assertion = SignedAssertion::sign(&JwtHeader::default(), &claims, self.identity.private_key_pem())?;
        let jwt = assertion.as_jwt();

        debug!(issuer = %self.identity.issuer_email(), url = %self.token_url, "requesting service account token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", jwt.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "token endpoint rejected assertion");
            let detail = if body.is_empty() { status.to_string() } else { body };
            return Err(AuthError::ExchangeRejected(detail));
        }

        parse_token_response(&body, iat, claims.exp)
    }
}

/// Pulls `access_token` out of a 2xx body. The expiry is the assertion's
/// `exp`, lowered to `iat + expires_in` when the server grants less.
fn parse_token_response(body: &str, iat: i64, claims_exp: i64) -> Result<AccessToken, AuthError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::MalformedResponse(format!("unreadable token response: {e}")))?;

    let value = parsed
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_owned()))?;

    let exp = parsed
        .expires_in
        .as_ref()
        .and_then(lifetime_secs)
        .filter(|secs| *secs > 0)
        .map(|secs| iat.saturating_add(secs).min(claims_exp))
        .unwrap_or(claims_exp);

    Ok(AccessToken::new(value, exp.max(0) as u64))
}

/// Whole seconds from a numeric or numeric-string `expires_in`.
fn lifetime_secs(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}
