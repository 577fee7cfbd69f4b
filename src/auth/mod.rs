//! Service-account authentication: identity, claims, RS256 assertion and the
//! JWT-bearer token exchange.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

use crate::cache::token::AccessToken;
use crate::cache::token_cache::CachedTokenProvider;
use crate::config::settings::AuthSettings;

pub mod assertion;
pub mod claims;
pub mod error;
pub mod identity;
pub mod provider;

pub use error::AuthError;
pub use identity::{normalize_private_key, ServiceAccountIdentity};
pub use provider::ServiceAccountTokenProvider;

/// Anything that can hand out a bearer token for the spreadsheet API.
pub trait AcquireToken {
    fn acquire_token(&self) -> impl Future<Output = Result<AccessToken, AuthError>> + Send;
}

impl AcquireToken for ServiceAccountTokenProvider {
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        ServiceAccountTokenProvider::acquire_token(self).await
    }
}

#[derive(Debug, Clone)]
pub enum TokenSource {
    Direct(ServiceAccountTokenProvider),
    Cached(CachedTokenProvider<ServiceAccountTokenProvider>),
}

impl AcquireToken for TokenSource {
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        match self {
            TokenSource::Direct(p) => p.acquire_token().await,
            TokenSource::Cached(p) => p.acquire_token().await,
        }
    }
}

pub fn build_token_source(identity: ServiceAccountIdentity, settings: &AuthSettings) -> Result<TokenSource> {
    let provider = ServiceAccountTokenProvider::new(
        identity,
        settings.token_url.clone(),
        Duration::from_millis(settings.timeout_ms),
    )?;

    if settings.cache.is_enabled {
        Ok(TokenSource::Cached(CachedTokenProvider::new(
            provider,
            settings.cache.safety_margin_seconds,
        )))
    } else {
        Ok(TokenSource::Direct(provider))
    }
}
