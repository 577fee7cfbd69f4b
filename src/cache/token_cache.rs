use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::{AcquireToken, AuthError};
use crate::cache::token::AccessToken;
use crate::cache::token_context::TokenContext;
use crate::helpers::time::now_u64;
use crate::observability::metrics::get_metrics;

/// Single-slot token cache in front of a provider.
///
/// The slot belongs to one provider and therefore to one identity. Callers
/// queue on the mutex, so concurrent requests share one refresh instead of
/// each running an exchange. A token is handed out until
/// `exp - safety_margin_seconds`; failures are passed through and never stored.
#[derive(Debug, Clone)]
pub struct CachedTokenProvider<P> {
    inner: P,
    safety_margin_seconds: u64,
    slot: Arc<Mutex<Option<TokenContext>>>,
}

impl<P> CachedTokenProvider<P>
where
    P: AcquireToken + Send + Sync,
{
    pub fn new(inner: P, safety_margin_seconds: u64) -> Self {
        Self {
            inner,
            safety_margin_seconds,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let mut slot = self.slot.lock().await;

        if let Some(ctx) = slot.as_ref().filter(|ctx| !ctx.should_update(now_u64())) {
            get_metrics().await.token_cache_hits.inc();
            return Ok(ctx.token.clone());
        }

        debug!("cached token missing or due for refresh");
        let token = self.inner.acquire_token().await?;
        *slot = Some(TokenContext::new(token.clone(), self.safety_margin_seconds));
        Ok(token)
    }

    /// Drops the cached token; the next call performs a full exchange.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}

impl<P> AcquireToken for CachedTokenProvider<P>
where
    P: AcquireToken + Send + Sync,
{
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        CachedTokenProvider::acquire_token(self).await
    }
}
