#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::auth::{AcquireToken, AuthError, ServiceAccountIdentity, ServiceAccountTokenProvider};
    use crate::cache::token::AccessToken;
    use crate::cache::token_cache::CachedTokenProvider;
    use crate::helpers::time::now_u64;
    use crate::tests::common::{build_reqwest_client, spawn_capture, test_keys, TEST_ISSUER};

    /// Hands out `token-N` valid for `ttl` seconds, or fails while `failing` is set.
    #[derive(Clone, Default)]
    struct CountingProvider {
        calls: Arc<AtomicU32>,
        ttl: u64,
        failing: Arc<std::sync::atomic::AtomicBool>,
    }

    impl CountingProvider {
        fn with_ttl(ttl: u64) -> Self {
            Self { ttl, ..Default::default() }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AcquireToken for CountingProvider {
        async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::ExchangeRejected("boom".into()));
            }
            Ok(AccessToken::new(format!("token-{n}"), now_u64() + self.ttl))
        }
    }

    #[tokio::test]
    async fn fresh_token_is_served_from_cache() {
        let inner = CountingProvider::with_ttl(3600);
        let cache = CachedTokenProvider::new(inner.clone(), 60);

        let first = cache.acquire_token().await.unwrap();
        let second = cache.acquire_token().await.unwrap();

        assert_eq!(first.as_str(), "token-1");
        assert_eq!(second.as_str(), "token-1");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn token_inside_safety_margin_is_refreshed() {
        let inner = CountingProvider::with_ttl(3600);
        // margin covers the whole lifetime, so every call refreshes
        let cache = CachedTokenProvider::new(inner.clone(), 3600);

        assert_eq!(cache.acquire_token().await.unwrap().as_str(), "token-1");
        assert_eq!(cache.acquire_token().await.unwrap().as_str(), "token-2");
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = CountingProvider::with_ttl(3600);
        let cache = CachedTokenProvider::new(inner.clone(), 60);

        inner.failing.store(true, Ordering::SeqCst);
        assert!(cache.acquire_token().await.is_err());
        assert!(cache.acquire_token().await.is_err());

        inner.failing.store(false, Ordering::SeqCst);
        assert_eq!(cache.acquire_token().await.unwrap().as_str(), "token-3");
        assert_eq!(cache.acquire_token().await.unwrap().as_str(), "token-3");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn invalidate_forces_new_exchange() {
        let inner = CountingProvider::with_ttl(3600);
        let cache = CachedTokenProvider::new(inner.clone(), 60);

        cache.acquire_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.acquire_token().await.unwrap().as_str(), "token-2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_exchange() {
        let inner = CountingProvider::with_ttl(3600);
        let cache = CachedTokenProvider::new(inner.clone(), 60);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.acquire_token().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().as_str(), "token-1");
        }
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn cached_real_provider_hits_endpoint_once() {
        let (capture, base) =
            spawn_capture(vec![(StatusCode::OK, r#"{"access_token":"ya29.CACHED","expires_in":3599}"#)]).await;
        let identity = ServiceAccountIdentity::new(TEST_ISSUER, test_keys().pkcs1_pem.clone()).unwrap();
        let provider = ServiceAccountTokenProvider::with_client(identity, format!("{base}/token"), build_reqwest_client());
        let cache = CachedTokenProvider::new(provider, 60);

        for _ in 0..3 {
            assert_eq!(cache.acquire_token().await.unwrap().as_str(), "ya29.CACHED");
        }
        assert_eq!(capture.requests().await.len(), 1);
        assert_eq!(cache.inner().identity().issuer_email(), TEST_ISSUER);
    }
}
