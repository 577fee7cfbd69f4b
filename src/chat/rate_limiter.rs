use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::settings::RateLimitConfig;
use crate::helpers::time::get_instant;

// stale windows are swept once the store grows past this
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct WindowState {
    pub count: u32,
    pub reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Per-client window state, owned by whoever constructs the limiter.
pub type WindowStore = Arc<Mutex<HashMap<String, WindowState>>>;

/// Fixed-window counter keyed by client id: at most `max_requests` per window,
/// the window starting at a client's first request after the previous one ended.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    store: WindowStore,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_store(max_requests, window, WindowStore::default())
    }

    /// Shares `store` with other limiters, e.g. across router instances.
    pub fn with_store(max_requests: u32, window: Duration, store: WindowStore) -> Self {
        Self {
            max_requests,
            window,
            store,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.max_requests, Duration::from_secs(cfg.window_seconds))
    }

    pub async fn check(&self, client_id: &str) -> RateDecision {
        self.check_at(client_id, get_instant()).await
    }

    pub async fn check_at(&self, client_id: &str, now: Instant) -> RateDecision {
        let mut store = self.store.lock().await;

        if store.len() > SWEEP_THRESHOLD {
            store.retain(|_, w| now <= w.reset_at);
        }

        let window = store.entry(client_id.to_owned()).or_insert(WindowState {
            count: 0,
            reset_at: now + self.window,
        });

        if now > window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: window.reset_at.saturating_duration_since(now),
            };
        }

        window.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }
}
