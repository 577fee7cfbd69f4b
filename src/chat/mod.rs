//! Chat-assistant relay with a per-client fixed-window rate limit.

pub mod error;
pub mod rate_limiter;
pub mod relay;
pub mod routes;

pub use error::ChatError;
pub use rate_limiter::{RateDecision, RateLimiter};
pub use relay::{ChatRelay, ChatRequest};
