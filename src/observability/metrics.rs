use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

pub const OUTCOME_SUCCESS: &str = "success";
pub const OUTCOME_FAILURE: &str = "failure";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token exchange
    pub token_requests: IntCounterVec,
    pub token_request_duration: Histogram,
    pub token_cache_hits: IntCounter,

    // Spreadsheet appends
    pub sheet_appends: IntCounterVec,

    // Chat relay
    pub chat_requests: IntCounterVec,
    pub chat_rate_limited: IntCounter,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("eventrelay".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Service account token exchanges by outcome"), &["outcome"]).unwrap(),
            token_request_duration: Histogram::with_opts(HistogramOpts::new("token_request_duration_seconds", "Token exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])).unwrap(),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Token requests served from cache").unwrap(),

            // Sheets
            sheet_appends: IntCounterVec::new(Opts::new("sheet_appends_total", "Spreadsheet row appends"), &["form_type", "outcome"]).unwrap(),

            // Chat
            chat_requests: IntCounterVec::new(Opts::new("chat_requests_total", "Chat relay requests by outcome"), &["outcome"]).unwrap(),
            chat_rate_limited: IntCounter::new("chat_rate_limited_total", "Chat requests rejected by the rate limiter").unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.sheet_appends.clone())).unwrap();
        reg.register(Box::new(metrics.chat_requests.clone())).unwrap();
        reg.register(Box::new(metrics.chat_rate_limited.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
