use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Option<Arc<Metrics>>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
/// `None` only if the registry could not be built; callers skip recording then.
pub async fn get_metrics() -> Option<&'static Arc<Metrics>> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
                .inspect_err(|e| error!("metrics registry init failed: {}", e))
                .ok()
        })
        .await
        .as_ref()
}

/// Prometheus text exposition of everything recorded so far.
pub async fn render_metrics() -> anyhow::Result<String> {
    let Some(metrics) = get_metrics().await else {
        return Ok(String::new());
    };
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_requests: IntCounter,
    pub token_cache_hits: IntCounter,
    pub token_cache_misses: IntCounter,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: HistogramVec,

    // Service metrics
    pub service_requests: IntCounterVec,
    pub service_request_duration: HistogramVec,
}

impl Metrics {
    fn new() -> prometheus::Result<Arc<Self>> {
        let registry = Registry::new_custom(Some("pbshipping".into()), None)?;

        let metrics = Arc::new(Self {
            // Token
            token_requests: IntCounter::new("token_requests_total", "Token lookups")?,
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Token lookups served from cache")?,
            token_cache_misses: IntCounter::new("token_cache_misses_total", "Token lookups that required an authorization call")?,
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Authorization failures by reason"), &["reason"])?,
            token_fetch_duration: HistogramVec::new(HistogramOpts::new("token_fetch_duration_seconds", "Authorization call duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["outcome"])?,

            // Service
            service_requests: IntCounterVec::new(Opts::new("service_requests_total", "Service calls by operation and status"), &["operation", "status"])?,
            service_request_duration: HistogramVec::new(HistogramOpts::new("service_request_duration_seconds", "Service call duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["operation"])?,

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone()))?;
        reg.register(Box::new(metrics.token_cache_hits.clone()))?;
        reg.register(Box::new(metrics.token_cache_misses.clone()))?;
        reg.register(Box::new(metrics.token_fetch_failures.clone()))?;
        reg.register(Box::new(metrics.token_fetch_duration.clone()))?;
        reg.register(Box::new(metrics.service_requests.clone()))?;
        reg.register(Box::new(metrics.service_request_duration.clone()))?;

        Ok(metrics)
    }
}

#[cfg(test)]
mod test {
    use super::{get_metrics, render_metrics};

    #[tokio::test]
    async fn registry_renders_prefixed_families() {
        let metrics = get_metrics().await.expect("metrics");
        metrics.token_requests.inc();
        metrics.service_requests.with_label_values(&["rate", "200"]).inc();

        let text = render_metrics().await.unwrap();
        assert!(text.contains("pbshipping_token_requests_total"));
        assert!(text.contains("pbshipping_service_requests_total{operation=\"rate\",status=\"200\"}"));
    }
}
