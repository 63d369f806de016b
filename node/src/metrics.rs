//! # Prometheus Metrics
//!
//! Operational metrics for the campus node, scraped at `/metrics` on the
//! configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `campus` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

use campus_contracts::campus::CampusStats;

/// Holds all Prometheus metric handles for the node.
///
/// Prometheus handles are internally reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct LedgerMetrics {
    registry: Registry,
    /// JSON-RPC calls received, including rejected ones.
    pub rpc_requests_total: IntCounter,
    /// JSON-RPC calls answered with an error object.
    pub rpc_errors_total: IntCounter,
    /// Mutating calls that were applied.
    pub mutations_total: IntCounter,
    /// Live credentials in the primary identity ledger.
    pub identities_live: IntGauge,
    pub courses_total: IntGauge,
    /// Reward ids waiting in the recycle queue.
    pub pooled_rewards: IntGauge,
    /// Value forwarded to the treasury so far.
    pub fees_collected_total: IntGauge,
    pub rpc_latency_seconds: Histogram,
}

impl LedgerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("campus".into()), None)
            .expect("failed to create prometheus registry");

        let rpc_requests_total = IntCounter::new(
            "rpc_requests_total",
            "Total number of JSON-RPC requests received",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_requests_total.clone()))
            .expect("metric registration");

        let rpc_errors_total = IntCounter::new(
            "rpc_errors_total",
            "Total number of JSON-RPC requests answered with an error",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_errors_total.clone()))
            .expect("metric registration");

        let mutations_total = IntCounter::new(
            "mutations_total",
            "Total number of ledger mutations applied",
        )
        .expect("metric creation");
        registry
            .register(Box::new(mutations_total.clone()))
            .expect("metric registration");

        let identities_live = IntGauge::new(
            "identities_live",
            "Live credentials in the primary identity ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(identities_live.clone()))
            .expect("metric registration");

        let courses_total = IntGauge::new("courses_total", "Courses in the catalog")
            .expect("metric creation");
        registry
            .register(Box::new(courses_total.clone()))
            .expect("metric registration");

        let pooled_rewards = IntGauge::new(
            "pooled_rewards",
            "Reward token ids waiting in the recycle queue",
        )
        .expect("metric creation");
        registry
            .register(Box::new(pooled_rewards.clone()))
            .expect("metric registration");

        let fees_collected_total = IntGauge::new(
            "fees_collected_total",
            "Total fee value forwarded to the treasury",
        )
        .expect("metric creation");
        registry
            .register(Box::new(fees_collected_total.clone()))
            .expect("metric registration");

        let rpc_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "rpc_latency_seconds",
                "JSON-RPC handling latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            rpc_requests_total,
            rpc_errors_total,
            mutations_total,
            identities_live,
            courses_total,
            pooled_rewards,
            fees_collected_total,
            rpc_latency_seconds,
        }
    }

    /// Refreshes the ledger gauges from a snapshot of the store.
    pub fn observe(&self, stats: &CampusStats) {
        self.identities_live.set(gauge(stats.live_identities as u64));
        self.courses_total.set(gauge(stats.courses as u64));
        self.pooled_rewards.set(gauge(stats.pooled_rewards as u64));
        self.fees_collected_total.set(gauge(stats.fees_collected));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Gauges are i64; saturate instead of wrapping.
fn gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<LedgerMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
