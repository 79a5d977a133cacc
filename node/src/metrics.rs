//! # Prometheus Metrics
//!
//! Operational metrics for the notary node, scraped at `/metrics` on the
//! configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with a
//! `notary` prefix so they do not collide with the default global registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Blocks appended through accepted submissions.
    pub blocks_appended_total: IntCounter,
    /// Submissions refused for any reason (signature, challenge, storage).
    pub submissions_rejected_total: IntCounter,
    /// Current chain height.
    pub chain_height: IntGauge,
    /// Findings reported by the most recent integrity audit.
    pub integrity_findings: IntGauge,
    /// Wall time of `/submitstar`, signature check included.
    pub submit_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("notary".into()), None)?;

        let blocks_appended_total = IntCounter::new(
            "blocks_appended_total",
            "Total number of blocks appended by accepted submissions",
        )?;
        registry.register(Box::new(blocks_appended_total.clone()))?;

        let submissions_rejected_total = IntCounter::new(
            "submissions_rejected_total",
            "Total number of refused submissions",
        )?;
        registry.register(Box::new(submissions_rejected_total.clone()))?;

        let chain_height = IntGauge::new("chain_height", "Height of the chain tip")?;
        registry.register(Box::new(chain_height.clone()))?;

        let integrity_findings = IntGauge::new(
            "integrity_findings",
            "Number of findings in the most recent chain audit",
        )?;
        registry.register(Box::new(integrity_findings.clone()))?;

        let submit_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "submit_latency_seconds",
                "Submission handling latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
        )?;
        registry.register(Box::new(submit_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            blocks_appended_total,
            submissions_rejected_total,
            chain_height,
            integrity_findings,
            submit_latency_seconds,
        })
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

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

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
