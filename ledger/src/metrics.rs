//! Prometheus-backed metrics and HTTP exporter.
//!
//! Defines a [`MetricsRegistry`] owning a Prometheus registry plus a set
//! of ledger-relevant series (blocks forged, blocks rejected by reason,
//! mempool admission latency, gossip broadcast failures), and an async
//! `/metrics` HTTP exporter built on raw `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Ledger-relevant Prometheus metrics.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Count of blocks this node has successfully forged.
    pub blocks_forged: IntCounter,
    /// Count of blocks rejected during validation, labeled by reason
    /// (`bad_genesis`, `index_gap`, `broken_chain`, `bad_hash`).
    pub blocks_rejected: IntCounterVec,
    /// Latency of mempool admission (signature + contract check), in
    /// seconds.
    pub mempool_admission_seconds: Histogram,
    /// Count of failed outbound gossip broadcasts to peers.
    pub gossip_broadcast_failures: IntCounter,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let blocks_forged = IntCounter::with_opts(Opts::new(
            "blocks_forged_total",
            "Total number of blocks forged and committed locally by this node",
        ))?;
        registry.register(Box::new(blocks_forged.clone()))?;

        let blocks_rejected = IntCounterVec::new(
            Opts::new("blocks_rejected_total", "Total number of blocks rejected, by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(blocks_rejected.clone()))?;

        let mempool_admission_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mempool_admission_seconds",
                "Time to verify and admit a transaction into the mempool",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
        )?;
        registry.register(Box::new(mempool_admission_seconds.clone()))?;

        let gossip_broadcast_failures = IntCounter::with_opts(Opts::new(
            "gossip_broadcast_failures_total",
            "Total number of failed outbound gossip broadcasts to peers",
        ))?;
        registry.register(Box::new(gossip_broadcast_failures.clone()))?;

        Ok(LedgerMetrics {
            blocks_forged,
            blocks_rejected,
            mempool_admission_seconds,
            gossip_broadcast_failures,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics. Clone and
/// share across threads/tasks via `Arc`.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<MetricsRegistry, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(MetricsRegistry { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text
    /// format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server exposing `GET /metrics` in Prometheus text
/// exposition format. All other paths return 404. Intended to be
/// `tokio::spawn`ed alongside the gossip API server.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!(error = %err, "metrics HTTP connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn ledger_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = LedgerMetrics::register(&registry).expect("register metrics");

        metrics.blocks_forged.inc();
        metrics.blocks_rejected.with_label_values(&["bad_hash"]).inc();
        metrics.mempool_admission_seconds.observe(0.002);
        metrics.gossip_broadcast_failures.inc();

        let metric_families = registry.gather();
        assert!(!metric_families.is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_contains_series_names() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.ledger.blocks_forged.inc();
        let text = registry.gather_text();
        assert!(text.contains("blocks_forged_total"));
    }
}
