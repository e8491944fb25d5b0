//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mcp_registry_build_info` (gauge): always 1, labelled with build metadata
//! - `mcp_registry_http_requests_total` (counter): requests by method, route, status
//! - `mcp_registry_http_request_duration_seconds` (histogram): latency distribution
//! - `mcp_registry_servers_published_total` (counter): successful publishes
//!
//! # Design Decisions
//! - Prometheus recorder installed globally, rendered by the API listener
//! - Histogram upkeep runs on a background task owned by the shutdown hook

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::{TelemetryConfig, VersionInfo};
use crate::observability::{MetricsHandle, ShutdownHook, Telemetry, TelemetryBackend, TelemetryError};

const SERVICE_NAME: &str = "mcp-registry";

/// Telemetry backend exporting Prometheus metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusTelemetry;

#[async_trait]
impl TelemetryBackend for PrometheusTelemetry {
    async fn start(
        &self,
        config: &TelemetryConfig,
        version: &VersionInfo,
    ) -> Result<Telemetry, TelemetryError> {
        if !config.enabled {
            tracing::info!("Telemetry disabled by configuration");
            return Ok(Telemetry::disabled());
        }

        let recorder = PrometheusBuilder::new()
            .add_global_label("service", SERVICE_NAME)
            .add_global_label("version", version.version.clone())
            .build_recorder();
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::AlreadyInstalled)?;

        describe_metrics();
        gauge!(
            "mcp_registry_build_info",
            "git_commit" => version.git_commit.clone(),
            "build_time" => version.build_time.clone()
        )
        .set(1.0);

        let upkeep = handle.clone();
        let interval = Duration::from_secs(config.upkeep_interval_secs.max(1));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                upkeep.run_upkeep();
            }
        });

        tracing::info!(version = %version.version, "Telemetry initialized");

        let shutdown: ShutdownHook = Box::new(move || {
            async move {
                task.abort();
                match task.await {
                    Err(e) if !e.is_cancelled() => Err(TelemetryError::Shutdown(e.to_string())),
                    _ => Ok(()),
                }
            }
            .boxed()
        });

        Ok(Telemetry::new(MetricsHandle::prometheus(handle), shutdown))
    }
}

fn describe_metrics() {
    describe_gauge!("mcp_registry_build_info", "Build metadata of the running binary");
    describe_counter!("mcp_registry_http_requests_total", "HTTP requests served");
    describe_histogram!(
        "mcp_registry_http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    describe_counter!(
        "mcp_registry_servers_published_total",
        "Server records published"
    );
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("mcp_registry_http_requests_total", &labels).increment(1);
    histogram!("mcp_registry_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
