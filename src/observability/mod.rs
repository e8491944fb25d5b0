//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Process entry:
//!     → logging.rs (tracing subscriber, before anything else)
//!
//! After bootstrap:
//!     → TelemetryBackend::start(version)
//!     → Telemetry { metrics handle, shutdown hook }
//!     → metrics handle rendered on /metrics by the HTTP listener
//!     → shutdown hook registered with the resource stack
//! ```
//!
//! # Design Decisions
//! - Activation failure is fatal; a broken exporter means a broken deployment
//! - The shutdown hook is a one-shot closure so it cannot run twice
//! - Metric updates go through the `metrics` facade and are no-ops until a
//!   recorder is installed

pub mod logging;
pub mod metrics;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::config::{TelemetryConfig, VersionInfo};

pub use self::metrics::PrometheusTelemetry;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("a global metrics recorder is already installed")]
    AlreadyInstalled,

    #[error("telemetry initialization failed: {0}")]
    Init(String),

    #[error("telemetry shutdown failed: {0}")]
    Shutdown(String),
}

/// One-shot hook that stops telemetry export.
pub type ShutdownHook = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), TelemetryError>> + Send>;

/// Read side of the metrics pipeline, handed to the listener.
#[derive(Clone, Default)]
pub struct MetricsHandle {
    prometheus: Option<PrometheusHandle>,
}

impl MetricsHandle {
    pub fn prometheus(handle: PrometheusHandle) -> Self {
        Self {
            prometheus: Some(handle),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.prometheus.is_some()
    }

    /// Prometheus exposition text, or `None` when telemetry is disabled.
    pub fn render(&self) -> Option<String> {
        self.prometheus.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHandle")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Active telemetry: the metrics handle plus its shutdown hook.
pub struct Telemetry {
    metrics: MetricsHandle,
    shutdown: ShutdownHook,
}

impl Telemetry {
    pub fn new(metrics: MetricsHandle, shutdown: ShutdownHook) -> Self {
        Self { metrics, shutdown }
    }

    /// Telemetry that exports nothing and shuts down instantly.
    pub fn disabled() -> Self {
        Self::new(
            MetricsHandle::disabled(),
            Box::new(|| async { Ok::<(), TelemetryError>(()) }.boxed()),
        )
    }

    pub fn into_parts(self) -> (MetricsHandle, ShutdownHook) {
        (self.metrics, self.shutdown)
    }
}

/// Starts metrics/tracing collection.
#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    async fn start(
        &self,
        config: &TelemetryConfig,
        version: &VersionInfo,
    ) -> Result<Telemetry, TelemetryError>;
}
