//! Network listener contract.
//!
//! # Responsibilities
//! - Define the start/stop contract the lifecycle drives
//! - Track the listener state machine
//! - Bind the configured address
//!
//! # Design Decisions
//! - `start` blocks until the listener stops or faults
//! - `start` after a stop returns [`ListenerError::Closed`], the expected
//!   "closed by shutdown" condition
//! - `stop` is bounded by a deadline and is the only way into `Draining`

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{RegistryConfig, VersionInfo};
use crate::observability::MetricsHandle;
use crate::registry::RegistryService;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Serving failed after the listener was up.
    #[error("listener failed: {0}")]
    Serve(String),

    /// The listener was stopped; not a fault.
    #[error("listener closed")]
    Closed,

    /// Draining did not finish before the deadline.
    #[error("listener did not stop within {0:?}")]
    StopTimeout(Duration),

    /// Construction failed before anything was started.
    #[error("listener setup failed: {0}")]
    Setup(String),
}

impl ListenerError {
    /// Whether this is the expected outcome of a requested stop.
    pub fn is_closed(&self) -> bool {
        matches!(self, ListenerError::Closed)
    }
}

/// Listener lifecycle: `Stopped → Running → Draining → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Running,
    Draining,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListenerState::Stopped => "stopped",
            ListenerState::Running => "running",
            ListenerState::Draining => "draining",
        };
        f.write_str(s)
    }
}

/// The network listener driven by the lifecycle.
#[async_trait]
pub trait ServiceListener: Send + Sync {
    /// Serve until stopped or faulted.
    async fn start(&self) -> Result<(), ListenerError>;

    /// Stop accepting, drain in-flight work, and return once serving has
    /// ceased or `deadline` elapsed.
    async fn stop(&self, deadline: Duration) -> Result<(), ListenerError>;

    fn state(&self) -> ListenerState;
}

/// Everything a listener needs from the startup sequence.
#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<RegistryConfig>,
    pub service: Arc<RegistryService>,
    pub metrics: MetricsHandle,
    pub version: VersionInfo,
}

/// Builds the listener once startup has produced its dependencies.
pub trait ListenerFactory: Send + Sync {
    fn build(&self, ctx: ServiceContext) -> Result<Arc<dyn ServiceListener>, ListenerError>;
}

/// Bind a TCP listener on `address`.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let bind_err = |source| ListenerError::Bind {
        address: address.to_string(),
        source,
    };
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| bind_err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
