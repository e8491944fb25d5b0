//! Shutdown coordination.
//!
//! # Responsibilities
//! - Carry the shutdown request and its reason to whoever waits on it
//! - Drive the `Idle → WaitingForSignal → Draining → Done` state machine
//! - Issue a bounded stop request to the listener
//!
//! # Design Decisions
//! - The first trigger wins; the reason is never overwritten
//! - A listener fault skips the stop call but still reaches `Done`, so the
//!   resource stack always runs afterwards
//! - Stop errors are logged and reported, never retried
//! - Stopping and reaping the serving task share one grace deadline

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bootstrap::deadline_after;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::net::listener::{ListenerError, ServiceListener};

/// Why the process is shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Triggered programmatically through a [`Shutdown`] handle.
    Requested,
    /// The listener stopped serving on its own.
    ListenerFault(String),
}

impl ShutdownReason {
    /// Whether the listener should be asked to drain.
    pub fn is_graceful(&self) -> bool {
        !self.is_fault()
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, ShutdownReason::ListenerFault(_))
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => write!(f, "interrupt"),
            ShutdownReason::Terminate => write!(f, "terminate"),
            ShutdownReason::Requested => write!(f, "requested"),
            ShutdownReason::ListenerFault(e) => write!(f, "listener fault: {e}"),
        }
    }
}

/// Cloneable shutdown trigger.
///
/// Every clone observes the same request.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns `false` if a shutdown was already requested.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(reason);
                true
            } else {
                false
            }
        })
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.tx.borrow().clone()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone().unwrap_or(ShutdownReason::Requested),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => ShutdownReason::Requested,
        };
        reason
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field("reason", &self.reason())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Idle,
    WaitingForSignal,
    Draining,
    Done,
}

/// Result of a coordinated shutdown.
#[derive(Debug)]
pub struct ShutdownOutcome {
    pub reason: ShutdownReason,
    /// Set when the listener did not stop cleanly within the grace period.
    pub stop_error: Option<ListenerError>,
}

/// Waits for a shutdown request, then drains the listener.
pub struct ShutdownCoordinator {
    shutdown: Shutdown,
    grace: Duration,
    os_signals: bool,
    phase: watch::Sender<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new(shutdown: Shutdown, grace: Duration) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Idle);
        Self {
            shutdown,
            grace,
            os_signals: false,
            phase,
        }
    }

    /// Also listen for SIGINT/SIGTERM once waiting.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Run the shutdown state machine to completion.
    ///
    /// `serving` is the task running [`ServiceListener::start`]; it is reaped
    /// before this returns.
    pub async fn run(
        &self,
        listener: Arc<dyn ServiceListener>,
        mut serving: JoinHandle<()>,
    ) -> ShutdownOutcome {
        self.enter(ShutdownPhase::WaitingForSignal);
        let signals = if self.os_signals {
            match spawn_signal_listener(self.shutdown.clone()) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to register signal handlers");
                    None
                }
            }
        } else {
            None
        };

        let reason = self.shutdown.wait().await;
        tracing::info!(%reason, "Shutting down server...");
        self.enter(ShutdownPhase::Draining);

        let deadline = deadline_after(self.grace);
        let mut stop_error = None;
        if reason.is_graceful() {
            let stopped = tokio::time::timeout_at(deadline, listener.stop(self.grace)).await;
            let result = stopped.unwrap_or(Err(ListenerError::StopTimeout(self.grace)));
            if let Err(e) = result {
                tracing::error!(error = %e, "Server forced to shutdown");
                stop_error = Some(e);
            }
        } else {
            tracing::error!(%reason, "Listener faulted, skipping drain");
        }

        if stop_error.is_some() {
            serving.abort();
        } else if tokio::time::timeout_at(deadline, &mut serving).await.is_err() {
            tracing::warn!("Serving task still running after stop, aborting");
            serving.abort();
        }

        if let Some(handle) = signals {
            handle.abort();
        }
        self.enter(ShutdownPhase::Done);

        ShutdownOutcome { reason, stop_error }
    }

    fn enter(&self, next: ShutdownPhase) {
        tracing::debug!(phase = ?next, "Shutdown phase");
        self.phase.send_replace(next);
    }
}
