//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers
//! - Translate the first signal into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Later signals are logged and otherwise ignored; the drain deadline
//!   already bounds how long shutdown can take
//! - Ctrl+C only on non-Unix targets

use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

/// Spawn a task that triggers `shutdown` when a termination signal arrives.
///
/// Handlers are registered before this returns; the task runs until aborted.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = interrupt.recv() => ShutdownReason::Interrupt,
                Some(()) = terminate.recv() => ShutdownReason::Terminate,
                else => break,
            };
            deliver(&shutdown, reason);
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            deliver(&shutdown, ShutdownReason::Interrupt);
        }
    }))
}

fn deliver(shutdown: &Shutdown, reason: ShutdownReason) {
    if shutdown.trigger(reason.clone()) {
        tracing::info!(signal = %reason, "Signal received");
    } else {
        tracing::warn!(signal = %reason, "Signal received, shutdown already in progress");
    }
}
