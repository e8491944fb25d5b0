//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Connect store → Bootstrap → Telemetry → Launch listener
//!     (each acquired resource pushed onto resources.rs as it is acquired)
//!
//! Shutdown (shutdown.rs):
//!     Idle → WaitingForSignal → Draining (stop listener, bounded) → Done
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Exit:
//!     ResourceStack::release_all (LIFO) → "Server exiting"
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then listener
//! - Shutdown has a deadline: the listener gets one grace period to drain
//! - Releases run on every exit path, including startup failure and
//!   listener faults

pub mod resources;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use resources::{ReleaseSummary, ResourceStack};
pub use shutdown::{Shutdown, ShutdownCoordinator, ShutdownOutcome, ShutdownPhase, ShutdownReason};
pub use signals::spawn_signal_listener;
pub use startup::{Collaborators, ExitStatus, Orchestrator, RunReport, StartupError};
