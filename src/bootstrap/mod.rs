//! Bootstrap loader.
//!
//! # Data Flow
//! ```text
//! Store handle + seed source
//!     → reset (DELETE inside a transaction, if enabled)
//!     → importer.rs (read seed, publish through RegistryService)
//!     → BootstrapReport
//! ```
//!
//! # Design Decisions
//! - Both steps are soft: failures are logged and reported, never returned
//! - A failed reset still attempts the import
//! - Reset and import share one deadline
//! - One-shot on every startup; no retries

pub mod importer;

use std::fmt;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::config::BootstrapConfig;
use crate::store::Store;

pub use importer::{ImportError, Importer, SeedSource};

// Roughly thirty years; any budget beyond this is effectively unbounded.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

/// Outcome of a single bootstrap step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped,
    /// Rows removed (reset) or entries imported (import).
    Succeeded(u64),
    Failed(String),
}

impl StepOutcome {
    pub fn attempted(&self) -> bool {
        !matches!(self, StepOutcome::Skipped)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Skipped => f.write_str("skipped"),
            StepOutcome::Succeeded(n) => write!(f, "ok ({n})"),
            StepOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub reset: StepOutcome,
    pub import: StepOutcome,
}

/// `now + budget`, saturating instead of overflowing for huge budgets.
pub fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

/// Reset the managed records and reload the seed document.
pub async fn run_bootstrap(
    store: &dyn Store,
    importer: &Importer,
    config: &BootstrapConfig,
) -> BootstrapReport {
    let deadline = deadline_after(config.timeout());
    let source = SeedSource::parse(&config.seed_source);

    let reset = if config.reset_on_startup {
        tracing::info!(seed = %source, "Resetting servers table and importing seed data");
        match timeout_at(deadline, store.delete_all_servers()).await {
            Ok(Ok(removed)) => {
                tracing::info!(removed, "Servers table cleared");
                StepOutcome::Succeeded(removed)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to clear servers table");
                StepOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!(timeout_secs = config.timeout_secs, "Clearing servers table timed out");
                StepOutcome::Failed("deadline exceeded".into())
            }
        }
    } else {
        tracing::info!("Servers table reset disabled, keeping existing records");
        StepOutcome::Skipped
    };

    let import = if config.import_on_startup {
        match timeout_at(deadline, importer.import_from_source(&source)).await {
            Ok(Ok(count)) => StepOutcome::Succeeded(count as u64),
            Ok(Err(e)) => {
                tracing::error!(seed = %source, error = %e, "Failed to import seed data");
                StepOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!(seed = %source, timeout_secs = config.timeout_secs, "Seed import timed out");
                StepOutcome::Failed("deadline exceeded".into())
            }
        }
    } else {
        StepOutcome::Skipped
    };

    BootstrapReport { reset, import }
}
