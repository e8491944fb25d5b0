//! MCP Registry service.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                        MCP REGISTRY                          │
//!     │                                                              │
//!     │  config ──▶ store ──▶ bootstrap ──▶ telemetry ──▶ http       │
//!     │  (resolve)  (connect)  (reset +      (prometheus)  (serve)   │
//!     │                         import)                     │        │
//!     │                                                     ▼        │
//!     │  signals ──────────────────────────────▶ shutdown coordinator│
//!     │                                           (drain, then       │
//!     │                                            release LIFO)     │
//!     └──────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::process::ExitCode;

use clap::Parser;

use mcp_registry::app::{execute, Cli};
use mcp_registry::config::ConfigSource;
use mcp_registry::lifecycle::{Collaborators, ExitStatus, Orchestrator};
use mcp_registry::observability::logging::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogFormat::from_env());

    let orchestrator = Orchestrator::new(
        ConfigSource::from_process(cli.config.clone()),
        Collaborators::production(),
    );

    match execute(&cli, orchestrator, &mut io::stdout().lock()).await {
        Ok(status) => status.into(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to write output");
            ExitStatus::StartupFailed.into()
        }
    }
}
