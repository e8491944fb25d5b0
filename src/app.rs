//! Command-line entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::VersionInfo;
use crate::lifecycle::{ExitStatus, Orchestrator};

#[derive(Debug, Parser)]
#[command(name = "mcp-registry")]
#[command(about = "MCP server registry", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version information and exit
    #[arg(long)]
    pub version: bool,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Either print version metadata or run the service to completion.
///
/// The version path never touches the orchestrator.
pub async fn execute<W: Write>(
    cli: &Cli,
    orchestrator: Orchestrator,
    out: &mut W,
) -> io::Result<ExitStatus> {
    if cli.version {
        for line in VersionInfo::from_build().banner_lines() {
            writeln!(out, "{line}")?;
        }
        return Ok(ExitStatus::Graceful);
    }

    let report = orchestrator.run().await;
    Ok(report.exit)
}
