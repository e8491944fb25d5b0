//! Real OS signals delivered to this test process.
//!
//! Kept to a single test: signal dispositions are process-wide, so parallel
//! tests would see each other's signals.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use mcp_registry::lifecycle::{spawn_signal_listener, Shutdown, ShutdownReason};

fn send_signal(flag: &str) {
    let status = Command::new("kill")
        .args([flag, &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success(), "kill {flag} failed: {status}");
}

async fn reason_after(flag: &str) -> ShutdownReason {
    let shutdown = Shutdown::new();
    let handle = spawn_signal_listener(shutdown.clone()).unwrap();

    send_signal(flag);
    let reason = tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
        .await
        .unwrap_or_else(|_| panic!("no shutdown after kill {flag}"));

    handle.abort();
    reason
}

#[tokio::test]
async fn sigterm_and_sigint_trigger_shutdown() {
    assert_eq!(reason_after("-TERM").await, ShutdownReason::Terminate);
    assert_eq!(reason_after("-INT").await, ShutdownReason::Interrupt);
}
