//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the registry.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::version::VersionInfo;

/// Root configuration snapshot for the registry process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Backing store connection settings.
    pub database: DatabaseConfig,

    /// Network listener settings.
    pub listener: ListenerConfig,

    /// Seed data loaded on every startup.
    pub bootstrap: BootstrapConfig,

    /// Metrics activation.
    pub telemetry: TelemetryConfig,

    /// Per-request limits.
    pub timeouts: TimeoutConfig,

    /// Graceful shutdown policy.
    pub shutdown: ShutdownConfig,

    /// Release tag, source revision and build timestamp.
    #[serde(skip)]
    pub version: VersionInfo,
}

/// Backing store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (e.g., "sqlite://registry.db?mode=rwc").
    pub url: String,

    /// Deadline for establishing the connection, in seconds.
    pub connect_timeout_secs: u64,

    /// Pool size.
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://registry.db?mode=rwc".to_string(),
            connect_timeout_secs: 10,
            max_connections: 5,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Seed data configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Filesystem path or http(s) URL of the seed document.
    pub seed_source: String,

    /// Delete every server record before importing.
    ///
    /// Destructive for deployments holding real user data.
    pub reset_on_startup: bool,

    /// Import the seed document at startup.
    pub import_on_startup: bool,

    /// Deadline shared by reset and import, in seconds.
    pub timeout_secs: u64,
}

impl BootstrapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            seed_source: "./data/seed.json".to_string(),
            reset_on_startup: true,
            import_on_startup: true,
            timeout_secs: 300, // 5 minutes
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Install the Prometheus recorder.
    pub enabled: bool,

    /// Interval between histogram upkeep passes, in seconds.
    pub upkeep_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            upkeep_interval_secs: 5,
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for the listener to drain, in seconds.
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}
