//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, then MCP_REGISTRY_* environment)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → shared via Arc to every startup step
//! ```
//!
//! # Design Decisions
//! - Config is resolved exactly once per process; there is no reload path
//! - All fields have defaults to allow an empty environment
//! - Version metadata is part of the snapshot, never a global

pub mod loader;
pub mod schema;
pub mod validation;
pub mod version;

pub use loader::{ConfigError, ConfigSource};
pub use schema::{
    BootstrapConfig, DatabaseConfig, ListenerConfig, RegistryConfig, ShutdownConfig,
    TelemetryConfig, TimeoutConfig,
};
pub use version::VersionInfo;
