//! MCP Registry service library

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod store;

pub use config::schema::RegistryConfig;
pub use http::HttpServer;
pub use lifecycle::{Orchestrator, Shutdown};
