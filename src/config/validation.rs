//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0 and at most a day, address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RegistryConfig;

/// Upper bound for every `*_secs` deadline.
pub const MAX_DEADLINE_SECS: u64 = 86_400;

/// A single semantic problem in a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("database.url must not be empty")]
    EmptyDatabaseUrl,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("bootstrap.seed_source must not be empty when import is enabled")]
    EmptySeedSource,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("{field} must be at most {max} seconds")]
    TooLarge { field: &'static str, max: u64 },
}

pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabaseUrl);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.bootstrap.import_on_startup && config.bootstrap.seed_source.trim().is_empty() {
        errors.push(ValidationError::EmptySeedSource);
    }

    let positive = [
        ("database.connect_timeout_secs", config.database.connect_timeout_secs),
        ("database.max_connections", u64::from(config.database.max_connections)),
        ("bootstrap.timeout_secs", config.bootstrap.timeout_secs),
        ("telemetry.upkeep_interval_secs", config.telemetry.upkeep_interval_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("shutdown.grace_period_secs", config.shutdown.grace_period_secs),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    let deadlines = [
        ("database.connect_timeout_secs", config.database.connect_timeout_secs),
        ("bootstrap.timeout_secs", config.bootstrap.timeout_secs),
        ("telemetry.upkeep_interval_secs", config.telemetry.upkeep_interval_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("shutdown.grace_period_secs", config.shutdown.grace_period_secs),
    ];
    for (field, value) in deadlines {
        if value > MAX_DEADLINE_SECS {
            errors.push(ValidationError::TooLarge {
                field,
                max: MAX_DEADLINE_SECS,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
