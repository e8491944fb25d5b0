//! Configuration resolution from disk and environment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RegistryConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::version::VersionInfo;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "MCP_REGISTRY_";

/// Error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inputs the configuration snapshot is resolved from.
///
/// Environment variables are captured up front so resolution is a pure
/// function of this value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    file: Option<PathBuf>,
    vars: HashMap<String, String>,
    build: Option<VersionInfo>,
}

impl ConfigSource {
    /// Capture the process environment.
    pub fn from_process(file: Option<PathBuf>) -> Self {
        Self::from_vars(file, std::env::vars())
    }

    /// Build a source from an explicit variable set.
    pub fn from_vars<I, K, V>(file: Option<PathBuf>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self {
            file,
            vars,
            build: None,
        }
    }

    /// Override the build metadata (defaults to the compiled-in values).
    pub fn with_build_info(mut self, build: VersionInfo) -> Self {
        self.build = Some(build);
        self
    }

    /// Resolve defaults, file and environment into a validated snapshot.
    pub fn resolve(&self) -> Result<RegistryConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => load_file(path)?,
            None => RegistryConfig::default(),
        };
        config.version = self.build.clone().unwrap_or_else(VersionInfo::from_build);

        self.apply_env(&mut config)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }

    fn apply_env(&self, config: &mut RegistryConfig) -> Result<(), ConfigError> {
        if let Some(v) = self.var("DATABASE_URL") {
            config.database.url = v.to_string();
        }
        if let Some(v) = self.parsed("DATABASE_CONNECT_TIMEOUT_SECS")? {
            config.database.connect_timeout_secs = v;
        }
        if let Some(v) = self.parsed("DATABASE_MAX_CONNECTIONS")? {
            config.database.max_connections = v;
        }
        if let Some(v) = self.var("SERVER_ADDRESS") {
            config.listener.bind_address = normalize_address(v);
        }
        if let Some(v) = self.var("SEED_FROM") {
            config.bootstrap.seed_source = v.to_string();
        }
        if let Some(v) = self.flag("SEED_RESET")? {
            config.bootstrap.reset_on_startup = v;
        }
        if let Some(v) = self.flag("SEED_IMPORT")? {
            config.bootstrap.import_on_startup = v;
        }
        if let Some(v) = self.parsed("SEED_TIMEOUT_SECS")? {
            config.bootstrap.timeout_secs = v;
        }
        if let Some(v) = self.flag("ENABLE_TELEMETRY")? {
            config.telemetry.enabled = v;
        }
        if let Some(v) = self.parsed("REQUEST_TIMEOUT_SECS")? {
            config.timeouts.request_secs = v;
        }
        if let Some(v) = self.parsed("SHUTDOWN_GRACE_SECS")? {
            config.shutdown.grace_period_secs = v;
        }
        if let Some(v) = self.var("VERSION") {
            config.version.version = v.to_string();
        }
        Ok(())
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(&format!("{ENV_PREFIX}{key}"))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.var(key) {
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
                key: format!("{ENV_PREFIX}{key}"),
                value: raw.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.var(key) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidEnv {
                    key: format!("{ENV_PREFIX}{key}"),
                    value: raw.to_string(),
                }),
            },
            None => Ok(None),
        }
    }
}

/// Load a TOML file on top of the defaults.
pub fn load_file(path: &Path) -> Result<RegistryConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

// ":8080" is accepted as shorthand for all interfaces.
fn normalize_address(raw: &str) -> String {
    if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    }
}
