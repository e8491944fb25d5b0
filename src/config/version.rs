//! Build metadata.
//!
//! Values are injected at compile time through the environment
//! (`MCP_REGISTRY_BUILD_VERSION`, `MCP_REGISTRY_GIT_COMMIT`,
//! `MCP_REGISTRY_BUILD_TIME`) and fall back to placeholders for local builds.

use std::fmt;

use serde::{Deserialize, Serialize};

const DEFAULT_VERSION: &str = "dev";
const UNKNOWN: &str = "unknown";

/// Release tag, source revision and build timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_commit: String,
    pub build_time: String,
}

impl VersionInfo {
    /// Metadata baked into this binary.
    pub fn from_build() -> Self {
        Self {
            version: option_env!("MCP_REGISTRY_BUILD_VERSION")
                .unwrap_or(DEFAULT_VERSION)
                .to_string(),
            git_commit: option_env!("MCP_REGISTRY_GIT_COMMIT")
                .unwrap_or(UNKNOWN)
                .to_string(),
            build_time: option_env!("MCP_REGISTRY_BUILD_TIME")
                .unwrap_or(UNKNOWN)
                .to_string(),
        }
    }

    /// The three lines printed by `--version`.
    pub fn banner_lines(&self) -> [String; 3] {
        [
            format!("MCP Registry {}", self.version),
            format!("Git commit: {}", self.git_commit),
            format!("Build time: {}", self.build_time),
        ]
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::from_build()
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} (commit: {})", self.version, self.git_commit)
    }
}
