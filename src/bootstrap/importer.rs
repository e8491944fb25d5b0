//! Seed document import.
//!
//! # Responsibilities
//! - Read the seed document from disk or over HTTP
//! - Accept either a bare array of servers or `{ "servers": [...] }`
//! - Publish each entry through the registry service
//!
//! # Design Decisions
//! - One bad entry does not stop the rest; the error reports how many failed

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::registry::{RegistryService, ServerRecord};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch seed from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{failed} of {total} seed entries failed to import")]
    Partial { failed: usize, total: usize },
}

/// Where the seed document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    File(PathBuf),
    Url(String),
}

impl SeedSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SeedSource::Url(raw.to_string())
        } else {
            SeedSource::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::File(path) => write!(f, "{}", path.display()),
            SeedSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedDocument {
    List(Vec<ServerRecord>),
    Wrapped { servers: Vec<ServerRecord> },
}

impl SeedDocument {
    fn into_servers(self) -> Vec<ServerRecord> {
        match self {
            SeedDocument::List(servers) | SeedDocument::Wrapped { servers } => servers,
        }
    }
}

pub struct Importer {
    service: Arc<RegistryService>,
    http: reqwest::Client,
}

impl Importer {
    pub fn new(service: Arc<RegistryService>) -> Self {
        Self {
            service,
            http: reqwest::Client::new(),
        }
    }

    /// Import every entry of the seed document, returning how many were
    /// published.
    pub async fn import_from_source(&self, source: &SeedSource) -> Result<usize, ImportError> {
        let bytes = self.load(source).await?;
        let servers = serde_json::from_slice::<SeedDocument>(&bytes)?.into_servers();
        let total = servers.len();

        let mut failed = 0;
        for record in servers {
            let name = record.name.clone();
            if let Err(e) = self.service.publish(record).await {
                failed += 1;
                tracing::warn!(server = %name, error = %e, "Failed to import seed entry");
            }
        }

        tracing::info!(%source, imported = total - failed, total, "Seed import finished");
        if failed > 0 {
            return Err(ImportError::Partial { failed, total });
        }
        Ok(total)
    }

    async fn load(&self, source: &SeedSource) -> Result<Vec<u8>, ImportError> {
        match source {
            SeedSource::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ImportError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            SeedSource::Url(url) => {
                let fetch_err = |reason: String| ImportError::Fetch {
                    url: url.clone(),
                    reason,
                };
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| fetch_err(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(fetch_err(format!("status {}", response.status())));
                }
                let body = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
                Ok(body.to_vec())
            }
        }
    }
}
