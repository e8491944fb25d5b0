//! Server records as stored and served by the registry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published MCP server entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerRecord {
    /// Assigned on publish when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl ServerRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            version: version.into(),
            repository_url: None,
            website_url: None,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerPage {
    pub servers: Vec<ServerRecord>,

    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
