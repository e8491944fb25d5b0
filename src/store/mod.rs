//! Backing store subsystem.
//!
//! # Data Flow
//! ```text
//! StoreConnector::connect(config) (deadline applied by the caller)
//!     → Arc<dyn Store>            (one handle per process)
//!     → RegistryService / Bootstrap
//!     → Store::close              (exactly once, via the resource stack)
//! ```
//!
//! # Design Decisions
//! - The handle is a trait object so startup can be exercised without a database
//! - Destructive operations run inside a transaction
//! - `close` is idempotent at the implementation level; the lifecycle
//!   layer still guarantees it is only requested once

pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::registry::model::ServerRecord;

pub use sqlite::{SqliteConnector, SqliteStore};

/// Errors raised by the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("record already exists: {name}@{version}")]
    Duplicate { name: String, version: String },

    #[error("malformed stored record: {0}")]
    Corrupt(String),

    #[error("store is closed")]
    Closed,
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolClosed => StoreError::Closed,
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Opens the process-wide store handle.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError>;
}

/// Live connection/pool to the backing store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Delete every server record in a single transaction.
    ///
    /// Returns the number of rows removed.
    async fn delete_all_servers(&self) -> Result<u64, StoreError>;

    async fn insert_server(&self, record: &ServerRecord) -> Result<(), StoreError>;

    async fn get_server(&self, id: Uuid) -> Result<Option<ServerRecord>, StoreError>;

    /// Servers ordered by id, starting strictly after `after` when given.
    async fn list_servers(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<ServerRecord>, StoreError>;

    async fn count_servers(&self) -> Result<u64, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
