//! Registry service: ingestion and query operations over the store.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::registry::model::{ServerPage, ServerRecord};
use crate::store::{Store, StoreError};

pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid server record: {0}")]
    Invalid(String),

    #[error("invalid cursor: {0:?}")]
    InvalidCursor(String),

    #[error("server {name}@{version} already published")]
    AlreadyExists { name: String, version: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { name, version } => ServiceError::AlreadyExists { name, version },
            other => ServiceError::Store(other),
        }
    }
}

pub struct RegistryService {
    store: Arc<dyn Store>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and persist a record, assigning an id when absent.
    pub async fn publish(&self, mut record: ServerRecord) -> Result<ServerRecord, ServiceError> {
        record.name = record.name.trim().to_string();
        record.version = record.version.trim().to_string();

        if record.name.is_empty() {
            return Err(ServiceError::Invalid("name is required".into()));
        }
        if record.version.is_empty() {
            return Err(ServiceError::Invalid(format!(
                "version is required for {}",
                record.name
            )));
        }
        if record.id.is_none() {
            record.id = Some(Uuid::new_v4());
        }

        self.store.insert_server(&record).await?;
        metrics::counter!("mcp_registry_servers_published_total").increment(1);
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ServerRecord>, ServiceError> {
        Ok(self.store.get_server(id).await?)
    }

    /// List servers after `cursor` (an id from a previous page).
    pub async fn list(
        &self,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ServerPage, ServiceError> {
        let after = cursor
            .filter(|c| !c.is_empty())
            .map(|c| Uuid::parse_str(c).map_err(|_| ServiceError::InvalidCursor(c.to_string())))
            .transpose()?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let servers = self.store.list_servers(after, limit).await?;
        let next_cursor = if servers.len() == limit as usize {
            servers.last().and_then(|s| s.id).map(|id| id.to_string())
        } else {
            None
        };

        Ok(ServerPage {
            servers,
            next_cursor,
        })
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.store.count_servers().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    async fn service() -> RegistryService {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        RegistryService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn publish_assigns_id_and_trims() {
        let svc = service().await;
        let published = svc
            .publish(ServerRecord::new("  io.example/weather ", "1.0.0"))
            .await
            .unwrap();

        assert_eq!(published.name, "io.example/weather");
        let id = published.id.unwrap();
        assert_eq!(svc.get(id).await.unwrap(), Some(published));
    }

    #[tokio::test]
    async fn publish_rejects_missing_fields() {
        let svc = service().await;
        assert!(matches!(
            svc.publish(ServerRecord::new("", "1.0.0")).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            svc.publish(ServerRecord::new("io.example/weather", " ")).await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_publish_maps_to_already_exists() {
        let svc = service().await;
        svc.publish(ServerRecord::new("io.example/weather", "1.0.0"))
            .await
            .unwrap();
        let err = svc
            .publish(ServerRecord::new("io.example/weather", "1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn list_pages_with_cursor() {
        let svc = service().await;
        for i in 0..5 {
            svc.publish(ServerRecord::new(format!("io.example/s{i}"), "1.0.0"))
                .await
                .unwrap();
        }

        let first = svc.list(None, Some(2)).await.unwrap();
        assert_eq!(first.servers.len(), 2);
        let cursor = first.next_cursor.unwrap();

        let second = svc.list(Some(&cursor), Some(10)).await.unwrap();
        assert_eq!(second.servers.len(), 3);
        assert!(second.next_cursor.is_none());

        assert!(matches!(
            svc.list(Some("not-a-uuid"), None).await,
            Err(ServiceError::InvalidCursor(_))
        ));
    }
}
