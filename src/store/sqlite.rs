//! SQLite-backed store.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::registry::model::ServerRecord;
use crate::store::{Store, StoreConnector, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS servers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    body TEXT NOT NULL,
    UNIQUE(name, version)
);
CREATE INDEX IF NOT EXISTS idx_servers_name ON servers(name);
"#;

/// Opens [`SqliteStore`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

#[async_trait]
impl StoreConnector for SqliteConnector {
    async fn connect(&self, config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
        let store = SqliteStore::connect(&config.url, config.max_connections).await?;
        Ok(Arc::new(store))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connect(format!("invalid url: {e}")))?;

        // Every connection to ":memory:" is a separate database.
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Connect(format!("schema init: {e}")))?;

        tracing::debug!(in_memory, "SQLite store ready");
        Ok(Self { pool })
    }

    /// Run `f` inside a transaction, committing on success and rolling back
    /// on error.
    pub async fn in_transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Sqlite>) -> BoxFuture<'t, Result<T, sqlx::Error>>
            + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(format!("begin: {e}")))?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::Transaction(format!("commit: {e}")))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Transaction rollback failed");
                }
                Err(StoreError::Transaction(e.to_string()))
            }
        }
    }
}

fn decode(body: &str) -> Result<ServerRecord, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl Store for SqliteStore {
    async fn delete_all_servers(&self) -> Result<u64, StoreError> {
        self.in_transaction(|tx| {
            Box::pin(async move {
                let done = sqlx::query("DELETE FROM servers;").execute(&mut **tx).await?;
                Ok(done.rows_affected())
            })
        })
        .await
    }

    async fn insert_server(&self, record: &ServerRecord) -> Result<(), StoreError> {
        let id = record.id.unwrap_or_else(Uuid::new_v4);
        let mut stored = record.clone();
        stored.id = Some(id);
        let body = serde_json::to_string(&stored).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query("INSERT INTO servers (id, name, version, body) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(&stored.name)
            .bind(&stored.version)
            .bind(body)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate {
                name: stored.name,
                version: stored.version,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_server(&self, id: Uuid) -> Result<Option<ServerRecord>, StoreError> {
        let row = sqlx::query("SELECT body FROM servers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| decode(&r.get::<String, _>("body"))).transpose()
    }

    async fn list_servers(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<ServerRecord>, StoreError> {
        let after = after.map(|id| id.to_string()).unwrap_or_default();
        let rows = sqlx::query("SELECT body FROM servers WHERE id > ? ORDER BY id LIMIT ?")
            .bind(after)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| decode(&r.get::<String, _>("body")))
            .collect()
    }

    async fn count_servers(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM servers")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Ok(());
        }
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    #[tokio::test]
    async fn insert_get_and_list() {
        let store = memory_store().await;
        let mut record = ServerRecord::new("io.example/weather", "1.0.0");
        let id = Uuid::new_v4();
        record.id = Some(id);

        store.insert_server(&record).await.unwrap();
        store
            .insert_server(&ServerRecord::new("io.example/files", "0.3.1"))
            .await
            .unwrap();

        assert_eq!(store.get_server(id).await.unwrap(), Some(record));
        assert_eq!(store.count_servers().await.unwrap(), 2);
        assert_eq!(store.list_servers(None, 10).await.unwrap().len(), 2);
        assert_eq!(store.list_servers(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_name_and_version_rejected() {
        let store = memory_store().await;
        let record = ServerRecord::new("io.example/weather", "1.0.0");
        store.insert_server(&record).await.unwrap();

        let err = store.insert_server(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn delete_all_runs_in_transaction() {
        let store = memory_store().await;
        for v in ["1.0.0", "1.1.0", "2.0.0"] {
            store
                .insert_server(&ServerRecord::new("io.example/weather", v))
                .await
                .unwrap();
        }

        assert_eq!(store.delete_all_servers().await.unwrap(), 3);
        assert_eq!(store.count_servers().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        let store = memory_store().await;
        store
            .insert_server(&ServerRecord::new("io.example/weather", "1.0.0"))
            .await
            .unwrap();

        let err = store
            .in_transaction(|tx| {
                Box::pin(async move {
                    sqlx::query("DELETE FROM servers;").execute(&mut **tx).await?;
                    sqlx::query("SELECT * FROM missing_table").execute(&mut **tx).await?;
                    Ok(())
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Transaction(_)));
        assert_eq!(store.count_servers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn connector_opens_configured_url() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".into(),
            ..DatabaseConfig::default()
        };
        let store = SqliteConnector.connect(&config).await.unwrap();
        assert_eq!(store.count_servers().await.unwrap(), 0);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_url_fails_to_connect() {
        let err = SqliteStore::connect("postgres://nowhere", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Connect(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let store = memory_store().await;
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(
            store.count_servers().await,
            Err(StoreError::Closed)
        ));
    }
}
