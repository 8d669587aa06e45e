//! SQLite implementation of QueryExecutor.

use std::ops::Deref;
use std::str::FromStr;

use async_trait::async_trait;
use component_registry::{
    ComponentRow, ConnectionConfig, Id, QueryExecutor, RegistryConnection, RegistryError,
    Statement, TransactionExecutor, VersionRow,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::bind::{
    bind_values, decode_component_row, decode_entity_id, decode_version_row, map_write_error,
};

const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn storage_error(e: sqlx::Error) -> RegistryError {
    RegistryError::StorageError(e.to_string())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Wrapper around sqlx::SqlitePool that implements QueryExecutor.
#[derive(Clone, Debug)]
pub struct SqlitePool(sqlx::SqlitePool);

impl SqlitePool {
    /// Create a new SqlitePool from an sqlx SqlitePool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.0
    }
}

impl Deref for SqlitePool {
    type Target = sqlx::SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl RegistryConnection for SqlitePool {
    /// Connect to a SQLite database, creating the file if missing.
    ///
    /// Every connection to an in-memory database sees its own empty
    /// database, so those pools hold exactly one connection for their
    /// whole lifetime.
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, RegistryError> {
        let config = config.into();
        let options = SqliteConnectOptions::from_str(config.url())
            .map_err(storage_error)?
            .create_if_missing(true);

        let pool_options = if is_in_memory(config.url()) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections())
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        Ok(Self(pool))
    }

    async fn initialize(&self) -> Result<(), RegistryError> {
        MIGRATOR
            .run(&self.0)
            .await
            .map_err(|e| RegistryError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for SqlitePool {
    type Transaction = SqliteTransaction;

    async fn fetch_components(
        &self,
        statement: &Statement,
    ) -> Result<Vec<ComponentRow>, RegistryError> {
        debug!(sql = statement.sql(), "Fetching components");
        let args = bind_values(statement.values())?;
        let rows = sqlx::query_with(statement.sql(), args)
            .fetch_all(&self.0)
            .await
            .map_err(storage_error)?;

        rows.iter().map(decode_component_row).collect()
    }

    async fn fetch_entity_id(&self, statement: &Statement) -> Result<Option<Id>, RegistryError> {
        debug!(sql = statement.sql(), "Fetching entity id");
        let args = bind_values(statement.values())?;
        let row = sqlx::query_with(statement.sql(), args)
            .fetch_optional(&self.0)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(decode_entity_id).transpose()
    }

    /// Begin a write transaction holding the database write lock.
    ///
    /// The version read happens before the insert, and a deferred transaction
    /// cannot upgrade its read lock while other connections read, so the lock
    /// is taken up front where the busy timeout applies.
    async fn begin_transaction(&self) -> Result<Self::Transaction, RegistryError> {
        let tx = self
            .0
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(storage_error)?;
        Ok(SqliteTransaction { tx })
    }
}

/// SQLite transaction wrapper implementing TransactionExecutor.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl TransactionExecutor for SqliteTransaction {
    async fn fetch_versions(
        &mut self,
        statement: &Statement,
    ) -> Result<Vec<VersionRow>, RegistryError> {
        let args = bind_values(statement.values())?;
        let rows = sqlx::query_with(statement.sql(), args)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(storage_error)?;

        rows.iter().map(decode_version_row).collect()
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, RegistryError> {
        debug!(
            parameters = statement.values().len(),
            "Executing statement in transaction"
        );
        let args = bind_values(statement.values())?;
        let result = sqlx::query_with(statement.sql(), args)
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), RegistryError> {
        self.tx.commit().await.map_err(storage_error)
    }

    async fn rollback(self) -> Result<(), RegistryError> {
        self.tx.rollback().await.map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://registry?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://registry.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_keeps_its_schema() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        pool.initialize().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM component")
            .fetch_one(pool.inner())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
