//! PostgreSQL implementation of QueryExecutor.

use async_trait::async_trait;
use component_registry::{
    ComponentRow, ConnectionConfig, Id, QueryExecutor, RegistryConnection, RegistryError,
    Statement, TransactionExecutor, VersionRow,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, Transaction};
use std::ops::Deref;
use tracing::debug;

use crate::bind::{
    bind_values, decode_component_row, decode_entity_id, decode_version_row, map_write_error,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn storage_error(e: sqlx::Error) -> RegistryError {
    RegistryError::StorageError(e.to_string())
}

/// Wrapper around sqlx::PgPool that implements QueryExecutor.
#[derive(Clone, Debug)]
pub struct PgPool(sqlx::PgPool);

impl PgPool {
    /// Create a new PgPool from an sqlx PgPool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.0
    }
}

impl Deref for PgPool {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl RegistryConnection for PgPool {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, RegistryError> {
        let config = config.into();
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .connect(config.url())
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
impl QueryExecutor for PgPool {
    type Transaction = PgTransaction;

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

    async fn begin_transaction(&self) -> Result<Self::Transaction, RegistryError> {
        let tx = self.0.begin().await.map_err(storage_error)?;
        Ok(PgTransaction { tx })
    }
}

/// PostgreSQL transaction wrapper implementing TransactionExecutor.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionExecutor for PgTransaction {
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
