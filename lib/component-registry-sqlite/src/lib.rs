//! SQLite backing store for component-registry.
//!
//! Provides a `QueryExecutor` over an sqlx pool and the component table
//! migrations. Works against a file or `sqlite::memory:`, which makes it
//! the in-process store for tests and single-node deployments.
//!
//! # Usage
//!
//! ```text
//! use component_registry_sqlite::{RegistryConnection, SqlitePool, SqliteRegistry};
//!
//! let pool = SqlitePool::connect("sqlite::memory:").await?;
//! pool.initialize().await?;
//!
//! let registry = SqliteRegistry::new(pool, system);
//! registry.execute(&components).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use bind::map_write_error;
pub use executor::{SqlitePool, SqliteTransaction};

// Re-export core types for convenience
pub use component_registry::{
    Component, ComponentData, ComponentRegistry, ComponentSystem, ConnectionConfig, DataMapper,
    Entity, Id, Insert, InsertRow, JsonMapper, Query, QueryExecutor, Registry, RegistryConfig,
    RegistryConnection, RegistryError, Statement, SystemId, Transaction, TransactionExecutor,
    Timestamp, TypeTable, TypeTag, Value, VersionPolicy,
};

/// A component registry backed by SQLite.
pub type SqliteRegistry<D> = ComponentRegistry<SqlitePool, D>;
