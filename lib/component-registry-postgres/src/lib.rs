//! PostgreSQL backing store for component-registry.
//!
//! Provides a `QueryExecutor` over an sqlx pool, the component table
//! migrations, and classification of uniqueness violations by the
//! constraint name PostgreSQL reports.
//!
//! # Usage
//!
//! ```text
//! use component_registry_postgres::{PgPool, PgRegistry, RegistryConnection};
//!
//! let pool = PgPool::connect("postgres://localhost/registry").await?;
//! pool.initialize().await?;
//!
//! let registry = PgRegistry::new(pool, system);
//! registry.execute(&components).await?;
//! let entity = registry.query(&Query::by_entity_id(entity_id)).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use bind::map_write_error;
pub use executor::{PgPool, PgTransaction};

// Re-export sqlx migration types
pub use sqlx::migrate;
pub use sqlx::migrate::Migrator;

// Re-export core types for convenience
pub use component_registry::{
    Component, ComponentData, ComponentRegistry, ComponentSystem, ConnectionConfig, DataMapper,
    Entity, Id, Insert, InsertRow, JsonMapper, Query, QueryExecutor, Registry, RegistryConfig,
    RegistryConnection, RegistryError, Statement, SystemId, Transaction, TransactionExecutor,
    Timestamp, TypeTable, TypeTag, Value, VersionPolicy,
};

/// A component registry backed by PostgreSQL.
pub type PgRegistry<D> = ComponentRegistry<PgPool, D>;
