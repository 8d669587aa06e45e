//! Registry traits and configuration.
//!
//! - `Registry<D>`: the façade application code calls
//! - `RegistryConnection`: database connection and initialization
//! - `RegistryConfig`: write-path policy

use async_trait::async_trait;
use serde::Deserialize;

use crate::{ComponentData, Entity, Query, RegistryError, Transaction};

const DEFAULT_MAX_CONNECTIONS: u32 = 16;

/// Connection configuration for database backends.
#[derive(Debug, Clone)]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
    /// Connect using a database URL string with an explicit pool size.
    Pool { url: String, max_connections: u32 },
}

impl ConnectionConfig {
    pub fn url(&self) -> &str {
        match self {
            ConnectionConfig::Url(url) | ConnectionConfig::Pool { url, .. } => url,
        }
    }

    pub fn max_connections(&self) -> u32 {
        match self {
            ConnectionConfig::Url(_) => DEFAULT_MAX_CONNECTIONS,
            ConnectionConfig::Pool {
                max_connections, ..
            } => *max_connections,
        }
    }
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Trait for database connection and initialization.
///
/// This trait abstracts the database connection lifecycle, allowing
/// different backends (PostgreSQL, SQLite) to implement their own
/// connection and migration logic.
#[async_trait]
pub trait RegistryConnection: Sized + Send + Sync {
    /// Connect to the database using the provided configuration.
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, RegistryError>;

    /// Initialize the database schema (run migrations).
    async fn initialize(&self) -> Result<(), RegistryError>;
}

/// How the write path assigns row versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Each write of an `(entity, type)` pair appends `max(version) + 1`.
    /// Earlier versions stay stored; reads resolve the highest one.
    ///
    /// Stores that let two transactions read the same maximum concurrently
    /// (PostgreSQL at read committed) reject the later insert of a racing
    /// pair with `DuplicateAttribute`. Nothing was written by that batch, so
    /// the caller may re-read and retry. SQLite serializes writers and never
    /// reports this for concurrent updates.
    #[default]
    Incrementing,
    /// Every row is written at version 0, so an attribute can be written
    /// once per entity. A second write fails with `DuplicateAttribute`.
    Fixed,
}

/// Configuration of a system-scoped registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub version_policy: VersionPolicy,
}

impl RegistryConfig {
    pub fn with_version_policy(mut self, version_policy: VersionPolicy) -> Self {
        self.version_policy = version_policy;
        self
    }
}

/// The registry façade: atomic batch writes and single-entity reads.
///
/// # Type Bounds
///
/// The generic type `D` is the domain value stored in components; its
/// `Kind` selects component types in queries.
#[async_trait]
pub trait Registry<D: ComponentData>: Send + Sync {
    /// Persist a transaction's components as one all-or-nothing unit.
    ///
    /// Uniqueness violations surface as `DuplicateIdentifier`,
    /// `DuplicateUniqueKey` or `DuplicateAttribute`. Nothing is retried.
    async fn execute<T>(&self, transaction: &T) -> Result<(), RegistryError>
    where
        T: Transaction<D> + ?Sized;

    /// Resolve a query to the current components of one entity.
    ///
    /// Returns `None` when nothing matches.
    async fn query(&self, query: &Query<D>) -> Result<Option<Entity<D>>, RegistryError>;
}
