//! Registry requests and the backing-store executor contract.
//!
//! - `Query<D>`: read requests, resolved to at most one entity
//! - `Transaction<D>`: write requests, a batch of components persisted atomically
//! - `QueryExecutor` / `TransactionExecutor`: what a backing store must provide

use async_trait::async_trait;

use crate::{Component, ComponentData, ComponentRow, Id, RegistryError, Statement, VersionRow};

/// A read against the registry. Both forms return at most one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Query<D: ComponentData> {
    /// Current components of an entity, optionally restricted to some kinds.
    ByEntityId {
        id: Id,
        selected_types: Vec<D::Kind>,
    },
    /// The entity owning a unique-flagged component equal to `key`.
    ByUniqueKey {
        key: D,
        selected_types: Vec<D::Kind>,
    },
}

impl<D: ComponentData> Query<D> {
    pub fn by_entity_id(id: Id) -> Self {
        Query::ByEntityId {
            id,
            selected_types: Vec::new(),
        }
    }

    pub fn by_unique_key(key: D) -> Self {
        Query::ByUniqueKey {
            key,
            selected_types: Vec::new(),
        }
    }

    /// Restrict the returned components to these kinds. Empty means all kinds.
    pub fn with_types(mut self, types: impl IntoIterator<Item = D::Kind>) -> Self {
        match &mut self {
            Query::ByEntityId { selected_types, .. } | Query::ByUniqueKey { selected_types, .. } => {
                selected_types.extend(types);
            }
        }
        self
    }

    pub fn selected_types(&self) -> &[D::Kind] {
        match self {
            Query::ByEntityId { selected_types, .. } | Query::ByUniqueKey { selected_types, .. } => {
                selected_types
            }
        }
    }
}

/// A batch of components to write as one atomic unit.
///
/// The registry calls `components` exactly once per execution.
pub trait Transaction<D>: Send + Sync {
    fn components(&self) -> Vec<Component<D>>;
}

impl<D: ComponentData> Transaction<D> for Vec<Component<D>> {
    fn components(&self) -> Vec<Component<D>> {
        self.clone()
    }
}

impl<D: ComponentData> Transaction<D> for [Component<D>] {
    fn components(&self) -> Vec<Component<D>> {
        self.to_vec()
    }
}

/// Trait for executing registry statements against a backing store.
///
/// Implemented by database-specific pool types (e.g., PgPool, SqlitePool).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The transaction type for this executor.
    type Transaction: TransactionExecutor;

    /// Run a current-components query and decode its rows.
    async fn fetch_components(
        &self,
        statement: &Statement,
    ) -> Result<Vec<ComponentRow>, RegistryError>;

    /// Run a query selecting a single `entity_id` column, returning the first row.
    async fn fetch_entity_id(&self, statement: &Statement) -> Result<Option<Id>, RegistryError>;

    /// Begin a transaction. All writes of one batch go through it.
    async fn begin_transaction(&self) -> Result<Self::Transaction, RegistryError>;
}

/// Trait for executing statements within a transaction.
///
/// `execute` must report uniqueness violations as the classified
/// `DuplicateIdentifier`, `DuplicateUniqueKey` or `DuplicateAttribute` errors.
#[async_trait]
pub trait TransactionExecutor: Send {
    /// Run a current-versions query within the transaction.
    async fn fetch_versions(
        &mut self,
        statement: &Statement,
    ) -> Result<Vec<VersionRow>, RegistryError>;

    /// Execute a write and return the number of rows affected.
    async fn execute(&mut self, statement: &Statement) -> Result<u64, RegistryError>;

    /// Commit the transaction.
    async fn commit(self) -> Result<(), RegistryError>;

    /// Rollback the transaction.
    async fn rollback(self) -> Result<(), RegistryError>;
}
