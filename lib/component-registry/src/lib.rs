//! Component Registry - versioned entity-component storage.
//!
//! Typed components (structured facts) are attached to opaque entity
//! identifiers, written atomically in batches and read back either by
//! entity id or through a content-derived unique key.
//!
//! # Core Concepts
//!
//! - **Component**: one typed fact attached to an entity, immutable once written.
//! - **Entity**: the current component per type sharing an entity id.
//! - **System**: a namespace partitioning type tags and unique-key hashes.
//! - **Unique key**: a unique-flagged component whose content resolves to its entity.
//!
//! # Traits
//!
//! - [`Registry`]: batch writes and entity reads
//! - [`DataMapper`]: domain values to `(type tag, payload)` and back
//! - [`QueryExecutor`] / [`TransactionExecutor`]: backing store contract

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod component_registry;
mod constraint;
mod echo;
mod error;
mod hash;
mod id;
mod insert;
mod mapper;
mod model;
mod query;
mod registry;
mod row;
pub mod sql;
mod time;

pub use component_registry::ComponentRegistry;
pub use constraint::{
    ConstraintViolation, ENTITY_TYPE_VERSION, PRIMARY_KEY, UNIQUE_TYPE_AND_DATA,
};
pub use echo::EchoRegistry;
pub use error::{MapperError, RegistryError};
pub use hash::{ContentHash, content_hash};
pub use id::Id;
pub use insert::{Insert, InsertRow, Statement, Value};
pub use mapper::{ComponentData, DataMapper, JsonMapper, TypeTable};
pub use model::{Component, ComponentSystem, Entity, SystemId, TypeAndData, TypeTag};
pub use query::{Query, QueryExecutor, Transaction, TransactionExecutor};
pub use registry::{ConnectionConfig, Registry, RegistryConfig, RegistryConnection, VersionPolicy};
pub use row::{ComponentRow, VersionRow};
pub use time::Timestamp;
