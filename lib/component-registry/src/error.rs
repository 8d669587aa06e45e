use thiserror::Error;

use crate::TypeTag;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// A component id already exists. Regenerate ids and retry.
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// A unique-flagged component's content is already claimed within the system.
    #[error("Duplicate unique key: {0}")]
    DuplicateUniqueKey(String),

    /// The same attribute was written twice for an entity at the same version,
    /// within one batch or by a concurrent writer under `VersionPolicy::Incrementing`.
    #[error("Duplicate attribute: {0}")]
    DuplicateAttribute(String),

    /// The store applied a different number of rows than were submitted.
    #[error("Row count mismatch: expected {expected}, got {actual}")]
    RowCountMismatch { expected: u64, actual: u64 },

    #[error("Mapper error: {0}")]
    MapperError(#[from] MapperError),

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(TypeTag),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Type tag mismatch: row has {expected}, payload decodes to {actual}")]
    TagMismatch { expected: TypeTag, actual: TypeTag },

    #[error("Duplicate mapping: {0}")]
    DuplicateMapping(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
