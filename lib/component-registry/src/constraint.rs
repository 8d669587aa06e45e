//! Classification of uniqueness violations raised by the backing store.
//!
//! Every migration names its constraints with the constants below, so a
//! backend that reports the violated constraint by name can be classified
//! exactly. Message inspection is only a fallback for drivers that don't.

use crate::RegistryError;

/// Primary key on `id`.
pub const PRIMARY_KEY: &str = "component_pkey";

/// Partial unique index on `(system_id, type_and_data_hash)` where `unique_flag = 1`.
pub const UNIQUE_TYPE_AND_DATA: &str = "component_unique_type_and_data";

/// Unique index on `(system_id, entity_id, type, version)`.
pub const ENTITY_TYPE_VERSION: &str = "component_entity_type_version";

/// Which uniqueness rule a failed write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    DuplicateIdentifier,
    DuplicateUniqueKey,
    DuplicateAttribute,
}

impl ConstraintViolation {
    pub fn constraint_name(self) -> &'static str {
        match self {
            ConstraintViolation::DuplicateIdentifier => PRIMARY_KEY,
            ConstraintViolation::DuplicateUniqueKey => UNIQUE_TYPE_AND_DATA,
            ConstraintViolation::DuplicateAttribute => ENTITY_TYPE_VERSION,
        }
    }

    /// Classify by the constraint name reported by the driver.
    pub fn from_constraint_name(name: &str) -> Option<Self> {
        match name {
            PRIMARY_KEY => Some(ConstraintViolation::DuplicateIdentifier),
            UNIQUE_TYPE_AND_DATA => Some(ConstraintViolation::DuplicateUniqueKey),
            ENTITY_TYPE_VERSION => Some(ConstraintViolation::DuplicateAttribute),
            _ => None,
        }
    }

    /// Classify from an unstructured driver message.
    ///
    /// Recognizes messages that embed one of the constraint names, and SQLite's
    /// `UNIQUE constraint failed: component.col, ...` column listing.
    pub fn from_message(message: &str) -> Option<Self> {
        for violation in [
            ConstraintViolation::DuplicateUniqueKey,
            ConstraintViolation::DuplicateAttribute,
            ConstraintViolation::DuplicateIdentifier,
        ] {
            if message.contains(violation.constraint_name()) {
                return Some(violation);
            }
        }

        let (_, columns) = message.split_once("constraint failed:")?;
        let columns: Vec<&str> = columns
            .split(',')
            .map(|c| c.trim())
            .map(|c| c.rsplit_once('.').map(|(_, col)| col).unwrap_or(c))
            .collect();

        if columns.contains(&"type_and_data_hash") {
            Some(ConstraintViolation::DuplicateUniqueKey)
        } else if columns.contains(&"version") {
            Some(ConstraintViolation::DuplicateAttribute)
        } else if columns == ["id"] {
            Some(ConstraintViolation::DuplicateIdentifier)
        } else {
            None
        }
    }

    pub fn into_error(self, detail: impl Into<String>) -> RegistryError {
        let detail = detail.into();
        match self {
            ConstraintViolation::DuplicateIdentifier => RegistryError::DuplicateIdentifier(detail),
            ConstraintViolation::DuplicateUniqueKey => RegistryError::DuplicateUniqueKey(detail),
            ConstraintViolation::DuplicateAttribute => RegistryError::DuplicateAttribute(detail),
        }
    }
}
