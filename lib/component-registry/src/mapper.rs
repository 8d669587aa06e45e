//! Mapping between domain component values and their stored `(type tag, payload)` form.
//!
//! - `ComponentData`: domain values with a closed set of kinds
//! - `DataMapper<D>`: the contract the registry serializes through
//! - `TypeTable<K>`: static bidirectional kind/tag table, built once at startup
//! - `JsonMapper<D>`: a `DataMapper` storing payloads as JSON

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

use crate::{MapperError, TypeAndData, TypeTag};

/// Domain values that can be stored as components.
///
/// `Kind` is the discriminant used to select component types in queries,
/// typically a fieldless enum mirroring the variants of the data enum.
pub trait ComponentData: Clone + Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Bidirectional mapping between domain values and `TypeAndData`.
pub trait DataMapper<D: ComponentData>: Send + Sync {
    /// Serialize a value into its type tag and payload.
    fn map(&self, data: &D) -> Result<TypeAndData, MapperError>;

    /// Deserialize a stored payload. Fails with `UnknownTypeTag` for unregistered tags.
    fn unmap(&self, type_and_data: &TypeAndData) -> Result<D, MapperError>;

    /// Resolve kinds to type tags. Fails with `UnsupportedType` for unregistered kinds.
    fn resolve_types(&self, kinds: &[D::Kind]) -> Result<Vec<TypeTag>, MapperError>;
}

/// Static table of kind to type tag assignments.
#[derive(Debug, Clone)]
pub struct TypeTable<K> {
    by_kind: HashMap<K, TypeTag>,
    by_tag: HashMap<TypeTag, K>,
}

impl<K: Copy + Eq + Hash + Debug> TypeTable<K> {
    /// Build the table, rejecting any kind or tag registered twice.
    pub fn new(pairs: impl IntoIterator<Item = (K, TypeTag)>) -> Result<Self, MapperError> {
        let mut by_kind = HashMap::new();
        let mut by_tag = HashMap::new();

        for (kind, tag) in pairs {
            if by_kind.insert(kind, tag).is_some() {
                return Err(MapperError::DuplicateMapping(format!("kind {:?}", kind)));
            }
            if by_tag.insert(tag, kind).is_some() {
                return Err(MapperError::DuplicateMapping(format!("type tag {}", tag)));
            }
        }

        Ok(Self { by_kind, by_tag })
    }

    pub fn tag(&self, kind: K) -> Result<TypeTag, MapperError> {
        self.by_kind
            .get(&kind)
            .copied()
            .ok_or_else(|| MapperError::UnsupportedType(format!("{:?}", kind)))
    }

    pub fn kind(&self, tag: TypeTag) -> Result<K, MapperError> {
        self.by_tag
            .get(&tag)
            .copied()
            .ok_or(MapperError::UnknownTypeTag(tag))
    }

    pub fn resolve(&self, kinds: &[K]) -> Result<Vec<TypeTag>, MapperError> {
        kinds.iter().map(|kind| self.tag(*kind)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// `DataMapper` that stores payloads as `serde_json` text.
pub struct JsonMapper<D: ComponentData> {
    table: TypeTable<D::Kind>,
    _marker: PhantomData<fn() -> D>,
}

impl<D: ComponentData> JsonMapper<D> {
    pub fn new(table: TypeTable<D::Kind>) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }

    pub fn table(&self) -> &TypeTable<D::Kind> {
        &self.table
    }
}

impl<D> DataMapper<D> for JsonMapper<D>
where
    D: ComponentData + Serialize + DeserializeOwned,
{
    fn map(&self, data: &D) -> Result<TypeAndData, MapperError> {
        let type_tag = self.table.tag(data.kind())?;
        let payload = serde_json::to_string(data)?;
        Ok(TypeAndData::new(type_tag, payload))
    }

    fn unmap(&self, type_and_data: &TypeAndData) -> Result<D, MapperError> {
        // Unknown tags fail before the payload is parsed
        self.table.kind(type_and_data.type_tag)?;

        let value: D = serde_json::from_str(&type_and_data.data)?;
        let actual = self.table.tag(value.kind())?;
        if actual != type_and_data.type_tag {
            return Err(MapperError::TagMismatch {
                expected: type_and_data.type_tag,
                actual,
            });
        }

        Ok(value)
    }

    fn resolve_types(&self, kinds: &[D::Kind]) -> Result<Vec<TypeTag>, MapperError> {
        self.table.resolve(kinds)
    }
}
