//! Data model shared by the write and read paths.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{ComponentData, DataMapper, Id};

/// Logical namespace partitioning type tags and unique-key hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SystemId(pub u8);

impl SystemId {
    /// Storage representation (SMALLINT).
    pub fn as_i16(self) -> i16 {
        i16::from(self.0)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Small integer identifying a component type within a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeTag(pub i16);

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized form of a component value, produced and consumed by a [`DataMapper`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeAndData {
    pub type_tag: TypeTag,
    pub data: String,
}

impl TypeAndData {
    pub fn new(type_tag: TypeTag, data: impl Into<String>) -> Self {
        Self {
            type_tag,
            data: data.into(),
        }
    }
}

/// One typed fact attached to an entity. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Component<D> {
    id: Id,
    entity_id: Id,
    data: D,
    unique: bool,
}

impl<D> Component<D> {
    pub fn new(id: Id, entity_id: Id, data: D) -> Self {
        Self {
            id,
            entity_id,
            data,
            unique: false,
        }
    }

    /// A component whose content acts as a lookup key for its entity.
    pub fn unique(id: Id, entity_id: Id, data: D) -> Self {
        Self {
            id,
            entity_id,
            data,
            unique: true,
        }
    }

    pub(crate) fn from_parts(id: Id, entity_id: Id, data: D, unique: bool) -> Self {
        Self {
            id,
            entity_id,
            data,
            unique,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn entity_id(&self) -> Id {
        self.entity_id
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

/// Read-time projection of the current components sharing an entity id.
///
/// Every component has `entity_id() == id()` and at most one component per
/// type is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<D> {
    id: Id,
    components: Vec<Component<D>>,
}

impl<D> Entity<D> {
    pub(crate) fn new(id: Id, components: Vec<Component<D>>) -> Self {
        Self { id, components }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn components(&self) -> &[Component<D>] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Component<D>> {
        self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<D: ComponentData> Entity<D> {
    /// Get the component holding data of the given kind.
    pub fn component(&self, kind: D::Kind) -> Option<&Component<D>> {
        self.components.iter().find(|c| c.data.kind() == kind)
    }
}

/// A system id together with the mapper for its component types.
///
/// Created once at startup and shared by cloning.
pub struct ComponentSystem<D: ComponentData> {
    id: SystemId,
    mapper: Arc<dyn DataMapper<D>>,
}

impl<D: ComponentData> ComponentSystem<D> {
    pub fn new(id: SystemId, mapper: impl DataMapper<D> + 'static) -> Self {
        Self {
            id,
            mapper: Arc::new(mapper),
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn mapper(&self) -> &dyn DataMapper<D> {
        self.mapper.as_ref()
    }
}

impl<D: ComponentData> Clone for ComponentSystem<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<D: ComponentData> fmt::Debug for ComponentSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSystem")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
