//! Stored row layout of the component table.

use crate::{ContentHash, Id, InsertRow, SystemId, Timestamp, TypeAndData, TypeTag, Value};

pub const COLUMN_SYSTEM_ID: &str = "system_id";
pub const COLUMN_ID: &str = "id";
pub const COLUMN_ENTITY_ID: &str = "entity_id";
pub const COLUMN_TYPE: &str = "type";
pub const COLUMN_DATA: &str = "data";
pub const COLUMN_VERSION: &str = "version";
pub const COLUMN_CREATED_AT: &str = "created_at";
pub const COLUMN_TYPE_AND_DATA_HASH: &str = "type_and_data_hash";
pub const COLUMN_UNIQUE_FLAG: &str = "unique_flag";

/// A component row as returned by the current-components query.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRow {
    pub id: Id,
    pub entity_id: Id,
    pub type_tag: TypeTag,
    pub data: String,
    pub version: i32,
    pub created_at: Timestamp,
    pub unique: bool,
}

impl ComponentRow {
    pub fn type_and_data(&self) -> TypeAndData {
        TypeAndData::new(self.type_tag, self.data.clone())
    }
}

/// Highest stored version for one `(entity_id, type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRow {
    pub entity_id: Id,
    pub type_tag: TypeTag,
    pub version: i32,
}

/// Everything needed to write one component row.
#[derive(Debug, Clone)]
pub(crate) struct NewRow {
    pub system: SystemId,
    pub id: Id,
    pub entity_id: Id,
    pub type_and_data: TypeAndData,
    pub hash: ContentHash,
    pub version: i32,
    pub created_at: Timestamp,
    pub unique: bool,
}

impl NewRow {
    pub fn into_insert_row(self) -> InsertRow {
        let columns = [
            (COLUMN_SYSTEM_ID, Value::SmallInt(self.system.as_i16())),
            (COLUMN_ID, Value::Binary(self.id.to_vec())),
            (COLUMN_ENTITY_ID, Value::Binary(self.entity_id.to_vec())),
            (COLUMN_TYPE, Value::SmallInt(self.type_and_data.type_tag.0)),
            (COLUMN_DATA, Value::Text(self.type_and_data.data)),
            (COLUMN_VERSION, Value::Integer(self.version)),
            (COLUMN_CREATED_AT, Value::Timestamp(self.created_at)),
            (COLUMN_TYPE_AND_DATA_HASH, Value::Binary(self.hash.to_vec())),
            (COLUMN_UNIQUE_FLAG, Value::SmallInt(i16::from(self.unique))),
        ];

        columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}
