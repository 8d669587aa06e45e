//! Read statements against the component table.
//!
//! The SQL is portable between PostgreSQL and SQLite: `$n` placeholders,
//! `ROW_NUMBER()` window ranking, and `IN (...)` lists instead of arrays.

use crate::{ContentHash, Id, SystemId, TypeTag, Value, insert::Statement};

pub const TABLE_NAME: &str = "component";

const COMPONENT_COLUMNS: &str = "id, entity_id, type, data, version, created_at, unique_flag";

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Current (highest version) component per type for an entity, ordered by type.
///
/// An empty `types` slice selects every type.
pub fn select_current_components(system: SystemId, entity_id: Id, types: &[TypeTag]) -> Statement {
    let type_filter = if types.is_empty() {
        String::new()
    } else {
        format!(" AND type IN ({})", placeholders(3, types.len()))
    };

    let sql = format!(
        "WITH ranked_components AS (\
         SELECT {cols}, ROW_NUMBER() OVER (PARTITION BY type ORDER BY version DESC) AS rn \
         FROM {table} WHERE system_id = $1 AND entity_id = $2{filter}\
         ) SELECT {cols} FROM ranked_components WHERE rn = 1 ORDER BY type",
        cols = COMPONENT_COLUMNS,
        table = TABLE_NAME,
        filter = type_filter,
    );

    let mut values = vec![Value::SmallInt(system.as_i16()), Value::Binary(entity_id.to_vec())];
    values.extend(types.iter().map(|t| Value::SmallInt(t.0)));

    Statement::new(sql, values)
}

/// The entity owning a unique-flagged component with the given content hash.
pub fn select_entity_by_hash(system: SystemId, hash: &ContentHash) -> Statement {
    let sql = format!(
        "SELECT entity_id FROM {} WHERE system_id = $1 AND type_and_data_hash = $2 AND unique_flag = 1 LIMIT 1",
        TABLE_NAME
    );

    Statement::new(
        sql,
        vec![Value::SmallInt(system.as_i16()), Value::Binary(hash.to_vec())],
    )
}

/// Highest stored version per `(entity_id, type)` for the given entities.
pub fn select_current_versions(system: SystemId, entity_ids: &[Id]) -> Statement {
    let sql = format!(
        "SELECT entity_id, type, MAX(version) AS version FROM {} \
         WHERE system_id = $1 AND entity_id IN ({}) GROUP BY entity_id, type",
        TABLE_NAME,
        placeholders(2, entity_ids.len())
    );

    let mut values = vec![Value::SmallInt(system.as_i16())];
    values.extend(entity_ids.iter().map(|id| Value::Binary(id.to_vec())));

    Statement::new(sql, values)
}
