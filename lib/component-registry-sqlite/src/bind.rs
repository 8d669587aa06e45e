//! Binding of registry statements to SQLite arguments and decoding of rows.

use chrono::{DateTime, Utc};
use component_registry::{
    ComponentRow, ConstraintViolation, Id, RegistryError, Timestamp, TypeTag, Value, VersionRow,
};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Row};
use tracing::warn;

/// Bind statement values, in order, to owned SqliteArguments.
pub fn bind_values(values: &[Value]) -> Result<SqliteArguments<'static>, RegistryError> {
    let mut args = SqliteArguments::default();
    for value in values {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

fn bind_value(args: &mut SqliteArguments<'static>, value: &Value) -> Result<(), RegistryError> {
    match value {
        Value::SmallInt(n) => args.add(*n),
        Value::Integer(n) => args.add(*n),
        Value::BigInt(n) => args.add(*n),
        Value::Text(s) => args.add(s.clone()),
        Value::Binary(bytes) => args.add(bytes.clone()),
        Value::Timestamp(ts) => args.add(*ts.inner()),
        Value::Null => args.add(None::<String>),
    }
    .map_err(|e| RegistryError::StorageError(e.to_string()))
}

fn storage_error(e: sqlx::Error) -> RegistryError {
    RegistryError::StorageError(e.to_string())
}

/// Map a driver error, classifying uniqueness violations.
///
/// SQLite does not report constraint names, so classification reads the
/// column list out of the `UNIQUE constraint failed` message.
pub fn map_write_error(e: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db_error) = &e {
        let violation = db_error
            .constraint()
            .and_then(ConstraintViolation::from_constraint_name)
            .or_else(|| ConstraintViolation::from_message(db_error.message()));

        if let Some(violation) = violation {
            warn!(
                constraint = violation.constraint_name(),
                "Component write violated uniqueness constraint"
            );
            return violation.into_error(db_error.message());
        }
    }

    storage_error(e)
}

fn get_id(row: &SqliteRow, column: &str) -> Result<Id, RegistryError> {
    let bytes: Vec<u8> = row.try_get(column).map_err(storage_error)?;
    Id::try_from(bytes.as_slice())
}

/// Decode a row of the current-components query.
pub fn decode_component_row(row: &SqliteRow) -> Result<ComponentRow, RegistryError> {
    let type_tag: i16 = row.try_get("type").map_err(storage_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_error)?;
    let unique_flag: i16 = row.try_get("unique_flag").map_err(storage_error)?;

    Ok(ComponentRow {
        id: get_id(row, "id")?,
        entity_id: get_id(row, "entity_id")?,
        type_tag: TypeTag(type_tag),
        data: row.try_get("data").map_err(storage_error)?,
        version: row.try_get("version").map_err(storage_error)?,
        created_at: Timestamp::from(created_at),
        unique: unique_flag == 1,
    })
}

/// Decode a row of the current-versions query.
pub fn decode_version_row(row: &SqliteRow) -> Result<VersionRow, RegistryError> {
    let type_tag: i16 = row.try_get("type").map_err(storage_error)?;

    Ok(VersionRow {
        entity_id: get_id(row, "entity_id")?,
        type_tag: TypeTag(type_tag),
        version: row.try_get("version").map_err(storage_error)?,
    })
}

/// Decode the `entity_id` column of a unique-key lookup.
pub fn decode_entity_id(row: &SqliteRow) -> Result<Id, RegistryError> {
    get_id(row, "entity_id")
}
