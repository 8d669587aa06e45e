//! Binding of registry statements to PostgreSQL arguments and decoding of rows.

use chrono::{DateTime, Utc};
use component_registry::{
    ComponentRow, ConstraintViolation, Id, RegistryError, Timestamp, TypeTag, Value, VersionRow,
};
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo};
use sqlx::{Arguments, Postgres, Row, Type};
use tracing::warn;

/// NULL parameter sent with an unspecified type (oid 0).
///
/// PostgreSQL infers the type from the target column, so padded columns of
/// any storage type accept it.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Bind statement values, in order, to PgArguments.
pub fn bind_values(values: &[Value]) -> Result<PgArguments, RegistryError> {
    let mut args = PgArguments::default();
    for value in values {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

fn bind_value(args: &mut PgArguments, value: &Value) -> Result<(), RegistryError> {
    match value {
        Value::SmallInt(n) => args.add(*n),
        Value::Integer(n) => args.add(*n),
        Value::BigInt(n) => args.add(*n),
        Value::Text(s) => args.add(s.clone()),
        Value::Binary(bytes) => args.add(bytes.clone()),
        Value::Timestamp(ts) => args.add(*ts.inner()),
        Value::Null => args.add(UntypedNull),
    }
    .map_err(|e| RegistryError::StorageError(e.to_string()))
}

fn storage_error(e: sqlx::Error) -> RegistryError {
    RegistryError::StorageError(e.to_string())
}

/// Map a driver error, classifying uniqueness violations by constraint name.
pub fn map_write_error(e: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db_error) = &e {
        let violation = db_error
            .constraint()
            .and_then(ConstraintViolation::from_constraint_name)
            .or_else(|| {
                db_error
                    .is_unique_violation()
                    .then(|| ConstraintViolation::from_message(db_error.message()))
                    .flatten()
            });

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

fn get_id(row: &PgRow, column: &str) -> Result<Id, RegistryError> {
    let bytes: Vec<u8> = row.try_get(column).map_err(storage_error)?;
    Id::try_from(bytes.as_slice())
}

/// Decode a row of the current-components query.
pub fn decode_component_row(row: &PgRow) -> Result<ComponentRow, RegistryError> {
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
pub fn decode_version_row(row: &PgRow) -> Result<VersionRow, RegistryError> {
    let type_tag: i16 = row.try_get("type").map_err(storage_error)?;

    Ok(VersionRow {
        entity_id: get_id(row, "entity_id")?,
        type_tag: TypeTag(type_tag),
        version: row.try_get("version").map_err(storage_error)?,
    })
}

/// Decode the `entity_id` column of a unique-key lookup.
pub fn decode_entity_id(row: &PgRow) -> Result<Id, RegistryError> {
    get_id(row, "entity_id")
}
