//! Multi-row INSERT builder.
//!
//! Rows are maps from column name to a typed [`Value`]. The builder takes the
//! sorted union of all column names, so the generated SQL is reproducible, and
//! pads rows that lack a column with [`Value::Null`].

use std::collections::{BTreeMap, BTreeSet};

use crate::Timestamp;

/// A value bound to a statement parameter. The variant is its storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Text(String),
    Binary(Vec<u8>),
    Timestamp(Timestamp),
    Null,
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::SmallInt(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::BigInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(bytes)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

/// One row of an insert: column name to value.
pub type InsertRow = BTreeMap<String, Value>;

/// SQL text with its positional (`$1`, `$2`, ...) parameters in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    values: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Builder for a single INSERT covering many rows.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    rows: Vec<InsertRow>,
}

impl Insert {
    pub fn of(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Vec::new(),
        }
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = InsertRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn row(mut self, row: InsertRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Build the statement. Parameters are row-major, columns in sorted order.
    pub fn build(self) -> Statement {
        let columns: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        let mut values = Vec::with_capacity(self.rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut placeholders = Vec::with_capacity(columns.len());
            for column in &columns {
                values.push(row.get(*column).cloned().unwrap_or(Value::Null));
                placeholders.push(format!("${}", values.len()));
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let cols: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_identifier(&self.table),
            cols.join(", "),
            tuples.join(", ")
        );

        Statement::new(sql, values)
    }
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
