//! Generic result rows returned by projection queries.

use crate::error::{OrmError, OrmResult};
use crate::value::{FieldType, Value, read_utf8};
use rusqlite::types::ValueRef;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One row of a [`get_columns`](crate::SqlExecutor::get_columns) result.
///
/// Keeps the column order of the projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRow {
    columns: Vec<(String, Value)>,
}

impl ColumnRow {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            columns: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Value of the named column (or alias).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Value of the named column, failing when the column is absent.
    pub fn try_get(&self, name: &str) -> OrmResult<&Value> {
        self.get(name)
            .ok_or_else(|| OrmError::decode(name, "column not found in row"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_json(&self) -> OrmResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| OrmError::mapping(format!("row could not be serialized: {e}")))
    }
}

impl Serialize for ColumnRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Pick the semantic type of a projected column from its declared type.
///
/// Follows SQLite's affinity rules; expressions without a declared type
/// use whatever type the stored value has.
pub(crate) fn declared_type(decl: Option<&str>) -> Option<FieldType> {
    let decl = decl?.to_ascii_lowercase();
    if decl.contains("int") {
        Some(FieldType::Long)
    } else if decl.contains("char") || decl.contains("clob") || decl.contains("text") {
        Some(FieldType::Text)
    } else if decl.contains("blob") {
        Some(FieldType::Blob)
    } else if decl.contains("real") || decl.contains("floa") || decl.contains("doub") {
        Some(FieldType::Double)
    } else {
        None
    }
}

/// Read one projected value.
pub(crate) fn read_projected(
    column: &str,
    decl: Option<FieldType>,
    raw: ValueRef<'_>,
) -> OrmResult<Value> {
    if let Some(ty) = decl {
        return ty.read(column, raw);
    }
    Ok(match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Long(i),
        ValueRef::Real(f) => Value::Double(f),
        ValueRef::Text(t) => Value::Text(read_utf8(column, t)?.to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}
