//! Bind values, column types, and the coercions between them and SQLite.

use crate::error::{OrmError, OrmResult};
use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::Serialize;

/// Format used to store dates as text.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Alternate date layout accepted when reading (space instead of `T`).
const DATE_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S";

/// Semantic type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Int,
    Long,
    Float,
    Double,
    Bool,
    Date,
    Blob,
}

impl FieldType {
    /// Read a result value as this semantic type.
    pub fn read(self, column: &str, raw: ValueRef<'_>) -> OrmResult<Value> {
        if let ValueRef::Null = raw {
            return Ok(Value::Null);
        }
        let bad = |found: &str| {
            OrmError::decode(column, format!("cannot read {found} as {self:?}"))
        };
        let value = match self {
            FieldType::Text => match raw {
                ValueRef::Text(t) => Value::Text(read_utf8(column, t)?.to_string()),
                ValueRef::Integer(i) => Value::Text(i.to_string()),
                ValueRef::Real(f) => Value::Text(f.to_string()),
                ValueRef::Blob(b) => Value::Text(read_utf8(column, b)?.to_string()),
                ValueRef::Null => Value::Null,
            },
            FieldType::Int => {
                let wide = read_integer(column, raw)?;
                let narrow = i32::try_from(wide).map_err(|_| {
                    OrmError::decode(column, format!("{wide} is out of range for i32"))
                })?;
                Value::Int(narrow)
            }
            FieldType::Long => Value::Long(read_integer(column, raw)?),
            FieldType::Float => Value::Float(read_real(column, raw)? as f32),
            FieldType::Double => Value::Double(read_real(column, raw)?),
            FieldType::Bool => match raw {
                ValueRef::Integer(i) => Value::Bool(i != 0),
                ValueRef::Text(t) => match t {
                    b"1" | b"true" | b"TRUE" => Value::Bool(true),
                    b"0" | b"false" | b"FALSE" => Value::Bool(false),
                    _ => return Err(bad("text")),
                },
                _ => return Err(bad("non-integer value")),
            },
            FieldType::Date => match raw {
                ValueRef::Text(t) => Value::Date(parse_date(read_utf8(column, t)?)?),
                _ => return Err(bad("non-text value")),
            },
            FieldType::Blob => match raw {
                ValueRef::Blob(b) => Value::Blob(b.to_vec()),
                ValueRef::Text(t) => Value::Blob(t.to_vec()),
                _ => return Err(bad("non-blob value")),
            },
        };
        Ok(value)
    }
}

/// Stored text as `&str`; invalid UTF-8 is a decode error, never replaced.
pub(crate) fn read_utf8<'r>(column: &str, bytes: &'r [u8]) -> OrmResult<&'r str> {
    std::str::from_utf8(bytes)
        .map_err(|e| OrmError::decode(column, format!("invalid UTF-8 text: {e}")))
}

fn read_integer(column: &str, raw: ValueRef<'_>) -> OrmResult<i64> {
    match raw {
        ValueRef::Integer(i) => Ok(i),
        ValueRef::Real(f) => Ok(f as i64),
        ValueRef::Text(t) => read_utf8(column, t)?
            .trim()
            .parse()
            .map_err(|e| OrmError::decode(column, format!("invalid integer: {e}"))),
        _ => Err(OrmError::decode(column, "cannot read blob as an integer")),
    }
}

fn read_real(column: &str, raw: ValueRef<'_>) -> OrmResult<f64> {
    match raw {
        ValueRef::Real(f) => Ok(f),
        ValueRef::Integer(i) => Ok(i as f64),
        ValueRef::Text(t) => read_utf8(column, t)?
            .trim()
            .parse()
            .map_err(|e| OrmError::decode(column, format!("invalid number: {e}"))),
        _ => Err(OrmError::decode(column, "cannot read blob as a number")),
    }
}

/// Render a date the way it is stored.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date.
pub fn parse_date(text: &str) -> OrmResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATE_FORMAT_SPACED))
        .map_err(|_| {
            OrmError::mapping(format!(
                "could not parse a date from '{text}', make sure it's in the form 'yyyy-MM-ddTHH:mm:ss'"
            ))
        })
}

/// A single bound parameter or result value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    #[serde(serialize_with = "serialize_date")]
    Date(NaiveDateTime),
    Blob(Vec<u8>),
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(date))
}

impl Value {
    /// `true` for SQL null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` when the value is "unset": null, blank text, zero, or `false`.
    ///
    /// Used to decide whether a primary key has been assigned yet.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Int(v) => *v == 0,
            Value::Long(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Double(v) => *v == 0.0,
            Value::Bool(v) => !*v,
            Value::Date(_) => false,
            Value::Blob(b) => b.is_empty(),
        }
    }

    /// Type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Int(_) => "int32",
            Value::Long(_) => "int64",
            Value::Float(_) => "float32",
            Value::Double(_) => "float64",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
            Value::Blob(_) => "blob",
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "'{}'", format_date(d)),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Long(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*v))),
            Value::Double(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(format_date(d))),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    String => Text,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    NaiveDateTime => Date,
    Vec<u8> => Blob,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a [`Value`] into an entity field type.
///
/// Implemented for every type `#[derive(Entity)]` accepts as a column. SQL
/// null becomes the type's default unless the field is an `Option`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> OrmResult<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> OrmResult<T> {
    Err(OrmError::mapping(format!(
        "{} value {} cannot be stored in a {target} field",
        value.kind(),
        value
    )))
}

impl FromValue for String {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s),
            Value::Date(d) => Ok(format_date(&d)),
            Value::Blob(_) => mismatch(&value, "String"),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(0),
            ref v => match v.as_i64().map(i32::try_from) {
                Some(Ok(n)) => Ok(n),
                _ => mismatch(v, "i32"),
            },
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(0),
            ref v => v.as_i64().map_or_else(|| mismatch(v, "i64"), Ok),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(0.0),
            ref v => v.as_f64().map_or_else(|| mismatch(v, "f32"), |f| Ok(f as f32)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(0.0),
            ref v => v.as_f64().map_or_else(|| mismatch(v, "f64"), Ok),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            ref v => v.as_i64().map_or_else(|| mismatch(v, "bool"), |i| Ok(i != 0)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(NaiveDateTime::default()),
            Value::Date(d) => Ok(d),
            Value::Text(s) => parse_date(&s),
            ref v => mismatch(v, "NaiveDateTime"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Blob(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            ref v => mismatch(v, "Vec<u8>"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 8, 13)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .unwrap()
    }

    #[test]
    fn dates_bind_as_canonical_text() {
        let date_value = Value::Date(sample_date());
        let out = date_value.to_sql().unwrap();
        assert_eq!(
            out,
            ToSqlOutput::Owned(SqlValue::Text("2012-08-13T14:05:09".to_string()))
        );
    }

    #[test]
    fn dates_read_back_from_either_layout() {
        let expected = Value::Date(sample_date());
        let t = FieldType::Date
            .read("d", ValueRef::Text(b"2012-08-13T14:05:09"))
            .unwrap();
        let s = FieldType::Date
            .read("d", ValueRef::Text(b"2012-08-13 14:05:09"))
            .unwrap();
        assert_eq!(t, expected);
        assert_eq!(s, expected);
    }

    #[test]
    fn bad_date_is_a_mapping_error() {
        let err = FieldType::Date
            .read("d", ValueRef::Text(b"13/08/2012"))
            .unwrap_err();
        assert!(err.is_mapping());
    }

    #[test]
    fn null_reads_as_null_for_every_type() {
        for ty in [FieldType::Text, FieldType::Int, FieldType::Bool, FieldType::Date] {
            assert_eq!(ty.read("c", ValueRef::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn bools_bind_as_integers() {
        assert_eq!(
            Value::Bool(true).to_sql().unwrap(),
            ToSqlOutput::Owned(SqlValue::Integer(1))
        );
        assert_eq!(
            FieldType::Bool.read("b", ValueRef::Integer(0)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn option_from_value() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(7)).unwrap(), Some(7));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn narrowing_overflow_is_rejected() {
        assert!(i32::from_value(Value::Long(i64::MAX)).unwrap_err().is_mapping());
        assert_eq!(i32::from_value(Value::Long(42)).unwrap(), 42);
    }

    #[test]
    fn out_of_range_integer_is_not_narrowed_on_read() {
        let err = FieldType::Int
            .read("hits", ValueRef::Integer(4_294_967_297))
            .unwrap_err();
        assert!(err.is_decode(), "{err}");
        assert_eq!(
            FieldType::Int.read("hits", ValueRef::Integer(-7)).unwrap(),
            Value::Int(-7)
        );
    }

    #[test]
    fn invalid_utf8_text_is_a_decode_error() {
        let bytes: &[u8] = &[b'a', 0xff, b'b'];
        assert!(FieldType::Text.read("t", ValueRef::Text(bytes)).unwrap_err().is_decode());
        assert!(FieldType::Text.read("t", ValueRef::Blob(bytes)).unwrap_err().is_decode());
        assert!(FieldType::Date.read("d", ValueRef::Text(bytes)).unwrap_err().is_decode());
        assert!(FieldType::Long.read("n", ValueRef::Text(bytes)).unwrap_err().is_decode());
        assert_eq!(
            FieldType::Text.read("t", ValueRef::Text(b"ok")).unwrap(),
            Value::Text("ok".into())
        );
    }

    #[test]
    fn empty_values() {
        assert!(Value::Long(0).is_empty());
        assert!(Value::Text("  ".into()).is_empty());
        assert!(!Value::Long(3).is_empty());
    }
}
