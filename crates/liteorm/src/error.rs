//! Error types for liteorm

use thiserror::Error;

/// Result type alias for liteorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Connection missing, not openable, or unusable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Entity declarations do not support the requested operation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Entity field could not be read or written
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Result column could not be coerced into the field type
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// One-to-many declarations are inconsistent
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Builder was used out of order or rendered an inconsistent statement
    #[error("Statement error: {0}")]
    Statement(String),

    /// Primary key uniqueness violated by the datastore
    #[error("{}", primary_key_message(.entity, .declared))]
    PrimaryKeyViolation {
        entity: String,
        declared: bool,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution failed
    #[error("{context}")]
    Query {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

fn primary_key_message(entity: &str, declared: &bool) -> String {
    if *declared {
        format!("A row with the same primary key already exists for '{entity}'")
    } else {
        format!(
            "A primary key needs to be declared on '{entity}', since there is a primary key in the database"
        )
    }
}

impl OrmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a mapping error
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a relationship error
    pub fn relationship(message: impl Into<String>) -> Self {
        Self::Relationship(message.into())
    }

    /// Create a statement error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Error returned when no connection has been initialized
    pub fn not_initialized() -> Self {
        Self::Connection("Connection is not initialized".to_string())
    }

    /// Check if this is the "connection not initialized" error
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::Connection(msg) if msg == "Connection is not initialized")
    }

    /// Check if this is a primary key violation
    pub fn is_primary_key_violation(&self) -> bool {
        matches!(self, Self::PrimaryKeyViolation { .. })
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a mapping error
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Check if this is a relationship error
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Relationship(_))
    }

    /// Check if this is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Copy of a recorded build error with the same kind. Driver errors carry
    /// a non-cloneable source and are reported as statement errors.
    pub(crate) fn replay(&self) -> Self {
        match self {
            Self::Connection(m) => Self::Connection(m.clone()),
            Self::Configuration(m) => Self::Configuration(m.clone()),
            Self::Mapping(m) => Self::Mapping(m.clone()),
            Self::Decode { column, message } => Self::decode(column.clone(), message.clone()),
            Self::Relationship(m) => Self::Relationship(m.clone()),
            Self::Statement(m) => Self::Statement(m.clone()),
            other => Self::Statement(other.to_string()),
        }
    }

    /// The SQLite extended result code, when the error came from the driver
    pub fn sqlite_code(&self) -> Option<i32> {
        match self {
            Self::PrimaryKeyViolation { source, .. } | Self::Query { source, .. } => {
                source.sqlite_error().map(|e| e.extended_code)
            }
            _ => None,
        }
    }

    /// Parse a rusqlite error into a more specific OrmError
    ///
    /// `entity` names the type the statement was built for and whether it
    /// declares a primary key.
    pub fn from_db_error(err: rusqlite::Error, entity: &str, pk_declared: bool) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, _) = &err {
            if ffi_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
                return Self::PrimaryKeyViolation {
                    entity: entity.to_string(),
                    declared: pk_declared,
                    source: err,
                };
            }
        }
        Self::Query {
            context: "Error executing sql statement".to_string(),
            source: err,
        }
    }
}

impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query {
            context: "Error executing sql statement".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn sqlite_failure(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(extended_code),
            Some("UNIQUE constraint failed: user.id".to_string()),
        )
    }

    #[test]
    fn primary_key_code_maps_to_violation() {
        let err = OrmError::from_db_error(
            sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
            "User",
            false,
        );
        assert!(err.is_primary_key_violation());
        assert!(err.to_string().contains("'User'"));
        assert!(err.source().is_some());
        assert_eq!(
            err.sqlite_code(),
            Some(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        );
    }

    #[test]
    fn other_constraints_stay_generic() {
        let err = OrmError::from_db_error(
            sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            "User",
            true,
        );
        assert!(!err.is_primary_key_violation());
        assert_eq!(err.to_string(), "Error executing sql statement");
    }

    #[test]
    fn not_initialized_is_detectable() {
        assert!(OrmError::not_initialized().is_not_initialized());
        assert!(!OrmError::configuration("x").is_not_initialized());
    }
}
