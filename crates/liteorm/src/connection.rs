//! Process-wide SQLite connection.
//!
//! Statements built by [`select`](crate::select) and friends run against the
//! connection opened by [`init`]. Each statement holds the lock only while it
//! executes.

use crate::entity::registry;
use crate::error::{OrmError, OrmResult};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Environment variable holding the database file name.
pub const DATABASE_ENV: &str = "LITEORM_DATABASE";
/// Environment variable holding the directory of the database file.
pub const DATABASE_DIR_ENV: &str = "LITEORM_DATABASE_DIR";

static CONNECTION: OnceLock<Mutex<Connection>> = OnceLock::new();

/// Where and how to open the database.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Database file name.
    pub database: String,
    /// Directory containing the database; the current directory when unset.
    pub directory: Option<PathBuf>,
    /// Open a private in-memory database instead of a file.
    pub in_memory: bool,
    /// How long to wait on a locked database.
    pub busy_timeout: Option<Duration>,
    /// Enforce `FOREIGN KEY` constraints.
    pub foreign_keys: bool,
}

impl ConnectionConfig {
    /// File-backed database in the current directory.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            directory: None,
            in_memory: false,
            busy_timeout: None,
            foreign_keys: false,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::new(":memory:")
        }
    }

    /// Read `LITEORM_DATABASE` and `LITEORM_DATABASE_DIR`.
    ///
    /// A database name of `:memory:` selects an in-memory database.
    pub fn from_env() -> OrmResult<Self> {
        let database = std::env::var(DATABASE_ENV).map_err(|_| {
            OrmError::configuration(format!("{DATABASE_ENV} is not set"))
        })?;
        if database == ":memory:" {
            return Ok(Self::in_memory());
        }
        let mut config = Self::new(database);
        if let Ok(dir) = std::env::var(DATABASE_DIR_ENV) {
            config = config.directory(dir);
        }
        Ok(config)
    }

    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Full path of the database file.
    pub fn path(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(&self.database),
            None => PathBuf::from(&self.database),
        }
    }

    /// Open a connection with this configuration.
    pub fn open(&self) -> OrmResult<Connection> {
        let conn = if self.in_memory {
            Connection::open_in_memory()
        } else {
            Connection::open(self.path())
        }
        .map_err(|e| {
            OrmError::Connection(format!("could not open {}: {e}", self.describe()))
        })?;

        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if self.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        Ok(conn)
    }

    fn describe(&self) -> String {
        if self.in_memory {
            "in-memory database".to_string()
        } else {
            self.path().display().to_string()
        }
    }
}

/// Open the process-wide connection.
///
/// Only the first call opens anything; later calls return `Ok(())` and keep
/// the existing connection.
pub fn init(config: &ConnectionConfig) -> OrmResult<()> {
    if CONNECTION.get().is_some() {
        return Ok(());
    }
    let conn = config.open()?;
    if CONNECTION.set(Mutex::new(conn)).is_ok() {
        tracing::info!(target: "liteorm", database = %config.describe(), "connection opened");
    }
    Ok(())
}

pub fn is_initialized() -> bool {
    CONNECTION.get().is_some()
}

/// Run `f` with exclusive access to the connection.
pub fn with_connection<R>(f: impl FnOnce(&Connection) -> OrmResult<R>) -> OrmResult<R> {
    let lock = CONNECTION.get().ok_or_else(OrmError::not_initialized)?;
    let conn = lock
        .lock()
        .map_err(|_| OrmError::Connection("connection lock poisoned".to_string()))?;
    f(&conn)
}

/// Run one or more `;`-separated statements without parameters, e.g. DDL.
pub fn execute_batch(sql: &str) -> OrmResult<()> {
    with_connection(|conn| {
        tracing::trace!(target: "liteorm.sql", sql = %sql, "executing batch");
        conn.execute_batch(sql).map_err(OrmError::from)
    })
}

/// Mismatch between a registered entity and the live schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    MissingTable { entity: String, table: String },
    MissingColumn { entity: String, table: String, column: String },
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaIssue::MissingTable { entity, table } => {
                write!(f, "{entity}: table '{table}' does not exist")
            }
            SchemaIssue::MissingColumn {
                entity,
                table,
                column,
            } => write!(f, "{entity}: column '{table}.{column}' does not exist"),
        }
    }
}

/// Compare every registered entity against `PRAGMA table_info`.
pub fn check_entities() -> OrmResult<Vec<SchemaIssue>> {
    with_connection(|conn| {
        let mut issues = Vec::new();
        for desc in registry::entities() {
            let mut stmt = conn.prepare("select name from pragma_table_info(?1)")?;
            let existing = stmt
                .query_map([desc.table], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            if existing.is_empty() {
                issues.push(SchemaIssue::MissingTable {
                    entity: desc.name.to_string(),
                    table: desc.table.to_string(),
                });
                continue;
            }
            for col in desc.columns {
                if !existing.iter().any(|c| c.eq_ignore_ascii_case(col.name)) {
                    issues.push(SchemaIssue::MissingColumn {
                        entity: desc.name.to_string(),
                        table: desc.table.to_string(),
                        column: col.name.to_string(),
                    });
                }
            }
        }
        Ok(issues)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joins_directory() {
        let config = ConnectionConfig::new("app.db").directory("/var/data");
        assert_eq!(config.path(), PathBuf::from("/var/data/app.db"));
        assert_eq!(ConnectionConfig::new("app.db").path(), PathBuf::from("app.db"));
    }

    #[test]
    fn open_in_memory_with_pragmas() {
        let conn = ConnectionConfig::in_memory()
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(50))
            .open()
            .unwrap();
        let fk: i64 = conn
            .query_row("pragma foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn open_missing_directory_fails() {
        let err = ConnectionConfig::new("x.db")
            .directory("/nonexistent/liteorm/dir")
            .open()
            .unwrap_err();
        assert!(matches!(err, OrmError::Connection(_)));
    }
}
