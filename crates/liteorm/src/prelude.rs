//! Convenient imports for typical `liteorm` usage.
//!
//! ```ignore
//! use liteorm::prelude::*;
//! ```

pub use crate::{
    ColumnExpression, ColumnRow, ConnectionConfig, Entity, JoinType, OrmError, OrmResult,
    Related, Value,
};
pub use crate::{delete, delete_entity, insert, select, update};
