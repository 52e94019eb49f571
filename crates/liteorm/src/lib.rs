//! # liteorm
//!
//! A fluent statement builder and small ORM for SQLite.
//!
//! ## Features
//!
//! - **Entity-first**: `#[derive(Entity)]` maps a plain struct to a table
//! - **Fluent statements**: `select` / `insert` / `update` / `delete` built by chained calls
//! - **Deterministic SQL**: clauses always render in the same order, values bind positionally
//! - **Primary-key inference**: update/delete without a where clause target the entity's row
//! - **Lazy relationships**: `Related<T>` loads a one-to-many list on first access
//!
//! ## Example
//!
//! ```ignore
//! use liteorm::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! struct User {
//!     #[orm(primary_key, auto_increment)]
//!     id: i64,
//!     name: String,
//!     #[orm(one_to_many = "user_id")]
//!     things: Related<Thing>,
//! }
//!
//! liteorm::connection::init(&ConnectionConfig::new("app.db"))?;
//!
//! let mut nick = User { name: "Nick".into(), ..Default::default() };
//! liteorm::insert(&mut nick).execute()?;
//!
//! let users = liteorm::select::<User>()
//!     .where_("name").like("N%")
//!     .order_by("name").asc()
//!     .get_list()?;
//!
//! for thing in users[0].things.get()? {
//!     println!("{thing:?}");
//! }
//! ```

extern crate self as liteorm;

pub mod clause;
pub mod column;
pub mod connection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod join;
pub mod prelude;
pub mod relation;
pub mod row;
pub mod value;
pub mod where_clause;

pub use clause::{ClauseSlot, StatementParts};
pub use column::ColumnExpression;
pub use connection::{ConnectionConfig, SchemaIssue};
pub use entity::{
    ColumnDef, Entity, EntityDescriptor, EntityRegistration, RelationshipDef, registry,
};
pub use error::{OrmError, OrmResult};
pub use executor::{SqlExecutor, StatementType};
pub use join::JoinType;
pub use relation::Related;
pub use row::ColumnRow;
pub use value::{FieldType, FromValue, Value};
pub use where_clause::{Comparator, Comparison};

// Re-export inventory for use by derive macros
pub use inventory;

#[cfg(feature = "derive")]
pub use liteorm_derive::Entity;

/// `select <t>.* from <t>`
pub fn select<T: Entity>() -> SqlExecutor<'static, T> {
    SqlExecutor::select()
}

/// `insert into <t>(..) values(..)`, with columns and values read from `entity` now.
pub fn insert<T: Entity>(entity: &mut T) -> SqlExecutor<'_, T> {
    SqlExecutor::insert(entity)
}

/// `update <t> set ..`; the set list is read from `entity` when the where
/// clause starts (or at execution, when the where clause is inferred).
pub fn update<T: Entity>(entity: &mut T) -> SqlExecutor<'_, T> {
    SqlExecutor::update(entity)
}

/// `delete from <t>`; needs an explicit where clause.
pub fn delete<T: Entity>() -> SqlExecutor<'static, T> {
    SqlExecutor::delete(None)
}

/// `delete from <t>`, defaulting to `where <t>.<pk> = <entity pk>`.
pub fn delete_entity<T: Entity>(entity: &T) -> SqlExecutor<'_, T> {
    SqlExecutor::delete(Some(entity))
}
