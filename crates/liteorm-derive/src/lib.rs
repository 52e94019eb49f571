//! Derive macros for liteorm
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod entity;

/// Derive `Entity` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use liteorm::{Entity, Related};
///
/// #[derive(Default, Entity)]
/// struct User {
///     #[orm(primary_key, auto_increment)]
///     id: i64,
///     name: String,
///     #[orm(column = "pwd")]
///     password: String,
///     #[orm(one_to_many = "user_id")]
///     things: Related<Thing>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (default: struct name lower-cased)
/// - `#[orm(primary_key)]` / `#[orm(id)]` - Primary key column
/// - `#[orm(auto_increment)]` - Generated by the database; left out of insert and update
/// - `#[orm(one_to_many = "fk")]` - `Related<T>` field loaded through `T`'s `fk` column
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(getter = "method")]` - Read the column through `self.method()`
/// - `#[orm(no_getter)]` - Column is loaded but never written by insert/update
/// - `#[orm(skip)]` - Field is not mapped
///
/// Supported column types are `String`, `i32`, `i64`, `f32`, `f64`, `bool`,
/// `chrono::NaiveDateTime` and `Vec<u8>`, each optionally wrapped in `Option`.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
