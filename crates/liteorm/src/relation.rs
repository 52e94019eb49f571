//! Lazily loaded one-to-many relationships.

use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::cell::OnceCell;
use std::fmt;

#[derive(Debug, Clone)]
struct Link {
    foreign_key: &'static str,
    owner_key: Value,
}

/// The "many" side of a one-to-many relationship.
///
/// Declared on an entity field with `#[orm(one_to_many = "<foreign key>")]`.
/// An entity loaded from the database gets each of its cells linked to its
/// primary key; the first [`get`](Self::get) then runs
/// `select <related> where <foreign key> = <owner key>` once and keeps the
/// result. Entities built in code can fill the cell with
/// [`set`](Self::set) or `Related::from(vec![..])`; inserting or updating
/// the owner saves whatever the cell has loaded.
///
/// The field has to be a `Related<T>`; any other container is rejected:
///
/// ```compile_fail
/// use liteorm::Entity;
///
/// #[derive(Default, Entity)]
/// struct Thing {
///     #[orm(primary_key, auto_increment)]
///     id: i64,
///     user_id: i64,
/// }
///
/// #[derive(Default, Entity)]
/// struct User {
///     #[orm(primary_key, auto_increment)]
///     id: i64,
///     #[orm(one_to_many = "user_id")]
///     things: Vec<Thing>,
/// }
/// ```
pub struct Related<T> {
    link: Option<Link>,
    items: OnceCell<Vec<T>>,
}

impl<T> Default for Related<T> {
    fn default() -> Self {
        Self {
            link: None,
            items: OnceCell::new(),
        }
    }
}

impl<T: Clone> Clone for Related<T> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
            items: self.items.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Related<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.get() {
            Some(items) => f.debug_tuple("Related").field(items).finish(),
            None => f.write_str("Related(<not loaded>)"),
        }
    }
}

impl<T> From<Vec<T>> for Related<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            link: None,
            items: OnceCell::from(items),
        }
    }
}

impl<T> Related<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the related list is in memory.
    pub fn is_loaded(&self) -> bool {
        self.items.get().is_some()
    }

    /// Replace the related list.
    pub fn set(&mut self, items: Vec<T>) {
        self.items = OnceCell::from(items);
    }

    /// Take the loaded list, if any.
    pub fn into_inner(self) -> Option<Vec<T>> {
        self.items.into_inner()
    }

    /// Link the cell to an owner and drop anything loaded.
    #[doc(hidden)]
    pub fn attach(&mut self, foreign_key: &'static str, owner_key: Value) {
        self.link = Some(Link {
            foreign_key,
            owner_key,
        });
        self.items = OnceCell::new();
    }
}

impl<T: Entity> Related<T> {
    fn load(&self) -> OrmResult<Vec<T>> {
        let Some(link) = &self.link else {
            return Ok(Vec::new());
        };
        tracing::debug!(
            target: "liteorm.relation",
            entity = T::descriptor().name,
            foreign_key = link.foreign_key,
            owner_key = %link.owner_key,
            "loading related entities"
        );
        crate::select::<T>()
            .where_(link.foreign_key)
            .eq(link.owner_key.clone())
            .get_list()
    }

    /// The related entities, queried on first access.
    pub fn get(&self) -> OrmResult<&[T]> {
        if let Some(items) = self.items.get() {
            return Ok(items.as_slice());
        }
        let loaded = self.load()?;
        Ok(self.items.get_or_init(|| loaded).as_slice())
    }

    /// Mutable access to the related entities, loading them first if needed.
    pub fn get_mut(&mut self) -> OrmResult<&mut Vec<T>> {
        if !self.is_loaded() {
            let loaded = self.load()?;
            self.items = OnceCell::from(loaded);
        }
        self.items
            .get_mut()
            .ok_or_else(|| OrmError::relationship("related entities were not loaded"))
    }

    /// Query the related entities again, replacing what was loaded.
    pub fn reload(&mut self) -> OrmResult<&[T]> {
        let loaded = self.load()?;
        self.items = OnceCell::from(loaded);
        self.get()
    }

    /// Save the loaded entities under `owner_key`.
    ///
    /// Each one gets its foreign key set, then is updated when a row with its
    /// primary key exists and inserted otherwise.
    #[doc(hidden)]
    pub fn cascade(&mut self, foreign_key: &'static str, owner_key: &Value) -> OrmResult<()> {
        self.link = Some(Link {
            foreign_key,
            owner_key: owner_key.clone(),
        });
        let Some(items) = self.items.get_mut() else {
            return Ok(());
        };

        let desc = T::descriptor();
        let pk = desc.require_primary_key()?;
        for item in items.iter_mut() {
            item.write_column(foreign_key, owner_key.clone())?;
            let key = item.read_column(pk.name).unwrap_or(Value::Null);
            let exists = !key.is_empty()
                && crate::select::<T>().where_(pk.name).eq(key).get_count()? > 0;

            tracing::debug!(
                target: "liteorm.relation",
                entity = desc.name,
                foreign_key,
                exists,
                "saving related entity"
            );
            if exists {
                crate::update(item).execute()?;
            } else {
                crate::insert(item).execute()?;
            }
        }
        Ok(())
    }
}
