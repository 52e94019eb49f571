//! Statement builder and executor.

use crate::clause::{ClauseSlot, StatementParts};
use crate::column::ColumnExpression;
use crate::connection;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::{OrmError, OrmResult};
use crate::join::{JoinClause, JoinType};
use crate::row::{self, ColumnRow};
use crate::value::Value;
use crate::where_clause::{Comparator, Comparison};
use rusqlite::Connection;
use std::any::TypeId;
use std::fmt;

/// Kind of statement being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementType::Select => "select",
            StatementType::Insert => "insert",
            StatementType::Update => "update",
            StatementType::Delete => "delete",
        })
    }
}

enum Target<'a, T> {
    Detached,
    Shared(&'a T),
    Exclusive(&'a mut T),
}

impl<T> Target<'_, T> {
    fn get(&self) -> Option<&T> {
        match self {
            Target::Detached => None,
            Target::Shared(t) => Some(*t),
            Target::Exclusive(t) => Some(&**t),
        }
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Target::Exclusive(t) => Some(&mut **t),
            _ => None,
        }
    }
}

/// A statement against the table of `T`, built by chained calls and run by
/// one of the terminal methods.
///
/// Created by [`select`](crate::select), [`insert`](crate::insert),
/// [`update`](crate::update), [`delete`](crate::delete) and
/// [`delete_entity`](crate::delete_entity). Misuse while building (an `and`
/// before any `where`, a second `where`, ...) is remembered and returned by
/// the terminal call before anything reaches the database.
#[must_use = "statements do nothing until a terminal method is called"]
pub struct SqlExecutor<'a, T: Entity> {
    parts: StatementParts,
    values: Vec<Value>,
    kind: StatementType,
    target: Target<'a, T>,
    where_defined: bool,
    error: Option<OrmError>,
}

impl<T: Entity> fmt::Debug for SqlExecutor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlExecutor")
            .field("entity", &T::descriptor().name)
            .field("kind", &self.kind)
            .field("sql", &self.parts.render())
            .field("values", &self.values)
            .field("error", &self.error)
            .finish()
    }
}

impl<'a, T: Entity> SqlExecutor<'a, T> {
    fn new(kind: StatementType, target: Target<'a, T>) -> Self {
        Self {
            parts: StatementParts::new(),
            values: Vec::new(),
            kind,
            target,
            where_defined: false,
            error: None,
        }
    }

    pub(crate) fn select() -> Self {
        let table = T::descriptor().table;
        let mut exec = Self::new(StatementType::Select, Target::Detached);
        exec.parts.set(ClauseSlot::Select, format!("select {table}.* "));
        exec.parts.set(ClauseSlot::From, format!("from {table} "));
        exec
    }

    pub(crate) fn insert(entity: &'a mut T) -> Self {
        let table = T::descriptor().table;
        let mut exec = Self::new(StatementType::Insert, Target::Exclusive(entity));
        exec.parts.set(ClauseSlot::Insert, format!("insert into {table}"));
        if let Err(e) = exec.prepare_insert() {
            exec.fail(e);
        }
        exec
    }

    pub(crate) fn update(entity: &'a mut T) -> Self {
        let table = T::descriptor().table;
        let mut exec = Self::new(StatementType::Update, Target::Exclusive(entity));
        exec.parts.set(ClauseSlot::Update, format!("update {table} "));
        exec
    }

    pub(crate) fn delete(target: Option<&'a T>) -> Self {
        let table = T::descriptor().table;
        let target = target.map_or(Target::Detached, Target::Shared);
        let mut exec = Self::new(StatementType::Delete, target);
        exec.parts.set(ClauseSlot::Delete, "delete ");
        exec.parts.set(ClauseSlot::From, format!("from {table} "));
        exec
    }

    /// Keep the first build error only.
    fn fail(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Column list and placeholders of an insert, read off the entity now.
    fn prepare_insert(&mut self) -> OrmResult<()> {
        let desc = T::descriptor();
        let entity = self
            .target
            .get()
            .ok_or_else(|| OrmError::configuration("insert needs an entity instance"))?;

        let mut columns = Vec::new();
        for col in desc.writable_columns(None) {
            if !col.readable(desc.name)? {
                continue;
            }
            if let Some(value) = entity.read_column(col.name) {
                columns.push(col.name);
                self.values.push(value);
            }
        }

        if columns.is_empty() {
            return self.parts.append(ClauseSlot::Insert, " default values ");
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        self.parts.append(
            ClauseSlot::Insert,
            &format!("({}) values({placeholders}) ", columns.join(", ")),
        )
    }

    /// `set` list of an update: every writable column except `where_field`.
    fn prepare_update(&mut self, where_field: &str) -> OrmResult<()> {
        let desc = T::descriptor();
        let entity = self
            .target
            .get()
            .ok_or_else(|| OrmError::configuration("update needs an entity instance"))?;

        let mut assignments = Vec::new();
        for col in desc.writable_columns(Some(where_field)) {
            if !col.readable(desc.name)? {
                continue;
            }
            if let Some(value) = entity.read_column(col.name) {
                assignments.push(format!("{} = ?", col.name));
                self.values.push(value);
            }
        }

        if assignments.is_empty() {
            return Err(OrmError::statement(format!(
                "update of {} has no columns to set",
                desc.name
            )));
        }
        self.parts
            .set(ClauseSlot::Set, format!("set {} ", assignments.join(", ")));
        Ok(())
    }

    /// Start the where clause on a column of `T`.
    pub fn where_(self, field: &str) -> Comparison<'a, T> {
        self.where_on::<T>(field)
    }

    /// Start the where clause on a column of another (joined) entity.
    pub fn where_on<U: Entity>(mut self, field: &str) -> Comparison<'a, T> {
        if self.error.is_none() {
            if let Err(e) = self.start_where(U::descriptor().table, field) {
                self.fail(e);
            }
        }
        Comparison::new(self)
    }

    fn start_where(&mut self, table: &str, field: &str) -> OrmResult<()> {
        if self.where_defined {
            return Err(OrmError::statement(
                "where has already been called on this statement; use and/or",
            ));
        }
        if self.kind == StatementType::Insert {
            return Err(OrmError::statement("an insert cannot have a where clause"));
        }
        if self.kind == StatementType::Update {
            self.prepare_update(field)?;
        }
        self.where_defined = true;
        self.parts
            .set(ClauseSlot::Where, format!("where {table}.{field} "));
        Ok(())
    }

    pub fn and(self, field: &str) -> Comparison<'a, T> {
        self.and_on::<T>(field)
    }

    pub fn and_on<U: Entity>(self, field: &str) -> Comparison<'a, T> {
        self.continue_where("and", U::descriptor().table, field)
    }

    pub fn or(self, field: &str) -> Comparison<'a, T> {
        self.or_on::<T>(field)
    }

    pub fn or_on<U: Entity>(self, field: &str) -> Comparison<'a, T> {
        self.continue_where("or", U::descriptor().table, field)
    }

    fn continue_where(mut self, keyword: &str, table: &str, field: &str) -> Comparison<'a, T> {
        if self.error.is_none() {
            if !self.where_defined {
                self.fail(OrmError::statement(format!(
                    "'{keyword} {field}' needs a preceding where"
                )));
            } else if let Err(e) =
                self.parts
                    .append(ClauseSlot::Where, &format!("{keyword} {table}.{field} "))
            {
                self.fail(e);
            }
        }
        Comparison::new(self)
    }

    pub(crate) fn push_comparison(mut self, comparator: Comparator, value: Value) -> Self {
        if self.error.is_none() {
            match self.parts.append(ClauseSlot::Where, comparator.as_sql()) {
                Ok(()) => self.values.push(value),
                Err(e) => self.fail(e),
            }
        }
        self
    }

    /// `join <R> on <R>.<right_field> = <L>.<left_field>`
    pub fn join<L: Entity, R: Entity>(self, left_field: &str, right_field: &str) -> Self {
        self.push_join::<L, R>(None, left_field, right_field)
    }

    /// Like [`join`](Self::join) with an explicit join kind.
    pub fn join_with<L: Entity, R: Entity>(
        self,
        left_field: &str,
        right_field: &str,
        kind: JoinType,
    ) -> Self {
        self.push_join::<L, R>(Some(kind), left_field, right_field)
    }

    fn push_join<L: Entity, R: Entity>(
        mut self,
        kind: Option<JoinType>,
        left_field: &str,
        right_field: &str,
    ) -> Self {
        let clause = JoinClause {
            kind,
            left_table: L::descriptor().table,
            left_field,
            right_table: R::descriptor().table,
            right_field,
        };
        self.parts
            .append_or_set(ClauseSlot::Join, &clause.to_string());
        self
    }

    /// Select the `T`s related to the type of `_owner` through a one-to-many
    /// declared on that type.
    ///
    /// Renders `join <owner> on <owner>.<pk> = <t>.<foreign key>`. The join
    /// does not filter on the owner's key; chain a
    /// [`where_on`](Self::where_on) for that.
    pub fn from<R: Entity>(mut self, _owner: &R) -> Self {
        let owner_desc = R::descriptor();
        let Some(pk) = owner_desc.primary_key() else {
            self.fail(OrmError::configuration(format!(
                "a primary key needs to be declared on {} to select {} from it",
                owner_desc.name,
                T::descriptor().name
            )));
            return self;
        };
        if owner_desc.relationships.is_empty() {
            self.fail(OrmError::relationship(format!(
                "no one-to-many relationship could be found on {}",
                owner_desc.name
            )));
            return self;
        }
        let target = TypeId::of::<T>();
        let Some(rel) = owner_desc
            .relationships
            .iter()
            .find(|r| (r.related_type)() == target)
        else {
            self.fail(OrmError::relationship(format!(
                "a one-to-many was found on {}, however it is not a list of {}",
                owner_desc.name,
                T::descriptor().name
            )));
            return self;
        };
        self.join::<T, R>(rel.foreign_key, pk.name)
    }

    /// `order by <field>`
    pub fn order_by(mut self, field: &str) -> Self {
        self.parts
            .set(ClauseSlot::OrderBy, format!("order by {field} "));
        self
    }

    pub fn asc(self) -> Self {
        self.order_direction("asc ")
    }

    pub fn desc(self) -> Self {
        self.order_direction("desc ")
    }

    fn order_direction(mut self, direction: &str) -> Self {
        if let Err(e) = self.parts.append(ClauseSlot::OrderBy, direction) {
            self.fail(e);
        }
        self
    }

    /// The statement as built so far. A recorded build error is returned
    /// with its original kind.
    pub fn to_sql(&self) -> OrmResult<String> {
        match &self.error {
            Some(e) => Err(e.replay()),
            None => Ok(self.parts.render()),
        }
    }

    /// Bind values recorded so far, in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn kind(&self) -> StatementType {
        self.kind
    }

    /// Finish the statement without running it: applies the inferred
    /// primary-key where clause and returns the SQL with its bind values.
    pub fn build(mut self) -> OrmResult<(String, Vec<Value>)> {
        self.finalize()?;
        Ok((self.parts.render(), self.values))
    }

    /// Surface build errors and infer `where <t>.<pk> = ?` for an update or
    /// delete without a where clause.
    fn finalize(&mut self) -> OrmResult<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.where_defined
            || !matches!(self.kind, StatementType::Update | StatementType::Delete)
        {
            return Ok(());
        }

        let desc = T::descriptor();
        let pk = desc.require_primary_key()?;
        let entity = self.target.get().ok_or_else(|| {
            OrmError::configuration(format!(
                "an entity instance is required to infer the where clause of this {} on {}",
                self.kind, desc.name
            ))
        })?;
        let key = entity.read_column(pk.name).ok_or_else(|| {
            OrmError::configuration(format!(
                "primary key '{}' of {} has no accessor",
                pk.name, desc.name
            ))
        })?;

        self.start_where(desc.table, pk.name)?;
        self.parts.append(ClauseSlot::Where, Comparator::Eq.as_sql())?;
        self.values.push(key);
        Ok(())
    }

    fn expect_kind(&self, expected: StatementType, terminal: &str) -> OrmResult<()> {
        if self.kind != expected {
            return Err(OrmError::statement(format!(
                "{terminal}() cannot run a {} statement",
                self.kind
            )));
        }
        Ok(())
    }

    /// Run an insert, update or delete and return the number of affected rows.
    ///
    /// After an insert the generated row id is written into the
    /// auto-increment column. Loaded relationship cells of the entity are
    /// then saved with their foreign key pointing at it.
    pub fn execute(mut self) -> OrmResult<usize> {
        if self.kind == StatementType::Select {
            return Err(OrmError::statement(
                "execute() cannot run a select; use get_list, get_first, get_count or get_columns",
            ));
        }
        self.finalize()?;
        let desc = T::descriptor();
        let sql = self.parts.render();
        let kind = self.kind;

        let cascades =
            matches!(kind, StatementType::Insert | StatementType::Update) && desc.has_relationships();
        if cascades {
            for rel in desc.relationships {
                rel.validate(desc)?;
            }
            desc.require_primary_key()?;
        }

        let (affected, rowid) = run(desc, &sql, &self.values, |conn, stmt| {
            let affected = stmt.raw_execute().map_err(db_error(desc))?;
            let rowid = (kind == StatementType::Insert).then(|| conn.last_insert_rowid());
            Ok((affected, rowid))
        })?;

        if let Some(entity) = self.target.get_mut() {
            if let (Some(rowid), Some(auto)) = (rowid, desc.auto_increment()) {
                let current = entity.read_column(auto.name).unwrap_or(Value::Null);
                if current.is_empty() {
                    entity.write_column(auto.name, Value::Long(rowid))?;
                }
            }
            if cascades {
                cascade(entity)?;
            }
        }
        Ok(affected)
    }

    /// Run a select and materialize every row.
    pub fn get_list(mut self) -> OrmResult<Vec<T>> {
        self.expect_kind(StatementType::Select, "get_list")?;
        self.finalize()?;
        let desc = T::descriptor();
        let sql = self.parts.render();

        let mut entities = run(desc, &sql, &self.values, |_, stmt| {
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(db_error(desc))? {
                let mut entity = T::default();
                for (i, name) in names.iter().enumerate() {
                    let col = desc.column(name).ok_or_else(|| {
                        OrmError::mapping(format!(
                            "result column '{name}' is not mapped on {}",
                            desc.name
                        ))
                    })?;
                    let raw = row.get_ref(i).map_err(db_error(desc))?;
                    entity.write_column(name, col.field_type.read(name, raw)?)?;
                }
                out.push(entity);
            }
            Ok(out)
        })?;

        if desc.has_relationships() {
            attach(desc, &mut entities)?;
        }
        Ok(entities)
    }

    /// First row of [`get_list`](Self::get_list), if any.
    pub fn get_first(self) -> OrmResult<Option<T>> {
        Ok(self.get_list()?.into_iter().next())
    }

    /// Number of rows the select would return.
    pub fn get_count(mut self) -> OrmResult<i64> {
        self.expect_kind(StatementType::Select, "get_count")?;
        self.parts.set(ClauseSlot::Select, "select count(*) as count ");
        self.finalize()?;
        let desc = T::descriptor();
        let sql = self.parts.render();

        run(desc, &sql, &self.values, |_, stmt| {
            let mut rows = stmt.raw_query();
            match rows.next().map_err(db_error(desc))? {
                Some(row) => row.get::<_, i64>(0).map_err(db_error(desc)),
                None => Ok(0),
            }
        })
    }

    /// Run the select with a custom projection and return generic rows.
    ///
    /// Values are typed by the declared type of each result column.
    pub fn get_columns(mut self, expr: &ColumnExpression) -> OrmResult<Vec<ColumnRow>> {
        self.expect_kind(StatementType::Select, "get_columns")?;
        self.parts.set(ClauseSlot::Select, expr.to_sql()?);
        self.finalize()?;
        let desc = T::descriptor();
        let sql = self.parts.render();

        run(desc, &sql, &self.values, |_, stmt| {
            let columns: Vec<_> = stmt
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), row::declared_type(c.decl_type())))
                .collect();
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(r) = rows.next().map_err(db_error(desc))? {
                let mut projected = ColumnRow::with_capacity(columns.len());
                for (i, (name, decl)) in columns.iter().enumerate() {
                    let raw = r.get_ref(i).map_err(db_error(desc))?;
                    projected.push(name.clone(), row::read_projected(name, *decl, raw)?);
                }
                out.push(projected);
            }
            Ok(out)
        })
    }
}

fn db_error(desc: &EntityDescriptor) -> impl Fn(rusqlite::Error) -> OrmError + '_ {
    move |err| OrmError::from_db_error(err, desc.name, desc.primary_key().is_some())
}

/// Prepare `sql`, check its placeholders against `values`, bind them and
/// hand the statement to `f`, all under the connection lock.
fn run<R>(
    desc: &EntityDescriptor,
    sql: &str,
    values: &[Value],
    f: impl FnOnce(&Connection, &mut rusqlite::Statement<'_>) -> OrmResult<R>,
) -> OrmResult<R> {
    tracing::trace!(
        target: "liteorm.sql",
        entity = desc.name,
        sql = %sql,
        params = ?values,
        "executing statement"
    );
    connection::with_connection(|conn| {
        let mut stmt = conn.prepare(sql).map_err(db_error(desc))?;
        let expected = stmt.parameter_count();
        if expected != values.len() {
            return Err(OrmError::statement(format!(
                "statement has {expected} placeholders but {} values were bound",
                values.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)
                .map_err(db_error(desc))?;
        }
        f(conn, &mut stmt)
    })
    .inspect_err(|err| {
        tracing::error!(
            target: "liteorm.sql",
            entity = desc.name,
            sql = %sql,
            code = ?err.sqlite_code(),
            error = %err,
            "statement failed"
        );
    })
}

fn owner_key<T: Entity>(desc: &EntityDescriptor, entity: &T) -> OrmResult<Value> {
    let pk = desc.primary_key().ok_or_else(|| {
        OrmError::configuration(format!(
            "{} declares one-to-many relationships, so it needs a primary key",
            desc.name
        ))
    })?;
    entity.read_column(pk.name).ok_or_else(|| {
        OrmError::configuration(format!(
            "primary key '{}' of {} has no accessor",
            pk.name, desc.name
        ))
    })
}

/// Point the relationship cells of freshly loaded entities at their owners.
fn attach<T: Entity>(desc: &EntityDescriptor, entities: &mut [T]) -> OrmResult<()> {
    for rel in desc.relationships {
        rel.validate(desc)?;
    }
    for entity in entities.iter_mut() {
        let key = owner_key(desc, entity)?;
        entity.attach_relations(&key);
    }
    Ok(())
}

fn cascade<T: Entity>(entity: &mut T) -> OrmResult<()> {
    let desc = T::descriptor();
    let key = owner_key(desc, entity)?;
    if key.is_empty() {
        return Err(OrmError::configuration(format!(
            "{} has no primary key value to link its related entities to",
            desc.name
        )));
    }
    entity.cascade_relations(&key)
}

#[cfg(test)]
mod tests;
