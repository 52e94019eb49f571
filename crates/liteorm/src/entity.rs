//! Entity descriptors and the [`Entity`] trait implemented by `#[derive(Entity)]`.

use crate::error::{OrmError, OrmResult};
use crate::value::{FieldType, Value};
use std::any::TypeId;

/// A mapped column of an entity.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    /// Column name in the table.
    pub name: &'static str,
    pub field_type: FieldType,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Name of the accessor used to read the column, if the column has one.
    pub getter: Option<&'static str>,
}

impl ColumnDef {
    /// Whether the column can be read off an entity for insert/update.
    ///
    /// Boolean columns must be read through an `is_` accessor.
    pub fn readable(&self, entity: &str) -> OrmResult<bool> {
        match self.getter {
            None => Ok(false),
            Some(getter) if self.field_type == FieldType::Bool && getter.starts_with("get_") => {
                Err(OrmError::mapping(format!(
                    "boolean column '{}' on {entity} must use an `is_` accessor, found `{getter}`",
                    self.name
                )))
            }
            Some(_) => Ok(true),
        }
    }
}

/// A one-to-many edge from an entity to a list of related entities.
#[derive(Clone, Copy)]
pub struct RelationshipDef {
    /// Field holding the [`Related`](crate::Related) cell.
    pub field: &'static str,
    /// Column on the related table referencing the owner's primary key.
    pub foreign_key: &'static str,
    pub related: fn() -> &'static EntityDescriptor,
    pub related_type: fn() -> TypeId,
}

impl RelationshipDef {
    /// Check that the foreign key column exists on the related entity.
    pub fn validate(&self, owner: &EntityDescriptor) -> OrmResult<()> {
        let related = (self.related)();
        if related.column(self.foreign_key).is_none() {
            return Err(OrmError::relationship(format!(
                "foreign key '{}' of relationship '{}' on {} is not a column of {}",
                self.foreign_key, self.field, owner.name, related.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RelationshipDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipDef")
            .field("field", &self.field)
            .field("foreign_key", &self.foreign_key)
            .field("related", &(self.related)().name)
            .finish()
    }
}

/// Static description of a mapped type.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Rust type name.
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    pub relationships: &'static [RelationshipDef],
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn auto_increment(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto_increment)
    }

    pub fn has_relationships(&self) -> bool {
        !self.relationships.is_empty()
    }

    /// The primary key, or a configuration error naming the entity.
    pub fn require_primary_key(&self) -> OrmResult<&ColumnDef> {
        self.primary_key().ok_or_else(|| {
            OrmError::configuration(format!(
                "a primary key needs to be declared on {} to use this operation",
                self.name
            ))
        })
    }

    /// Columns written by insert/update, with the auto-increment column
    /// and the columns named in `exclude` left out.
    pub(crate) fn writable_columns<'a>(
        &'a self,
        exclude: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ColumnDef> + 'a {
        self.columns
            .iter()
            .filter(move |c| !c.auto_increment && Some(c.name) != exclude)
    }
}

/// A struct mapped to a table.
///
/// Implemented by `#[derive(Entity)]`; reads and writes are dispatched by
/// column name through generated match arms.
pub trait Entity: Default + 'static {
    fn descriptor() -> &'static EntityDescriptor;

    /// Read a column through its accessor. `None` when the column has no accessor.
    fn read_column(&self, column: &str) -> Option<Value>;

    /// Store a result value into the field mapped to `column`.
    fn write_column(&mut self, column: &str, value: Value) -> OrmResult<()>;

    /// Point every relationship cell at this entity's primary key.
    fn attach_relations(&mut self, _owner_key: &Value) {}

    /// Persist the loaded contents of every relationship cell.
    fn cascade_relations(&mut self, _owner_key: &Value) -> OrmResult<()> {
        Ok(())
    }

    fn primary_key_value(&self) -> Option<Value> {
        Self::descriptor()
            .primary_key()
            .and_then(|pk| self.read_column(pk.name))
    }
}

/// Registration record submitted by `#[derive(Entity)]`.
pub struct EntityRegistration {
    pub descriptor: fn() -> &'static EntityDescriptor,
}

inventory::collect!(EntityRegistration);

/// Lookup of every entity linked into the binary.
pub mod registry {
    use super::{EntityDescriptor, EntityRegistration};

    /// All registered entity descriptors, sorted by table name.
    pub fn entities() -> Vec<&'static EntityDescriptor> {
        let mut all: Vec<_> = inventory::iter::<EntityRegistration>
            .into_iter()
            .map(|reg| (reg.descriptor)())
            .collect();
        all.sort_by_key(|d| d.table);
        all
    }

    pub fn find(table: &str) -> Option<&'static EntityDescriptor> {
        inventory::iter::<EntityRegistration>
            .into_iter()
            .map(|reg| (reg.descriptor)())
            .find(|d| d.table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static THING_COLUMNS: &[ColumnDef] = &[
        ColumnDef {
            name: "id",
            field_type: FieldType::Long,
            primary_key: true,
            auto_increment: true,
            getter: Some("get_id"),
        },
        ColumnDef {
            name: "userId",
            field_type: FieldType::Long,
            primary_key: false,
            auto_increment: false,
            getter: Some("get_user_id"),
        },
    ];

    static THING: EntityDescriptor = EntityDescriptor {
        name: "Thing",
        table: "thing",
        columns: THING_COLUMNS,
        relationships: &[],
    };

    fn thing() -> &'static EntityDescriptor {
        &THING
    }

    struct Marker;

    fn marker() -> TypeId {
        TypeId::of::<Marker>()
    }

    static OWNER: EntityDescriptor = EntityDescriptor {
        name: "User",
        table: "user",
        columns: &[],
        relationships: &[],
    };

    #[test]
    fn key_lookups() {
        assert_eq!(THING.primary_key().map(|c| c.name), Some("id"));
        assert_eq!(THING.auto_increment().map(|c| c.name), Some("id"));
        assert!(OWNER.require_primary_key().unwrap_err().is_configuration());
    }

    #[test]
    fn writable_columns_skip_auto_increment_and_excluded() {
        let names: Vec<_> = THING.writable_columns(None).map(|c| c.name).collect();
        assert_eq!(names, ["userId"]);
        assert_eq!(THING.writable_columns(Some("userId")).count(), 0);
    }

    #[test]
    fn bool_columns_reject_get_accessor() {
        let mut col = ColumnDef {
            name: "active",
            field_type: FieldType::Bool,
            primary_key: false,
            auto_increment: false,
            getter: Some("get_active"),
        };
        assert!(col.readable("User").unwrap_err().is_mapping());
        col.getter = Some("is_active");
        assert!(col.readable("User").unwrap());
        col.getter = None;
        assert!(!col.readable("User").unwrap());
    }

    #[test]
    fn relationship_foreign_key_must_exist() {
        let good = RelationshipDef {
            field: "things",
            foreign_key: "userId",
            related: thing,
            related_type: marker,
        };
        assert!(good.validate(&OWNER).is_ok());

        let bad = RelationshipDef {
            foreign_key: "ownerId",
            ..good
        };
        let err = bad.validate(&OWNER).unwrap_err();
        assert!(err.is_relationship());
        assert!(err.to_string().contains("ownerId"));
    }
}
