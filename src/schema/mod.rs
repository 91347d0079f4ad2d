//! Entity path registry.
//!
//! Each entity type describes itself once through a static [`EntitySchema`]:
//! its table, the ordered column list and the relations other entities can be
//! joined through. Typed [`Field`] and [`Relation`] constants are the handles
//! expressions are built from:
//!
//! ```ignore
//! impl Member {
//!     pub const AGE: Field<Member, i32> = Field::new("age", "age");
//!     pub const TEAM: Relation<Member, Team> = Relation::new("team", "team_id", "team_id");
//! }
//!
//! let m = EntityPath::<Member>::new();
//! let adults = m.get(Member::AGE).gte(18);
//! ```

pub mod path;


use std::marker::PhantomData;

use crate::error::{QueryError, QueryResult};
use crate::value::{FromValue, Value, ValueKind};

pub use path::{EntityPath, EntityRef, RelationPath};

/// A mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Field name on the entity, also the name DTO slots match against.
    pub name: &'static str,
    /// Column name in the table.
    pub column: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
}

/// A relation from one entity to another, joined `owner.local = target.target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    pub name: &'static str,
    pub local_column: &'static str,
    pub target_column: &'static str,
}

/// Static description of an entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Entity name, used in messages.
    pub name: &'static str,
    pub table: &'static str,
    /// Alias of [`EntityPath::new`] paths.
    pub default_alias: &'static str,
    /// Primary key column; always an integer.
    pub primary_key: &'static str,
    /// Columns in row order. The primary key is one of them.
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
}

impl EntitySchema {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.column == column)
    }

    pub fn field(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A type stored as rows of one table.
pub trait Entity: Sized + 'static {
    fn schema() -> &'static EntitySchema;

    /// Build an instance from its columns.
    fn from_row(row: &RowView<'_>) -> QueryResult<Self>;

    /// Column values in schema order; the key may be `Value::Null`.
    fn to_values(&self) -> Vec<Value>;

    fn key(&self) -> Option<i64>;

    fn set_key(&mut self, key: i64);

    /// Receive the columns of a fetch-joined relation.
    ///
    /// Called once per row for every fetch join owned by this entity's
    /// alias. The default ignores the data.
    fn load_relation(&mut self, relation: &'static str, row: &RowView<'_>) -> QueryResult<()> {
        let _ = (relation, row);
        Ok(())
    }
}

// =============================================================================
// Typed handles
// =============================================================================

/// A column of entity `E` holding values of type `T`.
pub struct Field<E, T> {
    pub name: &'static str,
    pub column: &'static str,
    _ty: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Field<E, T> {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            _ty: PhantomData,
        }
    }
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> std::fmt::Debug for Field<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field({})", self.name)
    }
}

/// A relation from entity `E` to entity `R`.
pub struct Relation<E, R> {
    pub name: &'static str,
    pub local_column: &'static str,
    pub target_column: &'static str,
    _ty: PhantomData<fn() -> (E, R)>,
}

impl<E, R> Relation<E, R> {
    pub const fn new(
        name: &'static str,
        local_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            name,
            local_column,
            target_column,
            _ty: PhantomData,
        }
    }
}

impl<E, R> Clone for Relation<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for Relation<E, R> {}

impl<E, R> std::fmt::Debug for Relation<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Relation({})", self.name)
    }
}

// =============================================================================
// Row access
// =============================================================================

/// The slice of a result row holding one entity's columns, in schema order.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    schema: &'static EntitySchema,
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn new(schema: &'static EntitySchema, values: &'a [Value]) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Raw value of a column.
    pub fn value(&self, column: &str) -> QueryResult<&'a Value> {
        self.schema
            .column_index(column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| {
                QueryError::MissingTarget(format!("{}.{}", self.schema.name, column))
            })
    }

    /// Typed value of a field.
    pub fn get<E, T: FromValue>(&self, field: Field<E, T>) -> QueryResult<T> {
        let raw = self.value(field.column)?;
        T::from_value(raw.clone())
            .map_err(|e| QueryError::mismatch(format!("{}.{}", self.schema.name, field.name), e))
    }

    /// Whether the row carries no entity, as for an unmatched outer join.
    pub fn is_absent(&self) -> bool {
        self.value(self.schema.primary_key)
            .map(Value::is_null)
            .unwrap_or(true)
    }

    /// The entity in this row, or `None` when an outer join found nothing.
    pub fn entity<R: Entity>(&self) -> QueryResult<Option<R>> {
        if self.is_absent() {
            return Ok(None);
        }
        R::from_row(self).map(Some)
    }
}
