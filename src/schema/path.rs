//! Aliased entity paths.

use std::fmt;
use std::marker::PhantomData;

use super::{Entity, EntitySchema, Field, Relation};
use crate::expr::{Expr, Expression};

/// An entity type under an alias.
///
/// The same entity may appear several times in one plan (self joins,
/// correlated sub-queries) as long as every occurrence has its own alias.
pub struct EntityPath<E> {
    alias: String,
    _ty: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityPath<E> {
    /// Path under the schema's default alias.
    pub fn new() -> Self {
        Self::aliased(E::schema().default_alias)
    }

    /// Path under a caller-chosen alias.
    pub fn aliased(alias: &str) -> Self {
        Self {
            alias: alias.to_owned(),
            _ty: PhantomData,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn schema(&self) -> &'static EntitySchema {
        E::schema()
    }

    /// A column of this entity.
    pub fn get<T>(&self, field: Field<E, T>) -> Expression<T> {
        Expression::from_expr(Expr::Column {
            alias: self.alias.clone(),
            column: field.column,
            field: field.name,
        })
    }

    /// A relation of this entity, ready to be joined.
    pub fn relation<R: Entity>(&self, relation: Relation<E, R>) -> RelationPath<R> {
        RelationPath {
            owner: self.entity_ref(),
            name: relation.name,
            local_column: relation.local_column,
            target_column: relation.target_column,
            _ty: PhantomData,
        }
    }

    /// `COUNT(alias.primary_key)`
    pub fn count(&self) -> Expression<i64> {
        self.key().count()
    }

    /// The primary key column.
    pub fn key(&self) -> Expression<i64> {
        let pk = E::schema().primary_key;
        let field = E::schema().columns.iter().find(|c| c.column == pk).map_or(pk, |c| c.name);
        Expression::from_expr(Expr::Column {
            alias: self.alias.clone(),
            column: pk,
            field,
        })
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            alias: self.alias.clone(),
            schema: E::schema(),
        }
    }
}

impl<E: Entity> Default for EntityPath<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EntityPath<E> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            _ty: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for EntityPath<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityPath({} as {})", E::schema().name, self.alias)
    }
}

/// Untyped entity reference: schema plus alias.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub alias: String,
    pub schema: &'static EntitySchema,
}

impl EntityRef {
    /// One column expression per schema column, in row order.
    pub fn columns(&self) -> Vec<Expr> {
        self.schema
            .columns
            .iter()
            .map(|c| Expr::Column {
                alias: self.alias.clone(),
                column: c.column,
                field: c.name,
            })
            .collect()
    }

    pub fn column(&self, column: &'static str) -> Expr {
        let field = self
            .schema
            .columns
            .iter()
            .find(|c| c.column == column)
            .map_or(column, |c| c.name);
        Expr::Column {
            alias: self.alias.clone(),
            column,
            field,
        }
    }
}

/// A relation reached from an aliased owner, pointing at entity `R`.
pub struct RelationPath<R> {
    pub(crate) owner: EntityRef,
    pub(crate) name: &'static str,
    pub(crate) local_column: &'static str,
    pub(crate) target_column: &'static str,
    _ty: PhantomData<fn() -> R>,
}

impl<R> RelationPath<R> {
    pub fn owner_alias(&self) -> &str {
        &self.owner.alias
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<R> fmt::Debug for RelationPath<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelationPath({}.{})", self.owner.alias, self.name)
    }
}
