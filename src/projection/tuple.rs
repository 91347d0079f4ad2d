//! Heterogeneous tuples.
//!
//! A [`Tuple`] keeps the select targets next to the values, so callers read a
//! value back with the same expression they selected instead of a position.

use std::ops::Range;
use std::sync::Arc;

use super::{Projection, ResultRow};
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, Expression, SqlType};
use crate::query::{FetchSlot, SelectTarget};
use crate::schema::{Entity, EntityPath, RowView};
use crate::value::{FromValue, Value};

/// Lists of select targets accepted by the tuple and DTO shapes.
pub trait IntoTargets {
    fn into_targets(self) -> Vec<SelectTarget>;
}

impl IntoTargets for Vec<SelectTarget> {
    fn into_targets(self) -> Vec<SelectTarget> {
        self
    }
}

macro_rules! into_targets {
    ($($name:ident),+) => {
        impl<$($name: Into<SelectTarget>),+> IntoTargets for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_targets(self) -> Vec<SelectTarget> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

into_targets!(A);
into_targets!(A, B);
into_targets!(A, B, C);
into_targets!(A, B, C, D);
into_targets!(A, B, C, D, E);
into_targets!(A, B, C, D, E, F);
into_targets!(A, B, C, D, E, F, G);
into_targets!(A, B, C, D, E, F, G, H);

#[derive(Debug)]
struct Shape {
    targets: Vec<SelectTarget>,
}

/// Shape built by [`Projections::tuple`](super::Projections::tuple).
#[derive(Debug, Clone)]
pub struct TupleProjection {
    shape: Arc<Shape>,
}

impl TupleProjection {
    pub(crate) fn new(targets: Vec<SelectTarget>) -> Self {
        Self {
            shape: Arc::new(Shape { targets }),
        }
    }
}

impl Projection for TupleProjection {
    type Output = Tuple;

    fn targets(&self) -> Vec<SelectTarget> {
        self.shape.targets.clone()
    }

    fn width(&self) -> usize {
        self.shape.targets.len()
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<Tuple> {
        let mut values = Vec::new();
        let mut ranges = Vec::with_capacity(self.shape.targets.len());
        for i in 0..self.shape.targets.len() {
            let slice = row.target(i)?;
            ranges.push(values.len()..values.len() + slice.len());
            values.extend_from_slice(slice);
        }

        let mut fetched = Vec::new();
        for slot in &row.layout().fetches {
            let owned_here = self
                .shape
                .targets
                .iter()
                .any(|t| matches!(t, SelectTarget::Entity(e) if e.alias == slot.owner));
            if owned_here {
                let slice = row.values().get(slot.range.clone()).unwrap_or_default();
                fetched.push((slot.clone(), slice.to_vec()));
            }
        }

        Ok(Tuple {
            shape: Arc::clone(&self.shape),
            values,
            ranges,
            fetched,
        })
    }
}

/// One row of heterogeneous values.
#[derive(Debug, Clone)]
pub struct Tuple {
    shape: Arc<Shape>,
    values: Vec<Value>,
    ranges: Vec<Range<usize>>,
    fetched: Vec<(FetchSlot, Vec<Value>)>,
}

impl Tuple {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn position(&self, expr: &Expr) -> Option<usize> {
        self.shape
            .targets
            .iter()
            .position(|t| matches!(t, SelectTarget::Expr(s) if s.expr == *expr))
    }

    fn single(&self, index: usize) -> Option<&Value> {
        let range = self.ranges.get(index)?;
        match &self.values[range.clone()] {
            [value] => Some(value),
            _ => None,
        }
    }

    fn coerce<T: FromValue>(&self, index: usize, label: String) -> QueryResult<T> {
        let value = self
            .single(index)
            .ok_or_else(|| QueryError::MissingTarget(label.clone()))?;
        T::from_value(value.clone()).map_err(|e| QueryError::mismatch(label, e))
    }

    /// The value selected by `expr`; `None` when it is NULL.
    pub fn get<T: SqlType>(&self, expr: &Expression<T>) -> QueryResult<Option<T>> {
        let label = describe(expr.as_expr());
        let index = self
            .position(expr.as_expr())
            .ok_or_else(|| QueryError::MissingTarget(label.clone()))?;
        self.coerce(index, label)
    }

    /// The value selected under the result alias `name`.
    pub fn get_alias<T: SqlType>(&self, name: &str) -> QueryResult<Option<T>> {
        let index = self
            .shape
            .targets
            .iter()
            .position(|t| matches!(t, SelectTarget::Expr(s) if s.alias.as_deref() == Some(name)))
            .ok_or_else(|| QueryError::MissingTarget(name.to_owned()))?;
        self.coerce(index, name.to_owned())
    }

    /// The entity selected as `path`; `None` when an outer join found nothing.
    pub fn get_entity<E: Entity>(&self, path: &EntityPath<E>) -> QueryResult<Option<E>> {
        let index = self
            .shape
            .targets
            .iter()
            .position(|t| matches!(t, SelectTarget::Entity(e) if e.alias == path.alias()))
            .ok_or_else(|| QueryError::MissingTarget(path.alias().to_owned()))?;
        let view = RowView::new(E::schema(), &self.values[self.ranges[index].clone()]);
        let Some(mut entity) = view.entity::<E>()? else {
            return Ok(None);
        };
        for (slot, values) in self.fetched.iter().filter(|(s, _)| s.owner == path.alias()) {
            entity.load_relation(slot.relation, &RowView::new(slot.schema, values))?;
        }
        Ok(Some(entity))
    }

    /// Raw values in select order; entity targets contribute all their columns.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Column { alias, field, .. } => format!("{alias}.{field}"),
        other => format!("{other:?}"),
    }
}
