//! Projection mapper: raw result rows into caller-facing shapes.
//!
//! A [`Projection`] names the select targets it needs and turns one row into
//! one value. Shapes:
//!
//! - scalars: [`Expression<T>`], [`Nullable<T>`], [`Aliased<T>`]
//! - entities: [`EntityPath<E>`], including fetch-joined relations
//! - Rust tuples of projections, mapped positionally into Rust tuples
//! - [`Tuple`]: heterogeneous values looked up by the selecting expression
//! - DTOs through a setter table, a field table or a constructor
//!   (see [`Projections`])

pub mod bean;
pub mod tuple;

use crate::error::{QueryError, QueryResult};
use crate::expr::{Aliased, Expression, Nullable, SqlType};
use crate::query::{FetchSlot, RowLayout, SelectTarget};
use crate::schema::{Entity, EntityPath, RowView};
use crate::value::{FromValue, Value};

pub use bean::{
    Assign, Bean, BeanProjection, Constructor, FieldTable, Fields, FieldsProjection, SetterTable,
};
pub use tuple::{IntoTargets, Tuple, TupleProjection};

/// A result shape.
pub trait Projection {
    type Output;

    /// Select targets, in the order `map_row` expects them.
    fn targets(&self) -> Vec<SelectTarget>;

    /// Number of select targets.
    fn width(&self) -> usize {
        self.targets().len()
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<Self::Output>;
}

/// One raw result row seen through the plan's layout.
///
/// Targets are addressed by index relative to the projection reading them.
#[derive(Debug, Clone, Copy)]
pub struct ResultRow<'r> {
    values: &'r [Value],
    layout: &'r RowLayout,
    targets: &'r [SelectTarget],
    first: usize,
}

impl<'r> ResultRow<'r> {
    pub fn new(values: &'r [Value], layout: &'r RowLayout, targets: &'r [SelectTarget]) -> Self {
        Self {
            values,
            layout,
            targets,
            first: 0,
        }
    }

    /// The same row with target indices shifted by `n`.
    pub fn shifted(&self, n: usize) -> Self {
        Self {
            first: self.first + n,
            ..*self
        }
    }

    /// Values of the `i`-th target.
    pub fn target(&self, i: usize) -> QueryResult<&'r [Value]> {
        let index = self.first + i;
        self.layout
            .targets
            .get(index)
            .and_then(|range| self.values.get(range.clone()))
            .ok_or_else(|| QueryError::MissingTarget(format!("select target #{index}")))
    }

    /// Label of the `i`-th target for error messages.
    pub fn label(&self, i: usize) -> String {
        let index = self.first + i;
        self.targets
            .get(index)
            .and_then(SelectTarget::name)
            .map_or_else(|| format!("#{index}"), str::to_owned)
    }

    /// The single value of the `i`-th target.
    pub fn value(&self, i: usize) -> QueryResult<&'r Value> {
        match self.target(i)? {
            [value] => Ok(value),
            _ => Err(QueryError::invalid(format!(
                "select target `{}` is not a single value",
                self.label(i)
            ))),
        }
    }

    /// The `i`-th target coerced to `T`.
    pub fn get<T: FromValue>(&self, i: usize) -> QueryResult<T> {
        let value = self.value(i)?.clone();
        T::from_value(value).map_err(|e| QueryError::mismatch(self.label(i), e))
    }

    /// Fetch-joined entities owned by `alias`, in join order.
    pub fn fetched(&self, alias: &'r str) -> impl Iterator<Item = (&'r FetchSlot, RowView<'r>)> {
        let values = self.values;
        self.layout
            .fetches
            .iter()
            .filter(move |slot| slot.owner == alias)
            .filter_map(move |slot| {
                values
                    .get(slot.range.clone())
                    .map(|v| (slot, RowView::new(slot.schema, v)))
            })
    }

    pub(crate) fn layout(&self) -> &'r RowLayout {
        self.layout
    }

    pub(crate) fn values(&self) -> &'r [Value] {
        self.values
    }
}

// =============================================================================
// Scalars
// =============================================================================

impl<T: SqlType> Projection for Expression<T> {
    type Output = T;

    fn targets(&self) -> Vec<SelectTarget> {
        vec![self.into()]
    }

    fn width(&self) -> usize {
        1
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<T> {
        row.get(0)
    }
}

impl<T: SqlType> Projection for Nullable<T> {
    type Output = Option<T>;

    fn targets(&self) -> Vec<SelectTarget> {
        vec![self.expression().into()]
    }

    fn width(&self) -> usize {
        1
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<Option<T>> {
        row.get(0)
    }
}

impl<T: SqlType> Projection for Aliased<T> {
    type Output = T;

    fn targets(&self) -> Vec<SelectTarget> {
        vec![self.clone().into()]
    }

    fn width(&self) -> usize {
        1
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<T> {
        row.get(0)
    }
}

// =============================================================================
// Entities
// =============================================================================

impl<E: Entity> Projection for EntityPath<E> {
    type Output = E;

    fn targets(&self) -> Vec<SelectTarget> {
        vec![self.into()]
    }

    fn width(&self) -> usize {
        1
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<E> {
        let view = RowView::new(E::schema(), row.target(0)?);
        let mut entity = E::from_row(&view)?;
        for (slot, related) in row.fetched(self.alias()) {
            entity.load_relation(slot.relation, &related)?;
        }
        Ok(entity)
    }
}

// =============================================================================
// Rust tuples
// =============================================================================

macro_rules! tuple_projection {
    ($($name:ident),+) => {
        impl<$($name: Projection),+> Projection for ($($name,)+) {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn targets(&self) -> Vec<SelectTarget> {
                let ($($name,)+) = self;
                let mut targets = Vec::new();
                $(targets.extend($name.targets());)+
                targets
            }

            #[allow(non_snake_case)]
            fn width(&self) -> usize {
                let ($($name,)+) = self;
                0 $(+ $name.width())+
            }

            #[allow(non_snake_case, unused_assignments)]
            fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<Self::Output> {
                let ($($name,)+) = self;
                let mut offset = 0;
                Ok(($({
                    let value = $name.map_row(&row.shifted(offset))?;
                    offset += $name.width();
                    value
                },)+))
            }
        }
    };
}

tuple_projection!(A);
tuple_projection!(A, B);
tuple_projection!(A, B, C);
tuple_projection!(A, B, C, D);
tuple_projection!(A, B, C, D, F);
tuple_projection!(A, B, C, D, F, G);
tuple_projection!(A, B, C, D, F, G, H);
tuple_projection!(A, B, C, D, F, G, H, I);

// =============================================================================
// Factory
// =============================================================================

/// Constructors for the DTO and tuple shapes.
pub struct Projections;

impl Projections {
    /// Heterogeneous tuple; values are read back by the selecting expression.
    pub fn tuple(targets: impl IntoTargets) -> TupleProjection {
        TupleProjection::new(targets.into_targets())
    }

    /// Default-construct `D`, then call the setter matching each target name.
    pub fn bean<D: Bean>(targets: impl IntoTargets) -> BeanProjection<D> {
        BeanProjection::new(targets.into_targets())
    }

    /// Default-construct `D`, then assign the field matching each target name.
    pub fn fields<D: Fields>(targets: impl IntoTargets) -> FieldsProjection<D> {
        FieldsProjection::new(targets.into_targets())
    }

    /// Build `D` from the positional values of `args`.
    ///
    /// There is no name matching: the order of `args` must equal the order
    /// of `D`'s constructor parameters. Swapping two targets of the same type
    /// silently swaps the fields.
    pub fn constructor<D, P>(args: P) -> Constructor<D, P>
    where
        P: Projection,
        D: From<P::Output>,
    {
        Constructor::new(args)
    }
}
