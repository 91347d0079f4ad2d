//! DTO shapes: setter table, field table, constructor.
//!
//! Setter and field tables are matched against target names (the alias, or
//! the field name of a plain column) once, when the projection is created.
//! Rows then go straight through the resolved slots. Targets without a
//! matching slot are ignored; slots without a target keep their default.

use std::marker::PhantomData;

use super::{Projection, ResultRow};
use crate::error::{QueryError, QueryResult};
use crate::query::SelectTarget;
use crate::value::{CoerceError, FromValue, Value};

/// Resolve each target name against a slot table.
fn resolve<S: Copy>(targets: &[SelectTarget], slots: &[(&'static str, S)]) -> Vec<Option<S>> {
    targets
        .iter()
        .map(|target| {
            let name = match target {
                SelectTarget::Expr(_) => target.name()?,
                SelectTarget::Entity(_) => return None,
            };
            slots.iter().find(|(slot, _)| *slot == name).map(|(_, s)| *s)
        })
        .collect()
}

// =============================================================================
// Setters
// =============================================================================

type SetFn<D> = fn(&mut D, Value) -> Result<(), CoerceError>;
type FieldFn<D> = fn(&mut D) -> &mut dyn Assign;

/// Named setters of `D`, filled in by [`Bean::setters`].
pub struct SetterTable<D> {
    slots: Vec<(&'static str, SetFn<D>)>,
}

impl<D> SetterTable<D> {
    pub fn set(&mut self, name: &'static str, apply: SetFn<D>) -> &mut Self {
        self.slots.push((name, apply));
        self
    }
}

/// A DTO populated through setters.
pub trait Bean: Default + 'static {
    fn setters(table: &mut SetterTable<Self>);
}

/// Shape built by [`Projections::bean`](super::Projections::bean).
pub struct BeanProjection<D> {
    targets: Vec<SelectTarget>,
    bindings: Vec<Option<SetFn<D>>>,
}

impl<D: Bean> BeanProjection<D> {
    pub(crate) fn new(targets: Vec<SelectTarget>) -> Self {
        let mut table = SetterTable { slots: Vec::new() };
        D::setters(&mut table);
        let bindings = resolve(&targets, &table.slots);
        Self { targets, bindings }
    }
}

impl<D: Bean> Projection for BeanProjection<D> {
    type Output = D;

    fn targets(&self) -> Vec<SelectTarget> {
        self.targets.clone()
    }

    fn width(&self) -> usize {
        self.targets.len()
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<D> {
        let mut dto = D::default();
        for (i, binding) in self.bindings.iter().enumerate() {
            if let Some(apply) = binding {
                let value = row.value(i)?.clone();
                apply(&mut dto, value).map_err(|e| QueryError::mismatch(row.label(i), e))?;
            }
        }
        Ok(dto)
    }
}

// =============================================================================
// Fields
// =============================================================================

/// A field that can be overwritten from a raw value.
pub trait Assign {
    fn assign(&mut self, value: Value) -> Result<(), CoerceError>;
}

impl<T: FromValue> Assign for T {
    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

/// Named fields of `D`, filled in by [`Fields::fields`].
pub struct FieldTable<D> {
    slots: Vec<(&'static str, FieldFn<D>)>,
}

impl<D> FieldTable<D> {
    pub fn field(&mut self, name: &'static str, access: FieldFn<D>) -> &mut Self {
        self.slots.push((name, access));
        self
    }
}

/// A DTO populated by direct field assignment.
pub trait Fields: Default + 'static {
    fn fields(table: &mut FieldTable<Self>);
}

/// Shape built by [`Projections::fields`](super::Projections::fields).
pub struct FieldsProjection<D> {
    targets: Vec<SelectTarget>,
    bindings: Vec<Option<FieldFn<D>>>,
}

impl<D: Fields> FieldsProjection<D> {
    pub(crate) fn new(targets: Vec<SelectTarget>) -> Self {
        let mut table = FieldTable { slots: Vec::new() };
        D::fields(&mut table);
        let bindings = resolve(&targets, &table.slots);
        Self { targets, bindings }
    }
}

impl<D: Fields> Projection for FieldsProjection<D> {
    type Output = D;

    fn targets(&self) -> Vec<SelectTarget> {
        self.targets.clone()
    }

    fn width(&self) -> usize {
        self.targets.len()
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<D> {
        let mut dto = D::default();
        for (i, binding) in self.bindings.iter().enumerate() {
            if let Some(access) = binding {
                let value = row.value(i)?.clone();
                access(&mut dto)
                    .assign(value)
                    .map_err(|e| QueryError::mismatch(row.label(i), e))?;
            }
        }
        Ok(dto)
    }
}

// =============================================================================
// Constructor
// =============================================================================

/// Shape built by [`Projections::constructor`](super::Projections::constructor).
///
/// Positional only: `args` are mapped in order and handed to `D::from`.
pub struct Constructor<D, P> {
    args: P,
    _ty: PhantomData<fn() -> D>,
}

impl<D, P> Constructor<D, P> {
    pub(crate) fn new(args: P) -> Self {
        Self {
            args,
            _ty: PhantomData,
        }
    }
}

impl<D, P> Projection for Constructor<D, P>
where
    P: Projection,
    D: From<P::Output>,
{
    type Output = D;

    fn targets(&self) -> Vec<SelectTarget> {
        self.args.targets()
    }

    fn width(&self) -> usize {
        self.args.width()
    }

    fn map_row(&self, row: &ResultRow<'_>) -> QueryResult<D> {
        self.args.map_row(row).map(D::from)
    }
}
