//! Expression model.
//!
//! - [`node`] - the untyped [`Expr`] tree and its SQL rendering
//! - [`typed`] - [`Expression<T>`] and the operators offered per type
//! - [`case`] - searched and simple CASE builders
//! - [`order`] - ORDER BY entries
//!
//! Expressions are immutable values. Every operator returns a new tree and
//! leaves its operands as they were.

pub mod case;
pub mod node;
pub mod order;
pub mod typed;

pub use case::CaseBuilder;
pub use node::{AggregateFunc, BinaryOperator, CastType, Expr, UnaryOperator};
pub use order::{NullsOrder, OrderSpecifier, SortDir};
pub use typed::{
    count_all, literal, Aliased, Expression, IntoExpression, Nullable, Numeric, Predicate,
    SqlType,
};
