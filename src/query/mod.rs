//! Query construction.
//!
//! - [`QueryBuilder`] - single-owner accumulator producing a [`QueryPlan`]
//! - [`SubQueryBuilder`] - nested single-value plans usable as expressions
//! - [`QueryFactory`] / [`Query`] - the fluent surface bound to a data source
//!
//! A plan is immutable once built. Validation runs in `build()`, so every
//! structural error surfaces before any I/O.

pub mod builder;
pub mod plan;
pub mod subquery;
pub mod typed;

mod validate;

pub use builder::QueryBuilder;
pub use plan::{
    FetchSlot, JoinClause, JoinKind, JoinRelation, QueryPlan, RowLayout, SelectExpr,
    SelectTarget,
};
pub use subquery::{SubQuery, SubQueryBuilder};
pub use typed::{Query, QueryFactory};
