//! # Quarry
//!
//! A typed query-construction and execution engine for a relational domain
//! model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Entity schemas (Field / Relation handles)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [EntityPath::get]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Typed expressions (Expression<T>)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [QueryBuilder::build]
//! ┌─────────────────────────────────────────────────────────┐
//! │          QueryPlan (immutable, validated)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Executor + DataSource]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Rows ─▶ Projection (scalar, tuple, entity, DTO)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let db = Database::open_in_memory()?;
//! let source = db.source();
//! let query = QueryFactory::new(&source);
//!
//! let m = EntityPath::<Member>::new();
//! let t = EntityPath::<Team>::new();
//! let members = query
//!     .select_from(&m)
//!     .left_join(m.relation(Member::TEAM), &t)
//!     .filter(t.get(Team::NAME).eq("teamA"))
//!     .fetch()?;
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod expr;
pub mod projection;
pub mod query;
pub mod schema;
pub mod sql;
pub mod telemetry;
pub mod value;

pub use error::{QueryError, QueryResult};

/// Everything needed to declare entities and run queries.
pub mod prelude {
    pub use crate::config::{QuerySettings, Settings, SourceSettings};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::exec::{DataSource, Database, EntityStore, Executor, PagedResult, SqliteSource};
    pub use crate::expr::{
        count_all, literal, CaseBuilder, Expression, IntoExpression, OrderSpecifier, Predicate,
    };
    pub use crate::projection::{
        Bean, FieldTable, Fields, Projection, Projections, SetterTable, Tuple,
    };
    pub use crate::query::{Query, QueryBuilder, QueryFactory, QueryPlan, SubQuery, SubQueryBuilder};
    pub use crate::schema::{
        ColumnDef, Entity, EntityPath, EntitySchema, Field, Relation, RelationDef, RowView,
    };
    pub use crate::value::{FromValue, Value, ValueKind};
}
