//! Query execution.
//!
//! - [`DataSource`] - the external store a rendered query runs against
//! - [`Executor`] - renders plans, runs them and maps rows through a projection
//! - [`sqlite`] - the rusqlite-backed source, fixture store and transactions

pub mod executor;
pub mod sqlite;

pub use executor::{Executor, PagedResult};
pub use sqlite::{Database, EntityStore, SqliteSource};

use crate::error::SourceError;
use crate::sql::{NativeQuery, SqlDialect};
use crate::value::Value;

/// A relational store that runs native query text.
///
/// Sub-queries arrive inline in the text; the source runs the whole statement
/// in one call. Retries, timeouts and cancellation are the source's business.
pub trait DataSource {
    /// How this source spells its native query text.
    fn dialect(&self) -> &dyn SqlDialect;

    /// Run a query and return every row, each with one value per column.
    fn execute(&self, query: &NativeQuery) -> Result<Vec<Vec<Value>>, SourceError>;

    /// Run a query whose single row holds a count.
    fn execute_count(&self, query: &NativeQuery) -> Result<i64, SourceError>;
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn dialect(&self) -> &dyn SqlDialect {
        (**self).dialect()
    }

    fn execute(&self, query: &NativeQuery) -> Result<Vec<Vec<Value>>, SourceError> {
        (**self).execute(query)
    }

    fn execute_count(&self, query: &NativeQuery) -> Result<i64, SourceError> {
        (**self).execute_count(query)
    }
}
