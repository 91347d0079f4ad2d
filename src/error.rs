//! Error types for building and executing queries.

use crate::value::{CoerceError, ValueKind};

/// Boxed failure reported by a data source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building, executing or mapping a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Two entity paths in one plan (sub-queries included) share an alias.
    #[error("duplicate alias `{alias}` in query plan")]
    DuplicateAlias { alias: String },

    /// A result column could not be coerced into the projected type.
    #[error("column `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ValueKind,
    },

    /// `fetch_one` matched more than one row.
    #[error("query returned more than one row (got at least {count})")]
    NonUniqueResult { count: usize },

    /// The data source failed to run the statement. Never retried.
    #[error("query execution failed: {source}\nSQL: {sql}")]
    Execution {
        sql: String,
        #[source]
        source: SourceError,
    },

    /// The builder was used in a way that cannot produce a valid plan.
    #[error("invalid query plan: {0}")]
    InvalidPlan(String),

    /// A row or tuple was asked for something that was never selected.
    #[error("`{0}` is not part of the selected columns")]
    MissingTarget(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        QueryError::InvalidPlan(msg.into())
    }

    pub(crate) fn mismatch(column: impl Into<String>, err: CoerceError) -> Self {
        QueryError::TypeMismatch {
            column: column.into(),
            expected: err.expected,
            found: err.found,
        }
    }

    pub(crate) fn execution(sql: &str, source: impl Into<SourceError>) -> Self {
        QueryError::Execution {
            sql: sql.to_owned(),
            source: source.into(),
        }
    }
}
