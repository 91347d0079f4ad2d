//! Plan execution and result materialization.

use tracing::{debug, instrument, warn};

use super::DataSource;
use crate::config::QuerySettings;
use crate::error::{QueryError, QueryResult};
use crate::projection::{Projection, ResultRow, Tuple, TupleProjection};
use crate::query::QueryPlan;
use crate::sql::NativeQuery;
use crate::value::Value;

/// A page of results plus the number of rows matching without paging.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub results: Vec<T>,
    /// Matching rows ignoring offset and limit.
    pub total: i64,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl<T> PagedResult<T> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs plans against a [`DataSource`].
///
/// Every terminal either returns the complete result or an error; there are
/// no partial results and no retries.
pub struct Executor<'s, S: ?Sized> {
    source: &'s S,
    settings: QuerySettings,
}

impl<'s, S: DataSource + ?Sized> Executor<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self::with_settings(source, QuerySettings::default())
    }

    pub fn with_settings(source: &'s S, settings: QuerySettings) -> Self {
        Self { source, settings }
    }

    /// Native text and parameters for `plan`.
    pub fn render(&self, plan: &QueryPlan) -> NativeQuery {
        let dialect = self.source.dialect();
        plan.to_tokens(dialect).serialize(dialect)
    }

    /// Native text and parameters counting the rows `plan` matches.
    pub fn render_count(&self, plan: &QueryPlan) -> NativeQuery {
        let dialect = self.source.dialect();
        plan.count_tokens(dialect).serialize(dialect)
    }

    fn log(&self, native: &NativeQuery) {
        if self.settings.log_sql {
            debug!(sql = %native.sql, params = native.params.len(), "executing query");
        } else {
            debug!(params = native.params.len(), "executing query");
        }
    }

    /// Run `plan` and return the raw rows.
    #[instrument(skip_all, fields(dialect = self.source.dialect().name()))]
    pub fn fetch_rows(&self, plan: &QueryPlan) -> QueryResult<Vec<Vec<Value>>> {
        let native = self.render(plan);
        self.log(&native);

        let rows = self.source.execute(&native).map_err(|e| {
            warn!(error = %e, "query failed");
            QueryError::execution(&native.sql, e)
        })?;

        let width = plan.layout().width;
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            let msg = format!("expected {width} columns, got {}", bad.len());
            warn!(error = %msg, "unexpected row shape");
            return Err(QueryError::execution(&native.sql, msg));
        }

        debug!(rows = rows.len(), "query complete");
        Ok(rows)
    }

    /// Run `plan` and map every row through `projection`.
    ///
    /// No matching rows is an empty vector, not an error.
    pub fn fetch<P: Projection>(
        &self,
        plan: &QueryPlan,
        projection: &P,
    ) -> QueryResult<Vec<P::Output>> {
        let rows = self.fetch_rows(plan)?;
        let layout = plan.layout();
        rows.iter()
            .map(|values| projection.map_row(&ResultRow::new(values, &layout, plan.select())))
            .collect()
    }

    /// Run `plan` and read each row as a [`Tuple`] of its select targets.
    pub fn fetch_tuples(&self, plan: &QueryPlan) -> QueryResult<Vec<Tuple>> {
        let shape = TupleProjection::new(plan.select().to_vec());
        self.fetch(plan, &shape)
    }

    /// Exactly one result, `None` for no rows, `NonUniqueResult` for more.
    #[instrument(skip_all)]
    pub fn fetch_one<P: Projection>(
        &self,
        plan: &QueryPlan,
        projection: &P,
    ) -> QueryResult<Option<P::Output>> {
        // Two rows are enough to tell "one" from "many".
        let capped_limit = plan.limit().map_or(2, |l| l.min(2));
        let capped = plan.with_page(plan.offset(), Some(capped_limit));
        let mut results = self.fetch(&capped, projection)?;
        if results.len() > 1 {
            return Err(QueryError::NonUniqueResult {
                count: results.len(),
            });
        }
        Ok(results.pop())
    }

    /// The first result under the plan's ordering.
    #[instrument(skip_all)]
    pub fn fetch_first<P: Projection>(
        &self,
        plan: &QueryPlan,
        projection: &P,
    ) -> QueryResult<Option<P::Output>> {
        let first = plan.with_page(plan.offset(), Some(1));
        Ok(self.fetch(&first, projection)?.into_iter().next())
    }

    /// Number of rows `plan` matches, ignoring its projection, order and paging.
    #[instrument(skip_all, fields(dialect = self.source.dialect().name()))]
    pub fn fetch_count(&self, plan: &QueryPlan) -> QueryResult<i64> {
        let native = self.render_count(plan);
        self.log(&native);
        self.source.execute_count(&native).map_err(|e| {
            warn!(error = %e, "count query failed");
            QueryError::execution(&native.sql, e)
        })
    }

    /// The current page plus the unpaged total.
    pub fn fetch_results<P: Projection>(
        &self,
        plan: &QueryPlan,
        projection: &P,
    ) -> QueryResult<PagedResult<P::Output>> {
        let results = self.fetch(plan, projection)?;
        let total = self.fetch_count(plan)?;
        Ok(PagedResult {
            results,
            total,
            offset: plan.offset().unwrap_or(0),
            limit: plan.limit(),
        })
    }
}
