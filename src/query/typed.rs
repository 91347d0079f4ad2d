//! Fluent queries bound to a data source and a result shape.
//!
//! ```ignore
//! let db = Database::open_in_memory()?;
//! let source = db.source();
//! let factory = QueryFactory::new(&source);
//!
//! let m = EntityPath::<Member>::new();
//! let names: Vec<String> = factory
//!     .select(m.get(Member::USERNAME))
//!     .from(&m)
//!     .filter(m.get(Member::AGE).gt(18))
//!     .order_by(m.get(Member::USERNAME).asc())
//!     .fetch()?;
//! ```

use super::builder::QueryBuilder;
use super::plan::QueryPlan;
use crate::config::QuerySettings;
use crate::error::QueryResult;
use crate::exec::{DataSource, Executor, PagedResult};
use crate::expr::{Expr, OrderSpecifier, Predicate};
use crate::projection::Projection;
use crate::schema::{Entity, EntityPath, RelationPath};

/// Entry point for typed queries against one data source.
#[derive(Debug)]
pub struct QueryFactory<'s, S: ?Sized> {
    source: &'s S,
    settings: QuerySettings,
}

impl<'s, S: DataSource + ?Sized> QueryFactory<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self::with_settings(source, QuerySettings::default())
    }

    pub fn with_settings(source: &'s S, settings: QuerySettings) -> Self {
        Self { source, settings }
    }

    /// Start a query whose rows map through `projection`.
    pub fn select<P: Projection>(&self, projection: P) -> Query<'s, S, P> {
        let builder = QueryBuilder::new().select_all(projection.targets());
        Query {
            source: self.source,
            settings: self.settings.clone(),
            projection,
            builder,
        }
    }

    /// Select whole `E` rows from `path`.
    pub fn select_from<E: Entity>(&self, path: &EntityPath<E>) -> Query<'s, S, EntityPath<E>> {
        self.select(path.clone()).from(path)
    }
}

/// A query under construction, carrying its projection.
#[derive(Debug)]
#[must_use = "queries do nothing until fetched"]
pub struct Query<'s, S: ?Sized, P> {
    source: &'s S,
    settings: QuerySettings,
    projection: P,
    builder: QueryBuilder,
}

impl<'s, S: DataSource + ?Sized, P: Projection> Query<'s, S, P> {
    fn map(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    pub fn distinct(self) -> Self {
        self.map(QueryBuilder::distinct)
    }

    pub fn from<E: Entity>(self, path: &EntityPath<E>) -> Self {
        self.map(|b| b.from(path))
    }

    pub fn join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.map(|b| b.join(relation, target))
    }

    pub fn inner_join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.map(|b| b.inner_join(relation, target))
    }

    pub fn left_join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.map(|b| b.left_join(relation, target))
    }

    pub fn join_entity<R: Entity>(self, target: &EntityPath<R>) -> Self {
        self.map(|b| b.join_entity(target))
    }

    pub fn left_join_entity<R: Entity>(self, target: &EntityPath<R>) -> Self {
        self.map(|b| b.left_join_entity(target))
    }

    pub fn on(self, predicate: Predicate) -> Self {
        self.map(|b| b.on(predicate))
    }

    pub fn fetch_join(self) -> Self {
        self.map(QueryBuilder::fetch_join)
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        self.map(|b| b.filter(predicate))
    }

    pub fn filter_all(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.map(|b| b.filter_all(predicates))
    }

    pub fn group_by(self, expr: impl Into<Expr>) -> Self {
        self.map(|b| b.group_by(expr))
    }

    pub fn having(self, predicate: Predicate) -> Self {
        self.map(|b| b.having(predicate))
    }

    pub fn order_by(self, order: OrderSpecifier) -> Self {
        self.map(|b| b.order_by(order))
    }

    pub fn offset(self, n: u64) -> Self {
        self.map(|b| b.offset(n))
    }

    pub fn limit(self, n: u64) -> Self {
        self.map(|b| b.limit(n))
    }

    /// Freeze the query into a validated plan.
    pub fn build(self) -> QueryResult<QueryPlan> {
        self.builder.build()
    }

    /// Plan plus the executor and projection to run it with.
    fn prepare(self) -> QueryResult<(QueryPlan, Executor<'s, S>, P)> {
        let plan = self.builder.build()?;
        let executor = Executor::with_settings(self.source, self.settings);
        Ok((plan, executor, self.projection))
    }

    pub fn fetch(self) -> QueryResult<Vec<P::Output>> {
        let (plan, executor, projection) = self.prepare()?;
        executor.fetch(&plan, &projection)
    }

    pub fn fetch_one(self) -> QueryResult<Option<P::Output>> {
        let (plan, executor, projection) = self.prepare()?;
        executor.fetch_one(&plan, &projection)
    }

    pub fn fetch_first(self) -> QueryResult<Option<P::Output>> {
        let (plan, executor, projection) = self.prepare()?;
        executor.fetch_first(&plan, &projection)
    }

    pub fn fetch_count(self) -> QueryResult<i64> {
        let (plan, executor, _) = self.prepare()?;
        executor.fetch_count(&plan)
    }

    pub fn fetch_results(self) -> QueryResult<PagedResult<P::Output>> {
        let (plan, executor, projection) = self.prepare()?;
        executor.fetch_results(&plan, &projection)
    }
}
