//! Nested queries usable inside expressions.
//!
//! A sub-query selects exactly one value of type `T`. It renders into the
//! outer statement's text, so correlated and uncorrelated sub-queries run in
//! the same round trip as the query that contains them.

use std::marker::PhantomData;

use super::builder::QueryBuilder;
use super::plan::QueryPlan;
use super::validate;
use crate::error::QueryResult;
use crate::expr::{Aliased, Expr, Expression, IntoExpression, OrderSpecifier, Predicate, SqlType};
use crate::schema::{Entity, EntityPath, RelationPath};

/// Builder for a [`SubQuery`] selecting one `T`.
#[derive(Debug)]
#[must_use = "builders have no effect until built"]
pub struct SubQueryBuilder<T> {
    inner: QueryBuilder,
    _ty: PhantomData<fn() -> T>,
}

impl<T: SqlType> SubQueryBuilder<T> {
    pub fn select(expr: Expression<T>) -> Self {
        Self {
            inner: QueryBuilder::new().select(expr),
            _ty: PhantomData,
        }
    }

    fn map(self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        Self {
            inner: f(self.inner),
            _ty: PhantomData,
        }
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

    /// Freeze the sub-query.
    ///
    /// Alias and scope rules are enforced when the enclosing query is built.
    pub fn build(self) -> QueryResult<SubQuery<T>> {
        let plan = self.inner.assemble()?;
        validate::check_subquery_shape(&plan)?;
        Ok(SubQuery {
            plan: Box::new(plan),
            _ty: PhantomData,
        })
    }
}

/// A frozen sub-query yielding one `T` per row.
#[derive(Debug)]
pub struct SubQuery<T> {
    plan: Box<QueryPlan>,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for SubQuery<T> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T: SqlType> SubQuery<T> {
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// The scalar value of this sub-query, `(SELECT ...)`.
    pub fn as_expression(&self) -> Expression<T> {
        Expression::from_expr(Expr::SubQuery(self.plan.clone()))
    }

    /// Select the sub-query's value under a result alias.
    pub fn alias(&self, name: &str) -> Aliased<T> {
        self.as_expression().alias(name)
    }

    pub fn exists(&self) -> Predicate {
        Expression::from_expr(Expr::Exists {
            subquery: self.plan.clone(),
            negated: false,
        })
    }

    pub fn not_exists(&self) -> Predicate {
        Expression::from_expr(Expr::Exists {
            subquery: self.plan.clone(),
            negated: true,
        })
    }
}

impl<T: SqlType> IntoExpression<T> for SubQuery<T> {
    fn into_expression(self) -> Expression<T> {
        Expression::from_expr(Expr::SubQuery(self.plan))
    }
}

impl<T: SqlType> IntoExpression<T> for &SubQuery<T> {
    fn into_expression(self) -> Expression<T> {
        self.as_expression()
    }
}

impl<T: SqlType> Expression<T> {
    /// `self IN (SELECT ...)`
    pub fn in_subquery(&self, subquery: &SubQuery<T>) -> Predicate {
        self.in_subquery_impl(subquery, false)
    }

    pub fn not_in_subquery(&self, subquery: &SubQuery<T>) -> Predicate {
        self.in_subquery_impl(subquery, true)
    }

    fn in_subquery_impl(&self, subquery: &SubQuery<T>, negated: bool) -> Predicate {
        Expression::from_expr(Expr::InSubQuery {
            expr: Box::new(self.as_expr().clone()),
            subquery: subquery.plan.clone(),
            negated,
        })
    }
}
