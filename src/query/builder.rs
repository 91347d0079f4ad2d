//! Fluent accumulator that produces a [`QueryPlan`].

use super::plan::{JoinClause, JoinKind, JoinRelation, QueryPlan, SelectTarget};
use super::validate;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, OrderSpecifier, Predicate};
use crate::schema::{Entity, EntityPath, EntityRef, RelationPath};

/// Single-owner query builder.
///
/// Every step consumes the builder and returns it; [`build`](Self::build)
/// consumes it for good and hands out the validated plan. Misuse that can
/// only be detected mid-chain (`on` before any join, a second `from`) is
/// remembered and reported by `build`.
#[derive(Debug, Default)]
#[must_use = "builders have no effect until built"]
pub struct QueryBuilder {
    select: Vec<SelectTarget>,
    distinct: bool,
    from: Option<EntityRef>,
    joins: Vec<JoinClause>,
    predicates: Vec<Expr>,
    group_by: Vec<Expr>,
    having: Vec<Expr>,
    order_by: Vec<OrderSpecifier>,
    offset: Option<u64>,
    limit: Option<u64>,
    error: Option<QueryError>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(mut self, msg: impl Into<String>) -> Self {
        if self.error.is_none() {
            self.error = Some(QueryError::invalid(msg));
        }
        self
    }

    /// Append a select target.
    pub fn select(mut self, target: impl Into<SelectTarget>) -> Self {
        self.select.push(target.into());
        self
    }

    /// Append several select targets, keeping their order.
    pub fn select_all(mut self, targets: impl IntoIterator<Item = SelectTarget>) -> Self {
        self.select.extend(targets);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the driving entity. Required exactly once.
    pub fn from<E: Entity>(mut self, path: &EntityPath<E>) -> Self {
        if let Some(existing) = &self.from {
            let msg = format!(
                "from() called twice (`{}` then `{}`)",
                existing.alias,
                path.alias()
            );
            return self.fail(msg);
        }
        self.from = Some(path.entity_ref());
        self
    }

    fn push_join(
        mut self,
        kind: JoinKind,
        relation: Option<JoinRelation>,
        target: EntityRef,
    ) -> Self {
        self.joins.push(JoinClause {
            kind,
            target,
            relation,
            on: None,
            fetch: false,
        });
        self
    }

    fn relation_join<R: Entity>(
        self,
        kind: JoinKind,
        relation: RelationPath<R>,
        target: &EntityPath<R>,
    ) -> Self {
        let rel = JoinRelation {
            owner: relation.owner,
            name: relation.name,
            local_column: relation.local_column,
            target_column: relation.target_column,
        };
        self.push_join(kind, Some(rel), target.entity_ref())
    }

    /// INNER JOIN along a relation.
    pub fn join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.inner_join(relation, target)
    }

    pub fn inner_join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.relation_join(JoinKind::Inner, relation, target)
    }

    pub fn left_join<R: Entity>(self, relation: RelationPath<R>, target: &EntityPath<R>) -> Self {
        self.relation_join(JoinKind::Left, relation, target)
    }

    /// INNER JOIN of an unrelated entity; give the condition with [`on`](Self::on).
    pub fn join_entity<R: Entity>(self, target: &EntityPath<R>) -> Self {
        self.push_join(JoinKind::Inner, None, target.entity_ref())
    }

    /// LEFT JOIN of an unrelated entity, matched purely on the ON predicate.
    pub fn left_join_entity<R: Entity>(self, target: &EntityPath<R>) -> Self {
        self.push_join(JoinKind::Left, None, target.entity_ref())
    }

    /// Add a condition to the most recent join, AND-ed with its relation.
    pub fn on(mut self, predicate: Predicate) -> Self {
        if self.joins.is_empty() {
            return self.fail("on() called before any join");
        }
        if let Some(join) = self.joins.last_mut() {
            let predicate = predicate.into_expr();
            join.on = Some(match join.on.take() {
                Some(existing) => super::plan::and(existing, predicate),
                None => predicate,
            });
        }
        self
    }

    /// Mark the most recent join to load the related entity eagerly.
    pub fn fetch_join(mut self) -> Self {
        if self.joins.is_empty() {
            return self.fail("fetch_join() called before any join");
        }
        if let Some(join) = self.joins.last_mut() {
            join.fetch = true;
        }
        self
    }

    /// Add a WHERE predicate; repeated calls are AND-ed.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate.into_expr());
        self
    }

    /// Add several WHERE predicates, AND-ed.
    pub fn filter_all(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates
            .extend(predicates.into_iter().map(Predicate::into_expr));
        self
    }

    pub fn group_by(mut self, expr: impl Into<Expr>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    /// Add a HAVING predicate; repeated calls are AND-ed.
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate.into_expr());
        self
    }

    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.order_by.push(order);
        self
    }

    /// Skip the first `n` rows. Without a limit, every remaining row is returned.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Assemble the plan without the scope checks a top-level query needs.
    pub(crate) fn assemble(self) -> QueryResult<QueryPlan> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let from = self
            .from
            .ok_or_else(|| QueryError::invalid("from() was never called"))?;

        let select = if self.select.is_empty() {
            vec![SelectTarget::Entity(from.clone())]
        } else {
            self.select
        };

        Ok(QueryPlan {
            select,
            distinct: self.distinct,
            from,
            joins: self.joins,
            predicates: self.predicates,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
        })
    }

    /// Validate and freeze the plan.
    pub fn build(self) -> QueryResult<QueryPlan> {
        let plan = self.assemble()?;
        validate::validate(&plan)?;
        Ok(plan)
    }
}
