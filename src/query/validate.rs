//! Plan validation, run by every `build()` before any I/O.
//!
//! Rules:
//! - aliases are unique within a query and the queries enclosing it; sibling
//!   sub-queries may reuse an alias
//! - columns only reference aliases in scope; a sub-query also sees the
//!   aliases of the queries enclosing it, and a join's condition sees only
//!   the aliases declared before it
//! - aggregates never appear in WHERE, GROUP BY or join conditions
//! - a sub-query selects exactly one value
//! - a fetch join follows a relation whose owner is a selected entity

use super::plan::{QueryPlan, SelectTarget};
use crate::error::{QueryError, QueryResult};
use crate::expr::Expr;

/// Validate a top-level plan.
pub(crate) fn validate(plan: &QueryPlan) -> QueryResult<()> {
    check_plan(plan, &[])
}

/// Structural checks for a plan used as a sub-query.
///
/// Scope rules are checked once the enclosing query is built, since a
/// correlated sub-query references aliases it does not declare.
pub(crate) fn check_subquery_shape(plan: &QueryPlan) -> QueryResult<()> {
    match plan.select() {
        [SelectTarget::Expr(_)] => {}
        [SelectTarget::Entity(entity)] => {
            return Err(QueryError::invalid(format!(
                "sub-query must select a single value, not entity `{}`",
                entity.alias
            )))
        }
        targets => {
            return Err(QueryError::invalid(format!(
                "sub-query must select exactly one value, found {}",
                targets.len()
            )))
        }
    }
    if plan.joins().iter().any(|j| j.fetch) {
        return Err(QueryError::invalid("fetch join inside a sub-query"));
    }
    Ok(())
}

/// Add `alias` to `scope`, which holds every alias visible at this point:
/// the enclosing queries' and the ones declared earlier in this query.
fn declare(alias: &str, scope: &mut Vec<String>) -> QueryResult<()> {
    if scope.iter().any(|a| a == alias) {
        return Err(QueryError::DuplicateAlias {
            alias: alias.to_owned(),
        });
    }
    scope.push(alias.to_owned());
    Ok(())
}

fn check_plan(plan: &QueryPlan, outer: &[String]) -> QueryResult<()> {
    let mut scope: Vec<String> = outer.to_vec();

    declare(&plan.from().alias, &mut scope)?;

    for join in plan.joins() {
        if let Some(rel) = &join.relation {
            if !scope.contains(&rel.owner.alias) {
                return Err(QueryError::invalid(format!(
                    "join `{}` follows relation `{}` of `{}`, which is not joined before it",
                    join.target.alias, rel.name, rel.owner.alias
                )));
            }
        }
        declare(&join.target.alias, &mut scope)?;

        if let Some(on) = &join.on {
            if on.contains_aggregate() {
                return Err(QueryError::invalid(format!(
                    "aggregate in the ON clause of join `{}`",
                    join.target.alias
                )));
            }
            check_expr(on, &scope)?;
        }

        if join.fetch {
            let Some(rel) = &join.relation else {
                return Err(QueryError::invalid(format!(
                    "fetch join of `{}` needs a relation",
                    join.target.alias
                )));
            };
            let owner_selected = plan.select().iter().any(|t| {
                matches!(t, SelectTarget::Entity(e) if e.alias == rel.owner.alias)
            });
            if !owner_selected {
                return Err(QueryError::invalid(format!(
                    "fetch join `{}` is owned by `{}`, which is not selected as an entity",
                    rel.name, rel.owner.alias
                )));
            }
        }
    }

    for target in plan.select() {
        if let SelectTarget::Expr(select) = target {
            check_expr(&select.expr, &scope)?;
        }
    }

    for predicate in plan.predicates() {
        if predicate.contains_aggregate() {
            return Err(QueryError::invalid(
                "aggregate in WHERE; filter aggregates with having()",
            ));
        }
        check_expr(predicate, &scope)?;
    }

    for expr in plan.group_by() {
        if expr.contains_aggregate() {
            return Err(QueryError::invalid("aggregate in GROUP BY"));
        }
        check_expr(expr, &scope)?;
    }

    for expr in plan.having() {
        check_expr(expr, &scope)?;
    }

    for order in plan.order_by() {
        check_expr(&order.expr, &scope)?;
    }

    Ok(())
}

fn check_expr(expr: &Expr, scope: &[String]) -> QueryResult<()> {
    let mut unknown = None;
    let mut nested = Vec::new();
    expr.walk(&mut |node| {
        if let Expr::Column { alias, column, .. } = node {
            if unknown.is_none() && !scope.contains(alias) {
                unknown = Some(format!("{alias}.{column}"));
            }
        }
        if let Some(plan) = node.subquery() {
            nested.push(plan);
        }
    });

    if let Some(column) = unknown {
        return Err(QueryError::invalid(format!(
            "column `{column}` references an alias that is not in scope"
        )));
    }

    for plan in nested {
        check_subquery_shape(plan)?;
        check_plan(plan, scope)?;
    }
    Ok(())
}
