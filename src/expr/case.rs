//! CASE expressions.
//!
//! Searched form:
//!
//! ```ignore
//! CaseBuilder::new()
//!     .when(age.between(0, 20)).then("0~20")
//!     .when(age.between(21, 30)).then("21~30")
//!     .otherwise("other")
//! ```
//!
//! Simple form starts from the operand: `age.when(10).then("ten").otherwise("other")`.
//! Branches keep declaration order; the first match wins.

use std::marker::PhantomData;

use super::node::Expr;
use super::typed::{Expression, IntoExpression, Predicate, SqlType};

type Branches = Vec<(Expr, Expr)>;

fn finish<R>(operand: Option<Expr>, branches: Branches, default: Option<Expr>) -> Expression<R> {
    Expression::from_expr(Expr::Case {
        operand: operand.map(Box::new),
        when_clauses: branches,
        else_clause: default.map(Box::new),
    })
}

// =============================================================================
// Searched CASE
// =============================================================================

/// Entry point for a searched `CASE WHEN cond THEN ...`.
#[derive(Debug, Default)]
pub struct CaseBuilder;

impl CaseBuilder {
    pub fn new() -> Self {
        CaseBuilder
    }

    pub fn when(self, condition: Predicate) -> CaseWhen {
        CaseWhen {
            condition: condition.into_expr(),
        }
    }
}

/// First WHEN awaiting its THEN; the THEN fixes the result type.
#[derive(Debug)]
#[must_use = "a CASE branch needs a THEN"]
pub struct CaseWhen {
    condition: Expr,
}

impl CaseWhen {
    pub fn then<R: SqlType>(self, result: impl IntoExpression<R>) -> Cases<R> {
        Cases {
            branches: vec![(self.condition, result.into_expression().into_expr())],
            _ty: PhantomData,
        }
    }
}

/// Searched CASE with at least one branch.
#[derive(Debug)]
#[must_use = "finish the CASE with otherwise() or end()"]
pub struct Cases<R> {
    branches: Branches,
    _ty: PhantomData<fn() -> R>,
}

impl<R: SqlType> Cases<R> {
    pub fn when(self, condition: Predicate) -> CasesWhen<R> {
        CasesWhen {
            cases: self,
            condition: condition.into_expr(),
        }
    }

    pub fn otherwise(self, default: impl IntoExpression<R>) -> Expression<R> {
        finish(None, self.branches, Some(default.into_expression().into_expr()))
    }

    /// No ELSE: unmatched rows evaluate to NULL.
    pub fn end(self) -> Expression<R> {
        finish(None, self.branches, None)
    }
}

#[derive(Debug)]
#[must_use = "a CASE branch needs a THEN"]
pub struct CasesWhen<R> {
    cases: Cases<R>,
    condition: Expr,
}

impl<R: SqlType> CasesWhen<R> {
    pub fn then(mut self, result: impl IntoExpression<R>) -> Cases<R> {
        self.cases
            .branches
            .push((self.condition, result.into_expression().into_expr()));
        self.cases
    }
}

// =============================================================================
// Simple CASE
// =============================================================================

impl<T: SqlType> Expression<T> {
    /// Start a simple `CASE self WHEN value THEN ...`.
    pub fn when(&self, value: impl IntoExpression<T>) -> SimpleCaseWhen<T> {
        SimpleCaseWhen {
            operand: self.as_expr().clone(),
            value: value.into_expression().into_expr(),
            _ty: PhantomData,
        }
    }
}

#[derive(Debug)]
#[must_use = "a CASE branch needs a THEN"]
pub struct SimpleCaseWhen<T> {
    operand: Expr,
    value: Expr,
    _ty: PhantomData<fn() -> T>,
}

impl<T: SqlType> SimpleCaseWhen<T> {
    pub fn then<R: SqlType>(self, result: impl IntoExpression<R>) -> SimpleCase<T, R> {
        SimpleCase {
            operand: self.operand,
            branches: vec![(self.value, result.into_expression().into_expr())],
            _ty: PhantomData,
        }
    }
}

/// Simple CASE over an operand of type `T` yielding `R`.
#[derive(Debug)]
#[must_use = "finish the CASE with otherwise() or end()"]
pub struct SimpleCase<T, R> {
    operand: Expr,
    branches: Branches,
    _ty: PhantomData<fn() -> (T, R)>,
}

impl<T: SqlType, R: SqlType> SimpleCase<T, R> {
    pub fn when(self, value: impl IntoExpression<T>) -> SimpleCasesWhen<T, R> {
        SimpleCasesWhen {
            value: value.into_expression().into_expr(),
            case: self,
        }
    }

    pub fn otherwise(self, default: impl IntoExpression<R>) -> Expression<R> {
        finish(
            Some(self.operand),
            self.branches,
            Some(default.into_expression().into_expr()),
        )
    }

    pub fn end(self) -> Expression<R> {
        finish(Some(self.operand), self.branches, None)
    }
}

#[derive(Debug)]
#[must_use = "a CASE branch needs a THEN"]
pub struct SimpleCasesWhen<T, R> {
    case: SimpleCase<T, R>,
    value: Expr,
}

impl<T: SqlType, R: SqlType> SimpleCasesWhen<T, R> {
    pub fn then(mut self, result: impl IntoExpression<R>) -> SimpleCase<T, R> {
        self.case
            .branches
            .push((self.value, result.into_expression().into_expr()));
        self.case
    }
}
