//! Typed expressions.
//!
//! `Expression<T>` is an [`Expr`] tagged with the Rust type its value maps
//! to. Operators are only offered where the operand types agree, so a
//! `String` column cannot be compared with an integer or summed.

use std::fmt;
use std::marker::PhantomData;

use super::node::{AggregateFunc, BinaryOperator, CastType, Expr, UnaryOperator};
use super::order::{OrderSpecifier, SortDir};
use crate::value::{FromValue, Value};

/// Rust types a column or expression can evaluate to.
pub trait SqlType: FromValue + Into<Value> + Clone + 'static {}

impl SqlType for bool {}
impl SqlType for i32 {}
impl SqlType for i64 {}
impl SqlType for f64 {}
impl SqlType for String {}
impl SqlType for Vec<u8> {}

/// Types that support arithmetic and SUM/AVG.
pub trait Numeric: SqlType {
    /// Result type of SUM over this type. Integer sums are 64-bit.
    type Sum: Numeric;
}

impl Numeric for i32 {
    type Sum = i64;
}
impl Numeric for i64 {
    type Sum = i64;
}
impl Numeric for f64 {
    type Sum = f64;
}

/// An expression whose value maps to `T`.
pub struct Expression<T> {
    expr: Expr,
    _ty: PhantomData<fn() -> T>,
}

/// A boolean expression usable in WHERE, ON and HAVING.
pub type Predicate = Expression<bool>;

impl<T> Expression<T> {
    /// Wrap an untyped node. The caller vouches for the result type.
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _ty: PhantomData,
        }
    }

    pub fn as_expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Same node, different declared type.
    pub(crate) fn retype<R>(&self) -> Expression<R> {
        Expression::from_expr(self.expr.clone())
    }
}

// Manual impls: derives would demand `T: Clone` etc.
impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.expr).finish()
    }
}

impl<T> From<Expression<T>> for Expr {
    fn from(e: Expression<T>) -> Self {
        e.expr
    }
}

impl<T> From<&Expression<T>> for Expr {
    fn from(e: &Expression<T>) -> Self {
        e.expr.clone()
    }
}

// =============================================================================
// Conversions into expressions
// =============================================================================

/// Anything usable where an `Expression<T>` operand is expected.
///
/// Rust values become bound literals. Integer literals convert into every
/// numeric expression type so `age.eq(10)` works for `i32`, `i64` and `f64`
/// columns alike.
pub trait IntoExpression<T> {
    fn into_expression(self) -> Expression<T>;
}

impl<T> IntoExpression<T> for Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self
    }
}

impl<T> IntoExpression<T> for &Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self.clone()
    }
}

macro_rules! literal_into {
    ($($src:ty => $($dst:ty),+);+ $(;)?) => {
        $($(
            impl IntoExpression<$dst> for $src {
                fn into_expression(self) -> Expression<$dst> {
                    Expression::from_expr(Expr::Literal(Value::from(self)))
                }
            }
        )+)+
    };
}

literal_into! {
    i32 => i32, i64, f64;
    i64 => i64;
    f64 => f64;
    bool => bool;
    String => String;
    &str => String;
}

/// A bound literal of type `T`.
pub fn literal<T: SqlType>(value: T) -> Expression<T> {
    Expression::from_expr(Expr::Literal(value.into()))
}

fn operand<T>(e: impl IntoExpression<T>) -> Box<Expr> {
    Box::new(e.into_expression().into_expr())
}

// =============================================================================
// Operations on every expression
// =============================================================================

impl<T: SqlType> Expression<T> {
    fn binary<R>(&self, op: BinaryOperator, right: impl IntoExpression<T>) -> Expression<R> {
        Expression::from_expr(Expr::BinaryOp {
            left: Box::new(self.expr.clone()),
            op,
            right: operand(right),
        })
    }

    pub fn eq(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Eq, other)
    }

    pub fn ne(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Ne, other)
    }

    pub fn gt(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Gt, other)
    }

    pub fn gte(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Gte, other)
    }

    pub fn lt(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Lt, other)
    }

    pub fn lte(&self, other: impl IntoExpression<T>) -> Predicate {
        self.binary(BinaryOperator::Lte, other)
    }

    /// Inclusive range: `low <= self <= high`.
    pub fn between(&self, low: impl IntoExpression<T>, high: impl IntoExpression<T>) -> Predicate {
        self.between_impl(low, high, false)
    }

    pub fn not_between(
        &self,
        low: impl IntoExpression<T>,
        high: impl IntoExpression<T>,
    ) -> Predicate {
        self.between_impl(low, high, true)
    }

    fn between_impl(
        &self,
        low: impl IntoExpression<T>,
        high: impl IntoExpression<T>,
        negated: bool,
    ) -> Predicate {
        Expression::from_expr(Expr::Between {
            expr: Box::new(self.expr.clone()),
            low: operand(low),
            high: operand(high),
            negated,
        })
    }

    pub fn in_list<I>(&self, values: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        self.in_list_impl(values, false)
    }

    pub fn not_in<I>(&self, values: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        self.in_list_impl(values, true)
    }

    fn in_list_impl<I>(&self, values: I, negated: bool) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        Expression::from_expr(Expr::InList {
            expr: Box::new(self.expr.clone()),
            values: values
                .into_iter()
                .map(|v| v.into_expression().into_expr())
                .collect(),
            negated,
        })
    }

    pub fn is_null(&self) -> Predicate {
        Expression::from_expr(Expr::IsNull {
            expr: Box::new(self.expr.clone()),
            negated: false,
        })
    }

    pub fn is_not_null(&self) -> Predicate {
        Expression::from_expr(Expr::IsNull {
            expr: Box::new(self.expr.clone()),
            negated: true,
        })
    }

    /// COUNT(self); NULLs are not counted.
    pub fn count(&self) -> Expression<i64> {
        self.aggregate(AggregateFunc::Count, false)
    }

    pub fn count_distinct(&self) -> Expression<i64> {
        self.aggregate(AggregateFunc::Count, true)
    }

    pub fn max(&self) -> Expression<T> {
        self.aggregate(AggregateFunc::Max, false)
    }

    pub fn min(&self) -> Expression<T> {
        self.aggregate(AggregateFunc::Min, false)
    }

    fn aggregate<R>(&self, func: AggregateFunc, distinct: bool) -> Expression<R> {
        Expression::from_expr(Expr::Aggregate {
            func,
            arg: Some(Box::new(self.expr.clone())),
            distinct,
        })
    }

    /// The value rendered as text, `CAST(self AS TEXT)`.
    pub fn string_value(&self) -> Expression<String> {
        self.cast(CastType::Text)
    }

    fn cast<R>(&self, to: CastType) -> Expression<R> {
        Expression::from_expr(Expr::Cast {
            expr: Box::new(self.expr.clone()),
            to,
        })
    }

    /// First non-null of `self` and `fallback`.
    pub fn coalesce(&self, fallback: impl IntoExpression<T>) -> Expression<T> {
        Expression::from_expr(Expr::Function {
            name: "coalesce",
            args: vec![self.expr.clone(), *operand(fallback)],
        })
    }

    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.expr.clone(), SortDir::Asc)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.expr.clone(), SortDir::Desc)
    }

    /// Select this expression under a result alias.
    pub fn alias(&self, name: &str) -> Aliased<T> {
        Aliased {
            expr: self.clone(),
            name: name.to_owned(),
        }
    }

    /// Project this expression as `Option<T>` so NULL is not an error.
    pub fn nullable(&self) -> Nullable<T> {
        Nullable {
            expr: self.clone(),
        }
    }
}

// =============================================================================
// Numeric operations
// =============================================================================

impl<T: Numeric> Expression<T> {
    pub fn add(&self, other: impl IntoExpression<T>) -> Expression<T> {
        self.binary(BinaryOperator::Plus, other)
    }

    pub fn sub(&self, other: impl IntoExpression<T>) -> Expression<T> {
        self.binary(BinaryOperator::Minus, other)
    }

    pub fn mul(&self, other: impl IntoExpression<T>) -> Expression<T> {
        self.binary(BinaryOperator::Mul, other)
    }

    pub fn div(&self, other: impl IntoExpression<T>) -> Expression<T> {
        self.binary(BinaryOperator::Div, other)
    }

    pub fn neg(&self) -> Expression<T> {
        Expression::from_expr(Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: Box::new(self.expr.clone()),
        })
    }

    pub fn sum(&self) -> Expression<T::Sum> {
        self.aggregate(AggregateFunc::Sum, false)
    }

    pub fn avg(&self) -> Expression<f64> {
        self.aggregate(AggregateFunc::Avg, false)
    }

    /// `CAST(self AS REAL)`, for comparing with averages and other
    /// floating-point expressions.
    pub fn as_f64(&self) -> Expression<f64> {
        self.cast(CastType::Real)
    }
}

impl Expression<i32> {
    /// The same value typed as `i64`. SQLite integers are already 64-bit, so
    /// no cast is rendered.
    pub fn as_i64(&self) -> Expression<i64> {
        Expression::from_expr(self.expr.clone())
    }
}

// =============================================================================
// String operations
// =============================================================================

impl Expression<String> {
    pub fn like(&self, pattern: impl IntoExpression<String>) -> Predicate {
        self.binary(BinaryOperator::Like, pattern)
    }

    /// `LIKE '%needle%'`. `%` and `_` in `needle` keep their wildcard meaning.
    pub fn contains(&self, needle: &str) -> Predicate {
        self.like(format!("%{needle}%"))
    }

    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like(format!("{prefix}%"))
    }

    pub fn lower(&self) -> Expression<String> {
        self.function("lower")
    }

    pub fn upper(&self) -> Expression<String> {
        self.function("upper")
    }

    pub fn length(&self) -> Expression<i32> {
        self.function("length")
    }

    fn function<R>(&self, name: &'static str) -> Expression<R> {
        Expression::from_expr(Expr::Function {
            name,
            args: vec![self.expr.clone()],
        })
    }

    /// `self || other`. Chained calls flatten into one concatenation.
    pub fn concat(&self, other: impl IntoExpression<String>) -> Expression<String> {
        let mut parts = match &self.expr {
            Expr::Concat(parts) => parts.clone(),
            single => vec![single.clone()],
        };
        parts.push(other.into_expression().into_expr());
        Expression::from_expr(Expr::Concat(parts))
    }
}

// =============================================================================
// Boolean operations
// =============================================================================

impl Expression<bool> {
    pub fn and(&self, other: impl IntoExpression<bool>) -> Predicate {
        self.binary(BinaryOperator::And, other)
    }

    pub fn or(&self, other: impl IntoExpression<bool>) -> Predicate {
        self.binary(BinaryOperator::Or, other)
    }

    pub fn not(&self) -> Predicate {
        Expression::from_expr(Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(self.expr.clone()),
        })
    }

    /// AND all predicates together; `None` when there are none.
    pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(|acc, p| acc.and(p))
    }
}

/// `COUNT(*)`
pub fn count_all() -> Expression<i64> {
    Expression::from_expr(Expr::Aggregate {
        func: AggregateFunc::Count,
        arg: None,
        distinct: false,
    })
}

// =============================================================================
// Select-target wrappers
// =============================================================================

/// An expression selected under a result alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Aliased<T> {
    pub(crate) expr: Expression<T>,
    pub(crate) name: String,
}

impl<T> Aliased<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &Expression<T> {
        &self.expr
    }
}

/// An expression projected as `Option<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Nullable<T> {
    pub(crate) expr: Expression<T>,
}

impl<T> Nullable<T> {
    pub fn expression(&self) -> &Expression<T> {
        &self.expr
    }
}
