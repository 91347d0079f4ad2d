//! Expression AST - the untyped core every typed expression wraps.
//!
//! Nodes are plain values: cloning and comparing them is structural, which is
//! what tuple lookup "by the original expression" relies on.

use crate::query::QueryPlan;
use crate::sql::dialect::SqlDialect;
use crate::sql::token::{Token, TokenStream};
use crate::value::Value;

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column of an aliased entity: alias.column. `field` is the schema name.
    Column {
        alias: String,
        column: &'static str,
        field: &'static str,
    },

    /// Literal value, bound as a statement parameter.
    Literal(Value),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// Aggregate call. `arg: None` is `COUNT(*)`.
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<Expr>>,
        distinct: bool,
    },

    /// Scalar function call: name(args...)
    Function { name: &'static str, args: Vec<Expr> },

    /// CASE [operand] WHEN... THEN... ELSE... END
    ///
    /// Branches are evaluated in order; the first match wins.
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// a || b || ...
    Concat(Vec<Expr>),

    /// CAST(expr AS <type>)
    Cast { expr: Box<Expr>, to: CastType },

    /// Scalar sub-query: (SELECT ...)
    SubQuery(Box<QueryPlan>),

    /// IN: expr IN (values...)
    InList {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// IN subquery: expr IN (SELECT ...)
    InSubQuery {
        expr: Box<Expr>,
        subquery: Box<QueryPlan>,
        negated: bool,
    },

    /// [NOT] EXISTS (SELECT ...)
    Exists {
        subquery: Box<QueryPlan>,
        negated: bool,
    },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    // String
    Like,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// Target type of a CAST. The dialect spells the type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Text,
    Integer,
    Real,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFunc {
    fn name(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Min => "MIN",
        }
    }
}

// =============================================================================
// Traversal
// =============================================================================

impl Expr {
    /// Visit this node and every descendant expression, depth first.
    ///
    /// Nested query plans are not entered; reach them with [`Expr::subquery`].
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::Column { .. } | Expr::Literal(_) | Expr::SubQuery(_) | Expr::Exists { .. } => {}
            Expr::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::UnaryOp { expr, .. } | Expr::Cast { expr, .. } | Expr::IsNull { expr, .. } => {
                expr.walk(visit)
            }
            Expr::Aggregate { arg, .. } => {
                if let Some(arg) = arg {
                    arg.walk(visit);
                }
            }
            Expr::Function { args, .. } | Expr::Concat(args) => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(op) = operand {
                    op.walk(visit);
                }
                for (when, then) in when_clauses {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(e) = else_clause {
                    e.walk(visit);
                }
            }
            Expr::InList { expr, values, .. } => {
                expr.walk(visit);
                for v in values {
                    v.walk(visit);
                }
            }
            Expr::InSubQuery { expr, .. } => expr.walk(visit),
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
        }
    }

    /// The nested plan carried by this node, if any.
    pub fn subquery(&self) -> Option<&QueryPlan> {
        match self {
            Expr::SubQuery(plan)
            | Expr::InSubQuery { subquery: plan, .. }
            | Expr::Exists { subquery: plan, .. } => Some(plan),
            _ => None,
        }
    }

    /// Whether an aggregate appears in this expression outside sub-queries.
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Expr::Aggregate { .. }) {
                found = true;
            }
        });
        found
    }

    fn needs_parens(&self) -> bool {
        matches!(
            self,
            Expr::BinaryOp { .. }
                | Expr::UnaryOp { .. }
                | Expr::Concat(_)
                | Expr::InList { .. }
                | Expr::InSubQuery { .. }
                | Expr::Between { .. }
                | Expr::IsNull { .. }
        )
    }
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream.
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { alias, column, .. } => {
                ts.push(Token::Ident(alias.clone()))
                    .push(Token::Dot)
                    .push(Token::Ident((*column).into()));
            }

            Expr::Literal(value) => {
                ts.push(Token::Param(value.clone()));
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.operand_tokens(dialect));
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                ts.append(&right.operand_tokens(dialect));
            }

            Expr::UnaryOp { op, expr } => {
                match op {
                    UnaryOperator::Not => ts.push(Token::Not).space(),
                    UnaryOperator::Minus => ts.push(Token::Minus),
                };
                ts.append(&expr.operand_tokens(dialect));
            }

            Expr::Aggregate {
                func,
                arg,
                distinct,
            } => {
                ts.push(Token::FunctionName(func.name().into()));
                ts.lparen();
                match arg {
                    Some(arg) => {
                        if *distinct {
                            ts.push(Token::Distinct).space();
                        }
                        ts.append(&arg.to_tokens(dialect));
                    }
                    None => {
                        ts.push(Token::Star);
                    }
                }
                ts.rparen();
            }

            Expr::Function { name, args } => {
                ts.push(Token::FunctionName((*name).into()));
                ts.lparen();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens(dialect));
                }
                ts.rparen();
            }

            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                if let Some(op) = operand {
                    ts.space().append(&op.operand_tokens(dialect));
                }
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens(dialect));
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens(dialect));
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens(dialect));
                }
                ts.space().push(Token::End);
            }

            Expr::Concat(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        ts.space().push(Token::Concat).space();
                    }
                    ts.append(&part.operand_tokens(dialect));
                }
            }

            Expr::Cast { expr, to } => {
                ts.push(Token::Cast).lparen();
                ts.append(&expr.to_tokens(dialect));
                ts.space()
                    .push(Token::As)
                    .space()
                    .push(Token::TypeName(dialect.cast_type(*to)));
                ts.rparen();
            }

            Expr::SubQuery(plan) => {
                ts.lparen();
                ts.append(&plan.to_tokens(dialect));
                ts.rparen();
            }

            Expr::InList {
                expr,
                values,
                negated,
            } => {
                // Empty IN list: "x IN ()" is invalid SQL
                // "x IN ()" should be FALSE, "x NOT IN ()" should be TRUE
                if values.is_empty() {
                    ts.push(if *negated { Token::True } else { Token::False });
                } else {
                    ts.append(&expr.operand_tokens(dialect));
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    ts.space().push(Token::In).space().lparen();
                    for (i, val) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&val.to_tokens(dialect));
                    }
                    ts.rparen();
                }
            }

            Expr::InSubQuery {
                expr,
                subquery,
                negated,
            } => {
                ts.append(&expr.operand_tokens(dialect));
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::In).space().lparen();
                ts.append(&subquery.to_tokens(dialect));
                ts.rparen();
            }

            Expr::Exists { subquery, negated } => {
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Exists).space().lparen();
                ts.append(&subquery.to_tokens(dialect));
                ts.rparen();
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                ts.append(&expr.operand_tokens(dialect));
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::Between).space();
                ts.append(&low.operand_tokens(dialect));
                ts.space().push(Token::And).space();
                ts.append(&high.operand_tokens(dialect));
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.operand_tokens(dialect));
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }
        }

        ts
    }

    /// Tokens for this node used as an operand, parenthesized when compound.
    fn operand_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        if !self.needs_parens() {
            return self.to_tokens(dialect);
        }
        let mut ts = TokenStream::new();
        ts.lparen().append(&self.to_tokens(dialect)).rparen();
        ts
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::Like => Token::Like,
    }
}
