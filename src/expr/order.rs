//! ORDER BY entries.

use super::node::Expr;
use crate::sql::dialect::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// NULLS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// One ORDER BY entry: expression, direction and optional null placement.
///
/// Null placement is independent of the direction: `desc().nulls_last()` and
/// `asc().nulls_last()` both put absent keys at the end.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderSpecifier {
    pub expr: Expr,
    pub dir: SortDir,
    pub nulls: Option<NullsOrder>,
}

impl OrderSpecifier {
    pub fn new(expr: Expr, dir: SortDir) -> Self {
        Self {
            expr,
            dir,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    /// Convert to tokens for a specific dialect.
    ///
    /// Dialects without NULLS FIRST/LAST get a leading `CASE WHEN x IS NULL`
    /// sort key instead.
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(nulls) = self.nulls {
            if !dialect.supports_nulls_ordering() {
                let (null_rank, other_rank) = match nulls {
                    NullsOrder::First => (0, 1),
                    NullsOrder::Last => (1, 0),
                };
                let is_null = Expr::IsNull {
                    expr: Box::new(self.expr.clone()),
                    negated: false,
                };
                ts.push(Token::Case)
                    .space()
                    .push(Token::When)
                    .space()
                    .append(&is_null.to_tokens(dialect))
                    .space()
                    .push(Token::Then)
                    .space()
                    .push(Token::LitInt(null_rank))
                    .space()
                    .push(Token::Else)
                    .space()
                    .push(Token::LitInt(other_rank))
                    .space()
                    .push(Token::End)
                    .comma()
                    .space();
            }
        }

        ts.append(&self.expr.to_tokens(dialect));
        ts.space().push(match self.dir {
            SortDir::Asc => Token::Asc,
            SortDir::Desc => Token::Desc,
        });

        if let Some(nulls) = self.nulls {
            if dialect.supports_nulls_ordering() {
                ts.space().push(match nulls {
                    NullsOrder::First => Token::NullsFirst,
                    NullsOrder::Last => Token::NullsLast,
                });
            }
        }

        ts
    }
}
