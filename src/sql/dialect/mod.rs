//! SQL dialect definitions and formatting rules.
//!
//! A data source describes its native query text through `SqlDialect`:
//! identifier quoting, parameter placeholders, pagination and ORDER BY null
//! placement. The crate ships one implementation, [`Sqlite`].

mod sqlite;

pub use sqlite::Sqlite;

use super::token::{Token, TokenStream};
use crate::expr::CastType;

/// SQL dialect trait - defines how plan constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String {
        quote_double(ident)
    }

    /// Placeholder text for the `index`-th bound parameter (1-based).
    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    /// String concatenation operator.
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Type name used as the target of a CAST.
    fn cast_type(&self, to: CastType) -> &'static str {
        match to {
            CastType::Text => "TEXT",
            CastType::Integer => "BIGINT",
            CastType::Real => "DOUBLE PRECISION",
        }
    }

    /// Whether this dialect supports NULLS FIRST/LAST in ORDER BY.
    ///
    /// When it does not, the renderer emits an extra `CASE WHEN x IS NULL`
    /// sort key in front of the expression.
    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// Default: `LIMIT n OFFSET m`, each part only when present.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(lim) = limit {
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(clamp(lim)));
        }

        if let Some(off) = offset {
            if limit.is_some() {
                ts.space();
            }
            ts.push(Token::Offset)
                .space()
                .push(Token::LitInt(clamp(off)));
        }

        ts
    }
}

/// Quote identifier with double quotes (ANSI style).
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
