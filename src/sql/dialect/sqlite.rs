//! SQLite SQL dialect.
//!
//! SQLite specifics:
//! - ANSI identifier quoting (`"`)
//! - Numbered `?N` placeholders
//! - OFFSET is only legal after LIMIT; `LIMIT -1` means "no cap"
//! - NULLS FIRST/LAST supported since 3.30

use super::{clamp, SqlDialect};
use crate::expr::CastType;
use crate::sql::token::{Token, TokenStream};

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn cast_type(&self, to: CastType) -> &'static str {
        match to {
            CastType::Text => "TEXT",
            CastType::Integer => "INTEGER",
            CastType::Real => "REAL",
        }
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();
        if limit.is_none() && offset.is_none() {
            return ts;
        }

        ts.push(Token::Limit).space();
        match limit {
            Some(lim) => ts.push(Token::LitInt(clamp(lim))),
            None => ts.push(Token::LitInt(-1)),
        };

        if let Some(off) = offset {
            ts.space()
                .push(Token::Offset)
                .space()
                .push(Token::LitInt(clamp(off)));
        }

        ts
    }
}
