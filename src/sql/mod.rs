//! SQL text generation.
//!
//! - [`token`] - token types and the stream serializer
//! - [`dialect`] - how the data source spells its native query text
//!
//! Expressions and plans turn themselves into a [`TokenStream`]; serializing
//! the stream yields a [`NativeQuery`].

pub mod dialect;
pub mod token;

#[cfg(test)]
pub mod test_utils;

use std::fmt;

pub use dialect::{SqlDialect, Sqlite};
pub use token::{Token, TokenStream};

use crate::value::Value;

/// Query text in the data source's dialect plus its bound parameters.
///
/// Rendering is deterministic: the same plan always produces the same text
/// and the same parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for NativeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
