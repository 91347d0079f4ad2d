//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are backend-agnostic; a [`SqlDialect`] decides how identifiers,
//! placeholders and pagination are spelled when the stream is serialized.

use super::dialect::SqlDialect;
use super::NativeQuery;
use crate::value::Value;

/// SQL Token - every element a read query can contain.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    Distinct,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,
    Left,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    NullsFirst,
    NullsLast,
    Limit,
    Offset,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Between,
    Like,
    IsNull,
    IsNotNull,
    Exists,
    Cast,
    True,
    False,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,

    // === Whitespace / Formatting ===
    Space,
    Newline,

    // === Dynamic Content ===
    /// Identifier (table, column, alias), quoted by the dialect.
    Ident(String),
    /// Inline integer, only used for LIMIT/OFFSET and sort-key emulation.
    LitInt(i64),
    /// Bound parameter; serialized as a numbered placeholder.
    Param(Value),
    /// Function name, rendered upper-case.
    FunctionName(String),
    /// Type name inside CAST.
    TypeName(&'static str),
}

impl Token {
    /// Serialize this token for the given dialect.
    ///
    /// `Param` has no text of its own; [`TokenStream::serialize`] numbers it.
    pub fn serialize(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::Not => "NOT".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::NullsFirst => "NULLS FIRST".into(),
            Token::NullsLast => "NULLS LAST".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::In => "IN".into(),
            Token::Between => "BETWEEN".into(),
            Token::Like => "LIKE".into(),
            Token::IsNull => "IS NULL".into(),
            Token::IsNotNull => "IS NOT NULL".into(),
            Token::Exists => "EXISTS".into(),
            Token::Cast => "CAST".into(),
            Token::True => "TRUE".into(),
            Token::False => "FALSE".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),
            Token::Mod => "%".into(),
            Token::Concat => dialect.concat_operator().into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),

            // Dynamic
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::Param(_) => String::new(),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::TypeName(name) => (*name).into(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize to SQL text plus the parameters in placeholder order.
    ///
    /// Placeholders are numbered in the order they appear in the text, so
    /// the same stream always yields the same statement.
    pub fn serialize(&self, dialect: &dyn SqlDialect) -> NativeQuery {
        let mut sql = String::new();
        let mut params = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Param(value) => {
                    params.push(value.clone());
                    sql.push_str(&dialect.placeholder(params.len()));
                }
                other => sql.push_str(&other.serialize(dialect)),
            }
        }
        NativeQuery { sql, params }
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
