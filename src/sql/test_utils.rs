//! Test utilities for SQL emission validation.
//!
//! Parses emitted SQL with sqlparser-rs so every rendering test also proves
//! the text is syntactically valid SQLite.

use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Validates that a SQL string is syntactically valid SQLite.
pub fn validate_sql(sql: &str) -> Result<(), String> {
    Parser::parse_sql(&SQLiteDialect {}, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for sqlite: {}\nSQL: {}", e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM \"member\" AS \"m\" WHERE \"m\".\"age\" = ?1").unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM member");
        assert!(result.is_err());
    }
}
