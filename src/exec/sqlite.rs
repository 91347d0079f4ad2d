//! SQLite-backed data source.
//!
//! [`SqliteSource`] borrows a connection (or an open transaction) and runs
//! rendered queries through rusqlite's prepared statement cache. [`Database`]
//! owns the connection, applies [`SourceSettings`] and draws the
//! transactional boundary.

use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use super::{DataSource, Executor};
use crate::config::{SettingsError, SourceSettings};
use crate::error::{QueryError, QueryResult, SourceError};
use crate::query::QueryBuilder;
use crate::schema::{Entity, EntityPath};
use crate::sql::{NativeQuery, Sqlite, SqlDialect};
use crate::value::{Value, ValueKind};

/// Errors opening a [`Database`].
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Native;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Native::Null),
            Value::Int(i) => ToSqlOutput::Owned(Native::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(Native::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(Native::Integer(i64::from(*b))),
            Value::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        })
    }
}

/// SQLite has no boolean storage class; booleans come back as integers and
/// [`FromValue`](crate::value::FromValue) widens them.
///
/// Text that is not valid UTF-8 is an error, never replaced.
fn read_value(cell: ValueRef<'_>) -> Result<Value, SourceError> {
    Ok(match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(_) => Value::Text(cell.as_str()?.to_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

/// A [`DataSource`] over one borrowed SQLite connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Run a statement that returns no rows.
    fn run(&self, sql: &str, params: &[Value]) -> QueryResult<usize> {
        debug!(sql = %sql, params = params.len(), "executing statement");
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| QueryError::execution(sql, e))?;
        stmt.execute(params_from_iter(params.iter()))
            .map_err(|e| {
                warn!(error = %e, "statement failed");
                QueryError::execution(sql, e)
            })
    }
}

impl DataSource for SqliteSource<'_> {
    fn dialect(&self) -> &dyn SqlDialect {
        &Sqlite
    }

    fn execute(&self, query: &NativeQuery) -> Result<Vec<Vec<Value>>, SourceError> {
        let mut stmt = self.conn.prepare_cached(&query.sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(read_value(row.get_ref(i)?)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    fn execute_count(&self, query: &NativeQuery) -> Result<i64, SourceError> {
        let mut stmt = self.conn.prepare_cached(&query.sql)?;
        let count = stmt.query_row(params_from_iter(query.params.iter()), |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(count)
    }
}

// =============================================================================
// Fixture store
// =============================================================================

/// Table creation, insertion and key lookup for entity fixtures.
pub trait EntityStore {
    /// Create `E`'s table if it does not exist yet.
    fn create_table<E: Entity>(&self) -> QueryResult<()>;

    /// Insert `entity` and write the assigned key back into it.
    fn persist<E: Entity>(&self, entity: &mut E) -> QueryResult<i64>;

    fn find_by_key<E: Entity>(&self, key: i64) -> QueryResult<Option<E>>;
}

fn column_type(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int | ValueKind::Bool => "INTEGER",
        ValueKind::Float => "REAL",
        ValueKind::Text => "TEXT",
        ValueKind::Blob => "BLOB",
        ValueKind::Null => "",
    }
}

fn create_table_sql(dialect: &dyn SqlDialect, schema: &crate::schema::EntitySchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let mut def = dialect.quote_identifier(col.column);
            if col.column == schema.primary_key {
                def.push_str(" INTEGER PRIMARY KEY");
                return def;
            }
            let ty = column_type(col.kind);
            if !ty.is_empty() {
                def.push(' ');
                def.push_str(ty);
            }
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote_identifier(schema.table),
        columns.join(", ")
    )
}

fn insert_sql(dialect: &dyn SqlDialect, schema: &crate::schema::EntitySchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| dialect.quote_identifier(c.column))
        .collect();
    let placeholders: Vec<String> = (1..=schema.columns.len())
        .map(|i| dialect.placeholder(i))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_identifier(schema.table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

impl EntityStore for SqliteSource<'_> {
    fn create_table<E: Entity>(&self) -> QueryResult<()> {
        let sql = create_table_sql(self.dialect(), E::schema());
        self.run(&sql, &[])?;
        Ok(())
    }

    fn persist<E: Entity>(&self, entity: &mut E) -> QueryResult<i64> {
        let schema = E::schema();
        let values = entity.to_values();
        if values.len() != schema.columns.len() {
            return Err(QueryError::invalid(format!(
                "{} produced {} values for {} columns",
                schema.name,
                values.len(),
                schema.columns.len()
            )));
        }

        // A null key lets SQLite assign the rowid.
        let sql = insert_sql(self.dialect(), schema);
        self.run(&sql, &values)?;

        let key = self.conn.last_insert_rowid();
        entity.set_key(key);
        Ok(key)
    }

    fn find_by_key<E: Entity>(&self, key: i64) -> QueryResult<Option<E>> {
        let path = EntityPath::<E>::new();
        let plan = QueryBuilder::new()
            .select(&path)
            .from(&path)
            .filter(path.key().eq(key))
            .build()?;
        Executor::new(self).fetch_one(&plan, &path)
    }
}

// =============================================================================
// Database
// =============================================================================

/// An owned SQLite connection configured from [`SourceSettings`].
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database named by `settings.path`.
    pub fn open(settings: &SourceSettings) -> Result<Self, DatabaseError> {
        let conn = if settings.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(settings.resolved_path()?)?
        };

        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", settings.foreign_keys)?;

        debug!(path = %settings.path, "opened database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database with default settings.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::open(&SourceSettings::default())
    }

    pub fn source(&self) -> SqliteSource<'_> {
        SqliteSource::new(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `work` inside a transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    pub fn transaction<T, F>(&mut self, work: F) -> QueryResult<T>
    where
        F: FnOnce(&SqliteSource<'_>) -> QueryResult<T>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| QueryError::execution("BEGIN", e))?;

        let result = work(&SqliteSource::new(&tx));
        match result {
            Ok(value) => {
                tx.commit().map_err(|e| QueryError::execution("COMMIT", e))?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "rolling back transaction");
                tx.rollback()
                    .map_err(|e| QueryError::execution("ROLLBACK", e))?;
                Err(err)
            }
        }
    }
}
