//! Embedded SQL storage behind a narrow trait.
//!
//! Modules never talk to rusqlite directly — they go through [`SQLStore`]
//! with positional [`Value`] parameters, so queries are always bound and
//! never interpolated.

pub mod error;
pub mod sqlite;

pub use error::SQLError;
pub use sqlite::SqliteStore;

/// A dynamically-typed SQL parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Convenience constructor for text params.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Encode a boolean the way the schema stores it (0/1).
    pub fn bool(b: bool) -> Self {
        Value::Integer(if b { 1 } else { 0 })
    }
}

/// A row returned from a query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            // SQLite is loose with numeric affinity.
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }
}

/// SQL execution interface backed by an embedded database.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute a batch of parameter-less statements (schema setup).
    fn exec_batch(&self, statements: &[&str]) -> Result<(), SQLError> {
        for stmt in statements {
            self.exec(stmt, &[])?;
        }
        Ok(())
    }
}
