use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::error::SQLError;
use crate::{Row, SQLStore, Value};

/// SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Open(e.to_string()))?;

        // WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Open(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory().map_err(|e| SQLError::Open(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Open(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self.conn.lock().map_err(|_| SQLError::Poisoned)?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn.prepare(sql).map_err(|e| SQLError::statement(sql, e))?;

        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    columns.push((name.clone(), value_at(row, i)));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::statement(sql, e))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::statement(sql, e))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self.conn.lock().map_err(|_| SQLError::Poisoned)?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::statement(sql, e))?;

        Ok(affected as u64)
    }
}

/// Extract a Value by inspecting the stored column type directly.
fn value_at(row: &rusqlite::Row, idx: usize) -> Value {
    match row.get_ref(idx) {
        Ok(ValueRef::Integer(i)) => Value::Integer(i),
        Ok(ValueRef::Real(f)) => Value::Real(f),
        Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec("CREATE TABLE t (id TEXT PRIMARY KEY, n INTEGER, q REAL)", &[])
            .unwrap();
        store
            .exec(
                "INSERT INTO t (id, n, q) VALUES (?1, ?2, ?3)",
                &[Value::text("a"), Value::Integer(7), Value::Real(4.5)],
            )
            .unwrap();

        let rows = store
            .query("SELECT * FROM t WHERE id = ?1", &[Value::text("a")])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("id"), Some("a"));
        assert_eq!(rows[0].get_i64("n"), Some(7));
        assert_eq!(rows[0].get_f64("q"), Some(4.5));
    }

    #[test]
    fn integer_column_reads_as_f64() {
        let store = SqliteStore::open_in_memory().unwrap();
        // No declared affinity, so the integer is stored as an integer
        // and get_f64 has to coerce it.
        store.exec("CREATE TABLE t (q)", &[]).unwrap();
        store
            .exec("INSERT INTO t (q) VALUES (?1)", &[Value::Integer(4)])
            .unwrap();
        let rows = store.query("SELECT q FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_i64("q"), Some(4));
        assert_eq!(rows[0].get_f64("q"), Some(4.0));
    }

    #[test]
    fn exec_batch_runs_all() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec_batch(&[
                "CREATE TABLE a (id TEXT)",
                "CREATE TABLE b (id TEXT)",
            ])
            .unwrap();
        assert!(store.query("SELECT * FROM a", &[]).unwrap().is_empty());
        assert!(store.query("SELECT * FROM b", &[]).unwrap().is_empty());
    }
}
