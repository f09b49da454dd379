use thiserror::Error;

/// Storage-layer failure.
///
/// Statement errors carry the SQL that failed so callers don't have to
/// re-attach it when they wrap the error.
#[derive(Error, Debug)]
pub enum SQLError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("statement failed [{sql}]: {message}")]
    Statement { sql: String, message: String },
}

impl SQLError {
    /// Wrap a driver error together with the statement that triggered it.
    /// The SQL is whitespace-collapsed and truncated to keep log lines
    /// readable.
    pub fn statement(sql: &str, err: impl std::fmt::Display) -> Self {
        const MAX_SQL: usize = 120;

        let mut sql = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        if sql.len() > MAX_SQL {
            let mut cut = MAX_SQL;
            while !sql.is_char_boundary(cut) {
                cut -= 1;
            }
            sql.truncate(cut);
            sql.push('…');
        }

        SQLError::Statement {
            sql,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_error_carries_sql() {
        let err = SQLError::statement("SELECT *\n  FROM t", "no such table: t");
        assert_eq!(
            err.to_string(),
            "statement failed [SELECT * FROM t]: no such table: t"
        );
    }

    #[test]
    fn long_sql_is_truncated() {
        let sql = format!("SELECT {} FROM t", "x, ".repeat(100));
        let err = SQLError::statement(&sql, "boom");
        let text = err.to_string();
        assert!(text.len() < sql.len());
        assert!(text.contains('…'));
    }
}
