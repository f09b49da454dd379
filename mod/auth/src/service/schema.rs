use motorlog_sql::SQLStore;

use crate::service::AuthError;

/// Initialize the SQLite schema for auth resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), AuthError> {
    let statements = [
        // Branches: workshop locations
        "CREATE TABLE IF NOT EXISTS branches (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            location TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        // Users: login identities
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            branch_id TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
        "CREATE INDEX IF NOT EXISTS idx_users_branch ON users(branch_id)",
    ];

    sql.exec_batch(&statements)
        .map_err(|e| AuthError::Storage(e.to_string()))
}
