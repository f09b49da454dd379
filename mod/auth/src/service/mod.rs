pub mod branch;
pub mod schema;
pub mod token;
pub mod user;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use motorlog_sql::{SQLStore, Value};

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

impl From<AuthError> for motorlog_core::ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NotFound(m) => motorlog_core::ServiceError::NotFound(m),
            AuthError::Conflict(m) => motorlog_core::ServiceError::Conflict(m),
            AuthError::Validation(m) => motorlog_core::ServiceError::Validation(m),
            AuthError::Unauthorized(m) => motorlog_core::ServiceError::Unauthorized(m),
            AuthError::Storage(m) => motorlog_core::ServiceError::Storage(m),
            AuthError::Internal(m) => motorlog_core::ServiceError::Internal(m),
        }
    }
}

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 15 min).
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "motorlog-dev-secret-change-me".to_string(),
            access_ttl_secs: 900,      // 15 min
            refresh_ttl_secs: 604_800, // 7 days
        }
    }
}

/// The Auth service. Holds the SQL backend and configuration.
pub struct AuthService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService, initializing the DB schema.
    pub fn new(sql: Arc<dyn SQLStore>, config: AuthConfig) -> Result<Arc<Self>, AuthError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, config }))
    }

    /// Service configuration (read-only).
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ── Generic CRUD helpers (same pattern as WorkshopService) ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AuthError> {
        let json =
            serde_json::to_string(record).map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::text(id), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 3;
            cols.push(col);
            placeholders.push(format!("?{}", idx));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        self.sql.exec(&sql, &params).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                AuthError::Conflict(msg)
            } else {
                AuthError::Storage(msg)
            }
        })?;

        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, AuthError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self
            .sql
            .query(&sql, &[Value::text(id)])
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| AuthError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AuthError> {
        let json =
            serde_json::to_string(record).map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::text(id));

        let sql = format!("UPDATE {} SET {} WHERE id = ?{}", table, sets.join(", "), id_idx);

        let affected = self.sql.exec(&sql, &params).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                AuthError::Conflict(msg)
            } else {
                AuthError::Storage(msg)
            }
        })?;

        if affected == 0 {
            return Err(AuthError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }

    /// Delete a record by id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<(), AuthError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self
            .sql
            .exec(&sql, &[Value::text(id)])
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }

    /// List records with pagination, newest first.
    pub(crate) fn list_records<T: DeserializeOwned>(
        &self,
        table: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<T>, usize), AuthError> {
        let count_sql = format!("SELECT COUNT(*) as cnt FROM {}", table);
        let count_rows = self
            .sql
            .query(&count_sql, &[])
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let sql = format!(
            "SELECT data FROM {} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            table,
        );
        let rows = self
            .sql
            .query(
                &sql,
                &[Value::Integer(limit as i64), Value::Integer(offset as i64)],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
            let item: T =
                serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
            items.push(item);
        }

        Ok((items, total))
    }
}
