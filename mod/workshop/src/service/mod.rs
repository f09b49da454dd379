pub mod ai;
pub mod car;
pub mod compare;
pub mod export;
pub mod intake;
pub mod operation;
pub mod report;
pub mod schema;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use motorlog_sql::{SQLStore, Value};

use crate::service::ai::{Advisor, AdvisorConfig};

/// Workshop service error type.
#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

impl From<WorkshopError> for motorlog_core::ServiceError {
    fn from(e: WorkshopError) -> Self {
        match e {
            WorkshopError::NotFound(m) => motorlog_core::ServiceError::NotFound(m),
            WorkshopError::Conflict(m) => motorlog_core::ServiceError::Conflict(m),
            WorkshopError::Validation(m) => motorlog_core::ServiceError::Validation(m),
            WorkshopError::Storage(m) => motorlog_core::ServiceError::Storage(m),
            WorkshopError::Internal(m) => motorlog_core::ServiceError::Internal(m),
        }
    }
}

/// The Workshop service. Holds the SQL backend and the AI advisor.
pub struct WorkshopService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) advisor: Advisor,
}

impl WorkshopService {
    /// Create a new WorkshopService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        advisor: AdvisorConfig,
    ) -> Result<Arc<Self>, WorkshopError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            advisor: Advisor::new(advisor),
        }))
    }

    // ── Generic CRUD helpers (same pattern as AuthService) ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), WorkshopError> {
        let json =
            serde_json::to_string(record).map_err(|e| WorkshopError::Internal(e.to_string()))?;

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
                WorkshopError::Conflict(msg)
            } else {
                WorkshopError::Storage(msg)
            }
        })?;

        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, WorkshopError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self
            .sql
            .query(&sql, &[Value::text(id)])
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| WorkshopError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| WorkshopError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| WorkshopError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), WorkshopError> {
        let json =
            serde_json::to_string(record).map_err(|e| WorkshopError::Internal(e.to_string()))?;

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
                WorkshopError::Conflict(msg)
            } else {
                WorkshopError::Storage(msg)
            }
        })?;

        if affected == 0 {
            return Err(WorkshopError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }

    /// Delete a record by id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<(), WorkshopError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self
            .sql
            .exec(&sql, &[Value::text(id)])
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(WorkshopError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }
}
