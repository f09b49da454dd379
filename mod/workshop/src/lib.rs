//! Workshop module — oil-spec reference table, operations log, reports.
//!
//! # Resources
//!
//! - **Car** — reference row mapping (brand, model, year range, engine)
//!   to the recommended oil spec
//! - **Operation** — a logged maintenance or inquiry event; the audit
//!   trail, append-mostly
//! - **Reports** — aggregate stats, trend series, CSV/XLSX export
//! - **AI advisor** — optional remote recommendation/comparison with a
//!   deterministic local fallback
//!
//! # Usage
//!
//! ```ignore
//! use workshop::{WorkshopModule, service::ai::AdvisorConfig};
//!
//! let module = WorkshopModule::new(sql, AdvisorConfig::default())?;
//! let router = module.routes(); // Mount under /workshop
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use motorlog_core::Module;

use crate::service::WorkshopService;
use crate::service::ai::AdvisorConfig;

/// Workshop module implementing the Module trait.
pub struct WorkshopModule {
    service: Arc<WorkshopService>,
}

impl WorkshopModule {
    /// Create a new WorkshopModule, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn motorlog_sql::SQLStore>,
        advisor: AdvisorConfig,
    ) -> Result<Self, motorlog_core::ServiceError> {
        let service =
            WorkshopService::new(sql, advisor).map_err(motorlog_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying WorkshopService.
    pub fn service(&self) -> &Arc<WorkshopService> {
        &self.service
    }
}

impl Module for WorkshopModule {
    fn name(&self) -> &str {
        "workshop"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
