//! Auth module — users, branches, JWT token issuance.
//!
//! # Resources
//!
//! - **User** — login identity with a role (`admin`/`employee`) and a
//!   branch affiliation
//! - **Branch** — a workshop location; users and operations reference it
//! - **Tokens** — short-lived access JWT + long-lived refresh JWT
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, AuthConfig::default())?;
//! let router = module.routes(); // Mount under /auth
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use motorlog_core::Module;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn motorlog_sql::SQLStore>,
        config: AuthConfig,
    ) -> Result<Self, motorlog_core::ServiceError> {
        let service = AuthService::new(sql, config).map_err(motorlog_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
