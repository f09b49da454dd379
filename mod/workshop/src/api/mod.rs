mod ai;
mod cars;
mod operations;
mod reports;

use std::sync::Arc;

use axum::Router;

use crate::service::WorkshopService;

/// Shared application state for workshop handlers.
pub type AppState = Arc<WorkshopService>;

/// Build the complete workshop API router.
///
/// All routes are relative — the caller nests them under `/workshop`.
/// Authentication and the admin gate for car writes and operation
/// deletes are applied by the server binary's middleware, not here.
pub fn build_router(svc: Arc<WorkshopService>) -> Router {
    Router::new()
        .merge(cars::routes())
        .merge(operations::routes())
        .merge(reports::routes())
        .merge(ai::routes())
        .with_state(svc)
}
