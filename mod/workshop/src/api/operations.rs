use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use motorlog_core::{Actor, ServiceError};

use crate::api::AppState;
use crate::model::{OperationFilter, SubmitOperation};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/operations", get(list_operations).post(submit_operation))
        .route(
            "/operations/{id}",
            get(get_operation).delete(delete_operation),
        )
}

async fn list_operations(
    State(svc): State<AppState>,
    Query(filter): Query<OperationFilter>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let page = svc.list_operations(&filter).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(page).unwrap_or_default()))
}

/// Intake endpoint. Returns a body tagged `status: recorded` when the
/// operation was persisted, or `status: needsReason` with the mismatch
/// details when a reason is still required.
async fn submit_operation(
    State(svc): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<SubmitOperation>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let outcome = svc
        .submit_operation(input, Some(&actor))
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(outcome).unwrap_or_default()))
}

async fn get_operation(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let op = svc.get_operation(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(op).unwrap_or_default()))
}

async fn delete_operation(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_operation(&id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
