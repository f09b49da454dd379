use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use motorlog_core::{ListParams, ServiceError};

use crate::api::AppState;
use crate::model::{CreateBranch, UpdateBranch};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/branches", get(list_branches).post(create_branch))
        .route(
            "/branches/{id}",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
}

async fn list_branches(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc
        .list_branches(params.limit, params.offset)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn create_branch(
    State(svc): State<AppState>,
    Json(input): Json<CreateBranch>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let branch = svc.create_branch(input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(branch).unwrap_or_default()),
    ))
}

async fn get_branch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let branch = svc.get_branch(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(branch).unwrap_or_default()))
}

async fn update_branch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateBranch>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let branch = svc
        .update_branch(&id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(branch).unwrap_or_default()))
}

async fn delete_branch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_branch(&id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
