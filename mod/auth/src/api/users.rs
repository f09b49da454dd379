use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use motorlog_core::{ListParams, ServiceError};

use crate::api::AppState;
use crate::model::{CreateUser, UpdateUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc
        .list_users(params.limit, params.offset)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn create_user(
    State(svc): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let user = svc.create_user(input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(user).unwrap_or_default()),
    ))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = svc.get_user(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap_or_default()))
}

async fn update_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = svc.update_user(&id, input).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap_or_default()))
}

async fn delete_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_user(&id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
