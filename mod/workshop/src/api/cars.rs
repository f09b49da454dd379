use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use motorlog_core::ServiceError;

use crate::api::AppState;
use crate::model::{CreateCar, UpdateCar};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/bulk", post(bulk_create_cars))
        .route("/cars/brands", get(brands))
        .route("/cars/models", get(models))
        .route("/cars/engines", get(engines))
        .route("/cars/search", get(search))
        .route(
            "/cars/{id}",
            get(get_car).put(update_car).delete(delete_car),
        )
}

#[derive(Debug, Deserialize)]
struct CarListParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

async fn list_cars(
    State(svc): State<AppState>,
    Query(params): Query<CarListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc
        .list_cars(params.search.as_deref(), params.limit, params.offset)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn create_car(
    State(svc): State<AppState>,
    Json(input): Json<CreateCar>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let car = svc.create_car(input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(car).unwrap_or_default()),
    ))
}

async fn bulk_create_cars(
    State(svc): State<AppState>,
    Json(inputs): Json<Vec<CreateCar>>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let cars = svc.bulk_create_cars(inputs).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::json!({
            "created": cars.len(),
            "items": cars,
        })),
    ))
}

async fn get_car(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let car = svc.get_car(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(car).unwrap_or_default()))
}

async fn update_car(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCar>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let car = svc.update_car(&id, input).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(car).unwrap_or_default()))
}

async fn delete_car(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    svc.delete_car(&id).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn brands(State(svc): State<AppState>) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(svc.distinct_brands().map_err(ServiceError::from)?))
}

#[derive(Debug, Deserialize)]
struct ModelsParams {
    brand: String,
}

async fn models(
    State(svc): State<AppState>,
    Query(params): Query<ModelsParams>,
) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(
        svc.distinct_models(&params.brand).map_err(ServiceError::from)?,
    ))
}

#[derive(Debug, Deserialize)]
struct EnginesParams {
    brand: String,
    model: String,
}

async fn engines(
    State(svc): State<AppState>,
    Query(params): Query<EnginesParams>,
) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(
        svc.distinct_engines(&params.brand, &params.model)
            .map_err(ServiceError::from)?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    brand: String,
    model: String,
    year: i32,
    #[serde(default)]
    engine_size: Option<String>,
}

/// Resolve the recommended spec for a concrete car.
async fn search(
    State(svc): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let car = svc
        .resolve_spec(
            &params.brand,
            &params.model,
            params.year,
            params.engine_size.as_deref(),
        )
        .map_err(ServiceError::from)?
        .ok_or_else(|| {
            ServiceError::NotFound("لا توجد بيانات لهذه السيارة في قاعدة البيانات".into())
        })?;
    Ok(Json(serde_json::to_value(car).unwrap_or_default()))
}
