use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use motorlog_core::ServiceError;

use crate::api::AppState;
use crate::service::ai::{AnalyzeRequest, CompareRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/analyze", post(analyze))
        .route("/ai/compare", post(compare))
}

/// Recommend a spec for a car. 404 when the reference table has no row
/// for it; the model is never allowed to invent one.
async fn analyze(
    State(svc): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let resp = svc.advise_oil(req).await.map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(resp).unwrap_or_default()))
}

/// Compare entered oil facts with a recommendation. Always answers;
/// remote trouble degrades to the deterministic verdict.
async fn compare(
    State(svc): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Json<serde_json::Value> {
    let resp = svc.compare_entry(req).await;
    Json(serde_json::to_value(resp).unwrap_or_default())
}
