use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use motorlog_core::ServiceError;

use crate::api::AppState;
use crate::model::OperationFilter;
use crate::service::report::ReportQuery;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/stats", get(stats))
        .route("/reports/trends", get(trends))
        .route("/reports/export", get(export))
}

async fn stats(
    State(svc): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc.operation_stats(&query).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

async fn trends(
    State(svc): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let report = svc.operation_trends(&query).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(report).unwrap_or_default()))
}

/// Query::<T> cannot stack two extractors, so the export params carry
/// the filter fields alongside `format`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    sort_order: Option<String>,
    #[serde(default)]
    branch_id: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    is_matching: Option<u8>,
}

impl ExportParams {
    fn filter(&self) -> OperationFilter {
        OperationFilter {
            page: None,
            limit: None,
            search: self.search.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
            branch_id: self.branch_id.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            is_matching: self.is_matching,
        }
    }
}

async fn export(
    State(svc): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = params.filter();

    let (bytes, content_type, filename) = match params.format.as_deref() {
        Some("csv") => (
            svc.export_csv(&filter).map_err(ServiceError::from)?,
            "text/csv; charset=utf-8",
            "operations_report.csv",
        ),
        _ => (
            svc.export_xlsx(&filter).map_err(ServiceError::from)?,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "operations_report.xlsx",
        ),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        bytes,
    ))
}
