use serde::{Deserialize, Serialize};

/// The two entry flows for the operations log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Lookup only — no oil entry, always recorded as matching.
    Inquiry,
    /// Full maintenance entry with oil facts and filter flags.
    Service,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Inquiry => "inquiry",
            OperationType::Service => "service",
        }
    }
}

/// A logged maintenance or inquiry event. Append-mostly: there is no
/// update path; operations are the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    pub car_brand: String,
    pub car_model: String,
    pub car_year: i32,
    pub engine_size: String,

    pub oil_used: String,
    pub oil_viscosity: String,
    pub oil_quantity: f64,

    #[serde(default)]
    pub oil_filter: bool,
    #[serde(default)]
    pub air_filter: bool,
    #[serde(default)]
    pub cooling_filter: bool,

    /// Whether the entered oil facts matched the resolved reference row.
    pub is_matching: bool,

    /// Human-supplied (or AI-narrated) reason when not matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_reason: Option<String>,

    pub operation_type: OperationType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Intake submission body for POST /workshop/operations.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOperation {
    pub operation_type: OperationType,

    #[serde(default)]
    pub car_brand: String,
    #[serde(default)]
    pub car_model: String,
    #[serde(default)]
    pub car_year: Option<i32>,
    #[serde(default)]
    pub engine_size: String,

    #[serde(default)]
    pub oil_used: Option<String>,
    #[serde(default)]
    pub oil_viscosity: Option<String>,
    #[serde(default)]
    pub oil_quantity: Option<f64>,

    #[serde(default)]
    pub oil_filter: bool,
    #[serde(default)]
    pub air_filter: bool,
    #[serde(default)]
    pub cooling_filter: bool,

    /// Required when the entry mismatches the recommendation. The AI's
    /// narrative analysis may be passed here verbatim if the user
    /// accepts it as the explanation.
    #[serde(default)]
    pub mismatch_reason: Option<String>,
}

/// A single field-level discrepancy between entered and recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Field label as shown to the user.
    pub field: String,
    /// Recommended value.
    pub expected: String,
    /// Entered value.
    pub actual: String,
}

/// Outcome of the deterministic field comparison.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub is_matching: bool,
    pub mismatches: Vec<Mismatch>,
}

/// Query parameters for the paginated operations listing, export and
/// stats. Field names mirror the query string (camelCase).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationFilter {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Inclusive lower bound on DATE(created_at), `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound on DATE(created_at), `YYYY-MM-DD`.
    #[serde(default)]
    pub end_date: Option<String>,
    /// 1 or 0; absent means both.
    #[serde(default)]
    pub is_matching: Option<u8>,
}

/// Pagination envelope for the operations listing.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of the operations log plus the filters that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct OperationPage {
    pub data: Vec<Operation>,
    pub pagination: Pagination,
    pub filters: serde_json::Value,
}
