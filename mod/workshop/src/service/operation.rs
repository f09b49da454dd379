use motorlog_sql::Value;

use crate::model::{Operation, OperationFilter, OperationPage, Pagination};
use crate::service::{WorkshopError, WorkshopService};

/// Columns the listing may sort on. Anything else falls back to
/// created_at.
const SORTABLE: &[&str] = &[
    "created_at",
    "car_brand",
    "car_model",
    "car_year",
    "oil_quantity",
    "is_matching",
];

/// WHERE clause and bound params for an operations filter.
fn build_filter(filter: &OperationFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let idx = params.len() + 1;
        clauses.push(format!(
            "(car_brand LIKE ?{i} OR car_model LIKE ?{i} OR oil_used LIKE ?{i} \
             OR oil_viscosity LIKE ?{i} OR engine_size LIKE ?{i} \
             OR CAST(car_year AS TEXT) LIKE ?{i})",
            i = idx,
        ));
        params.push(Value::Text(format!("%{}%", search)));
    }

    if let Some(branch) = filter.branch_id.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(format!("branch_id = ?{}", params.len() + 1));
        params.push(Value::text(branch));
    }

    if let Some(start) = filter.start_date.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(format!("DATE(created_at) >= DATE(?{})", params.len() + 1));
        params.push(Value::text(start));
    }

    if let Some(end) = filter.end_date.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(format!("DATE(created_at) <= DATE(?{})", params.len() + 1));
        params.push(Value::text(end));
    }

    if let Some(matching) = filter.is_matching {
        clauses.push(format!("is_matching = ?{}", params.len() + 1));
        params.push(Value::Integer(i64::from(matching != 0)));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    (where_clause, params)
}

fn sort_clause(filter: &OperationFilter) -> String {
    let column = filter
        .sort_by
        .as_deref()
        .filter(|c| SORTABLE.contains(c))
        .unwrap_or("created_at");
    let order = match filter.sort_order.as_deref() {
        Some("asc") | Some("ASC") => "ASC",
        _ => "DESC",
    };
    format!("ORDER BY {} {}", column, order)
}

fn operation_from_row(row: &motorlog_sql::Row) -> Result<Operation, WorkshopError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| WorkshopError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| WorkshopError::Internal(e.to_string()))
}

impl WorkshopService {
    pub(crate) fn insert_operation(&self, op: &Operation) -> Result<(), WorkshopError> {
        self.insert_record(
            "operations",
            &op.id,
            op,
            &[
                ("car_brand", Value::text(&op.car_brand)),
                ("car_model", Value::text(&op.car_model)),
                ("car_year", Value::Integer(op.car_year as i64)),
                ("engine_size", Value::text(&op.engine_size)),
                ("oil_used", Value::text(&op.oil_used)),
                ("oil_viscosity", Value::text(&op.oil_viscosity)),
                ("oil_quantity", Value::Real(op.oil_quantity)),
                ("is_matching", Value::bool(op.is_matching)),
                ("operation_type", Value::text(op.operation_type.as_str())),
                (
                    "user_id",
                    op.user_id.as_deref().map(Value::text).unwrap_or(Value::Null),
                ),
                (
                    "branch_id",
                    op.branch_id.as_deref().map(Value::text).unwrap_or(Value::Null),
                ),
                ("created_at", Value::text(&op.created_at)),
            ],
        )
    }

    /// One page of the operations log, filtered and sorted.
    pub fn list_operations(
        &self,
        filter: &OperationFilter,
    ) -> Result<OperationPage, WorkshopError> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(25).clamp(10, 100);
        let offset = (page - 1) * limit;

        let (where_clause, mut params) = build_filter(filter);

        let count_sql = format!("SELECT COUNT(*) as cnt FROM operations {}", where_clause);
        let count_rows = self
            .sql
            .query(&count_sql, &params)
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT data FROM operations {} {} LIMIT ?{} OFFSET ?{}",
            where_clause,
            sort_clause(filter),
            limit_idx,
            offset_idx,
        );
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            data.push(operation_from_row(row)?);
        }

        let total_pages = ((total as u32) + limit - 1) / limit;

        Ok(OperationPage {
            data,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
            filters: serde_json::json!({
                "search": filter.search,
                "sortBy": filter.sort_by,
                "sortOrder": filter.sort_order,
                "branchId": filter.branch_id,
                "startDate": filter.start_date,
                "endDate": filter.end_date,
                "isMatching": filter.is_matching,
            }),
        })
    }

    /// Get a single operation by id.
    pub fn get_operation(&self, id: &str) -> Result<Operation, WorkshopError> {
        self.get_record("operations", id)
    }

    /// Delete an operation from the log.
    pub fn delete_operation(&self, id: &str) -> Result<(), WorkshopError> {
        self.delete_record("operations", id)
    }

    /// All operations matching a filter, unpaginated. Used for export
    /// and aggregation.
    pub(crate) fn fetch_filtered(
        &self,
        filter: &OperationFilter,
    ) -> Result<Vec<Operation>, WorkshopError> {
        let (where_clause, params) = build_filter(filter);
        let sql = format!(
            "SELECT data FROM operations {} {}",
            where_clause,
            sort_clause(filter),
        );
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            data.push(operation_from_row(row)?);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OperationType, SubmitOperation};
    use crate::service::ai::AdvisorConfig;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service() -> Arc<WorkshopService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        WorkshopService::new(sql, AdvisorConfig::default()).unwrap()
    }

    fn submit(svc: &WorkshopService, brand: &str, model: &str, quantity: f64, reason: Option<&str>) {
        svc.submit_operation(
            SubmitOperation {
                operation_type: OperationType::Service,
                car_brand: brand.into(),
                car_model: model.into(),
                car_year: Some(2020),
                engine_size: "2.5L".into(),
                oil_used: Some("Mobil 1".into()),
                oil_viscosity: Some("5W-30".into()),
                oil_quantity: Some(quantity),
                oil_filter: false,
                air_filter: false,
                cooling_filter: false,
                mismatch_reason: reason.map(Into::into),
            },
            None,
        )
        .unwrap();
    }

    #[test]
    fn test_pagination_and_clamp() {
        let svc = test_service();
        for i in 0..12 {
            submit(&svc, "Toyota", &format!("Model{}", i), 4.0, None);
        }

        let page = svc
            .list_operations(&OperationFilter {
                page: Some(1),
                limit: Some(3), // below the floor, clamps to 10
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.pagination.limit, 10);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.pagination.total, 12);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_prev);

        let page2 = svc
            .list_operations(&OperationFilter {
                page: Some(2),
                limit: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page2.data.len(), 2);
        assert!(page2.pagination.has_prev);
        assert!(!page2.pagination.has_next);
    }

    #[test]
    fn test_search_filter() {
        let svc = test_service();
        submit(&svc, "Toyota", "Camry", 4.0, None);
        submit(&svc, "Kia", "Sportage", 4.0, None);

        let page = svc
            .list_operations(&OperationFilter {
                search: Some("camry".into()),
                ..Default::default()
            })
            .unwrap();
        // LIKE is case-insensitive for ASCII in SQLite.
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.data[0].car_brand, "Toyota");
    }

    #[test]
    fn test_matching_filter() {
        let svc = test_service();
        svc.create_car(crate::model::CreateCar {
            brand: "Toyota".into(),
            model: "Camry".into(),
            year_from: 2018,
            year_to: 2024,
            engine_size: "2.5L".into(),
            oil_type: "Mobil 1".into(),
            oil_viscosity: "5W-30".into(),
            oil_quantity: 4.5,
        })
        .unwrap();
        submit(&svc, "Toyota", "Camry", 4.5, None);
        submit(&svc, "Toyota", "Camry", 6.0, Some("زيادة بناء على طلب العميل"));

        let mismatched = svc
            .list_operations(&OperationFilter {
                is_matching: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mismatched.pagination.total, 1);
        assert!(!mismatched.data[0].is_matching);
    }

    #[test]
    fn test_sort_whitelist_falls_back() {
        let svc = test_service();
        submit(&svc, "Toyota", "Camry", 4.0, None);

        // An unknown sort column must not leak into the SQL.
        let page = svc
            .list_operations(&OperationFilter {
                sort_by: Some("data; DROP TABLE operations".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.pagination.total, 1);
    }

    #[test]
    fn test_get_and_delete() {
        let svc = test_service();
        submit(&svc, "Toyota", "Camry", 4.0, None);

        let page = svc.list_operations(&OperationFilter::default()).unwrap();
        let id = page.data[0].id.clone();

        let op = svc.get_operation(&id).unwrap();
        assert_eq!(op.car_model, "Camry");

        svc.delete_operation(&id).unwrap();
        assert!(matches!(
            svc.get_operation(&id),
            Err(WorkshopError::NotFound(_))
        ));
    }
}
