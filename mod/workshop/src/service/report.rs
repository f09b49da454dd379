//! Aggregate reporting over the operations log: headline stats, a
//! zero-filled daily timeline and KPI figures for the dashboard.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Operation, OperationFilter};
use crate::service::{WorkshopError, WorkshopService};

/// Query parameters shared by stats and trends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Window size for the trend timeline; default 30.
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCounts {
    pub oil: usize,
    pub air: usize,
    pub cooling: usize,
}

/// Headline stats for the filtered operation set. Per-branch counts
/// are keyed by branch id; name resolution happens client-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub total_operations: usize,
    pub matching_operations: usize,
    pub mismatched_operations: usize,
    pub oil_types: BTreeMap<String, usize>,
    pub viscosities: BTreeMap<String, usize>,
    pub total_oil_used: f64,
    pub filters: FilterCounts,
    pub branch_counts: BTreeMap<String, usize>,
    pub mismatched: Vec<Operation>,
}

#[derive(Debug, Serialize)]
pub struct TimelinePoint {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_operations: usize,
    pub matching_operations: usize,
    pub mismatched_operations: usize,
    pub total_oil_used: f64,
    pub avg_operations_per_day: f64,
    /// Percentage, one decimal.
    pub mismatch_rate: f64,
    pub days_active: usize,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
    pub days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub timeline: Vec<TimelinePoint>,
    pub branches: BTreeMap<String, usize>,
    pub oil_types: BTreeMap<String, usize>,
    pub viscosities: BTreeMap<String, usize>,
    pub kpis: Kpis,
    pub date_range: DateRange,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// YYYY-MM-DD prefix of an RFC 3339 timestamp.
fn date_of(ts: &str) -> &str {
    ts.get(..10).unwrap_or(ts)
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    let key = if key.is_empty() { "غير محدد" } else { key };
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn query_to_filter(query: &ReportQuery) -> OperationFilter {
    OperationFilter {
        branch_id: query.branch_id.clone(),
        start_date: query.start_date.clone(),
        end_date: query.end_date.clone(),
        ..Default::default()
    }
}

impl WorkshopService {
    /// Headline stats over the filtered operation set.
    pub fn operation_stats(&self, query: &ReportQuery) -> Result<OperationStats, WorkshopError> {
        let ops = self.fetch_filtered(&query_to_filter(query))?;

        let total = ops.len();
        let matching = ops.iter().filter(|op| op.is_matching).count();

        let mut oil_types = BTreeMap::new();
        let mut viscosities = BTreeMap::new();
        let mut branch_counts = BTreeMap::new();
        let mut total_oil = 0.0;
        let mut filters = FilterCounts {
            oil: 0,
            air: 0,
            cooling: 0,
        };

        for op in &ops {
            bump(&mut oil_types, &op.oil_used);
            bump(&mut viscosities, &op.oil_viscosity);
            bump(&mut branch_counts, op.branch_id.as_deref().unwrap_or(""));
            total_oil += op.oil_quantity;
            if op.oil_filter {
                filters.oil += 1;
            }
            if op.air_filter {
                filters.air += 1;
            }
            if op.cooling_filter {
                filters.cooling += 1;
            }
        }

        let mismatched: Vec<Operation> =
            ops.into_iter().filter(|op| !op.is_matching).collect();

        Ok(OperationStats {
            total_operations: total,
            matching_operations: matching,
            mismatched_operations: total - matching,
            oil_types,
            viscosities,
            total_oil_used: round1(total_oil),
            filters,
            branch_counts,
            mismatched,
        })
    }

    /// Trend series over a rolling window, zero-filled per day.
    pub fn operation_trends(&self, query: &ReportQuery) -> Result<TrendReport, WorkshopError> {
        let days = query.days.unwrap_or(30).clamp(1, 365);

        let end = query
            .end_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive());
        let start = query
            .start_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| end - Duration::days(i64::from(days) - 1));
        // Explicit dates obey the same one-year ceiling as `days`, so
        // the zero-filled timeline stays bounded.
        let start = start.max(end - Duration::days(364));

        let filter = OperationFilter {
            branch_id: query.branch_id.clone(),
            start_date: Some(start.format("%Y-%m-%d").to_string()),
            end_date: Some(end.format("%Y-%m-%d").to_string()),
            ..Default::default()
        };
        let ops = self.fetch_filtered(&filter)?;

        // Zero-fill one bucket per day in the window, oldest first.
        let mut by_date: BTreeMap<String, usize> = BTreeMap::new();
        let mut day = start;
        while day <= end {
            by_date.insert(day.format("%Y-%m-%d").to_string(), 0);
            day = day + Duration::days(1);
        }

        let mut branches = BTreeMap::new();
        let mut oil_types = BTreeMap::new();
        let mut viscosities = BTreeMap::new();
        let mut total_oil = 0.0;
        let mut active_days = std::collections::BTreeSet::new();

        for op in &ops {
            let date = date_of(&op.created_at);
            if let Some(count) = by_date.get_mut(date) {
                *count += 1;
            }
            active_days.insert(date.to_string());
            bump(&mut branches, op.branch_id.as_deref().unwrap_or(""));
            bump(&mut oil_types, &op.oil_used);
            bump(&mut viscosities, &op.oil_viscosity);
            total_oil += op.oil_quantity;
        }

        let total = ops.len();
        let matching = ops.iter().filter(|op| op.is_matching).count();
        let mismatched = total - matching;
        let days_active = active_days.len();

        let kpis = Kpis {
            total_operations: total,
            matching_operations: matching,
            mismatched_operations: mismatched,
            total_oil_used: round1(total_oil),
            avg_operations_per_day: if days_active > 0 {
                round1(total as f64 / days_active as f64)
            } else {
                0.0
            },
            mismatch_rate: if total > 0 {
                round1(mismatched as f64 / total as f64 * 100.0)
            } else {
                0.0
            },
            days_active,
        };

        Ok(TrendReport {
            timeline: by_date
                .into_iter()
                .map(|(date, count)| TimelinePoint { date, count })
                .collect(),
            branches,
            oil_types,
            viscosities,
            kpis,
            date_range: DateRange {
                start: start.format("%Y-%m-%d").to_string(),
                end: end.format("%Y-%m-%d").to_string(),
                days,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OperationType, SubmitOperation};
    use crate::service::ai::AdvisorConfig;
    use motorlog_core::Actor;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service() -> Arc<WorkshopService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        WorkshopService::new(sql, AdvisorConfig::default()).unwrap()
    }

    fn submit(svc: &WorkshopService, oil: &str, quantity: f64, branch: &str, reason: Option<&str>) {
        let actor = Actor {
            user_id: "u1".into(),
            name: "test".into(),
            branch_id: Some(branch.into()),
            admin: false,
        };
        svc.submit_operation(
            SubmitOperation {
                operation_type: OperationType::Service,
                car_brand: "Toyota".into(),
                car_model: "Camry".into(),
                car_year: Some(2020),
                engine_size: "2.5L".into(),
                oil_used: Some(oil.into()),
                oil_viscosity: Some("5W-30".into()),
                oil_quantity: Some(quantity),
                oil_filter: true,
                air_filter: false,
                cooling_filter: false,
                mismatch_reason: reason.map(Into::into),
            },
            Some(&actor),
        )
        .unwrap();
    }

    #[test]
    fn test_stats_counts() {
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

        submit(&svc, "Mobil 1", 4.5, "b1", None);
        submit(&svc, "Mobil 1", 4.5, "b1", None);
        submit(&svc, "Castrol", 4.5, "b2", Some("المتوفر بالمخزن"));

        let stats = svc.operation_stats(&ReportQuery::default()).unwrap();
        assert_eq!(stats.total_operations, 3);
        assert_eq!(stats.matching_operations, 2);
        assert_eq!(stats.mismatched_operations, 1);
        assert_eq!(stats.oil_types.get("Mobil 1"), Some(&2));
        assert_eq!(stats.branch_counts.get("b1"), Some(&2));
        assert_eq!(stats.filters.oil, 3);
        assert_eq!(stats.filters.air, 0);
        assert_eq!(stats.total_oil_used, 13.5);
        assert_eq!(stats.mismatched.len(), 1);
    }

    #[test]
    fn test_stats_branch_filter() {
        let svc = test_service();
        submit(&svc, "Mobil 1", 4.0, "b1", None);
        submit(&svc, "Mobil 1", 4.0, "b2", None);

        let stats = svc
            .operation_stats(&ReportQuery {
                branch_id: Some("b1".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(stats.total_operations, 1);
    }

    #[test]
    fn test_trends_span_capped_at_one_year() {
        let svc = test_service();
        submit(&svc, "Mobil 1", 4.0, "b1", None);

        let report = svc
            .operation_trends(&ReportQuery {
                start_date: Some("0001-01-01".into()),
                end_date: Some("2026-01-01".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.timeline.len(), 365);
        assert_eq!(report.date_range.start, "2025-01-02");
        assert_eq!(report.date_range.end, "2026-01-01");
    }

    #[test]
    fn test_trends_timeline_zero_filled() {
        let svc = test_service();
        submit(&svc, "Mobil 1", 4.0, "b1", None);

        let report = svc
            .operation_trends(&ReportQuery {
                days: Some(7),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.timeline.len(), 7);
        let today_count: usize = report.timeline.iter().map(|p| p.count).sum();
        assert_eq!(today_count, 1);

        assert_eq!(report.kpis.total_operations, 1);
        assert_eq!(report.kpis.days_active, 1);
        assert_eq!(report.kpis.avg_operations_per_day, 1.0);
        assert_eq!(report.kpis.mismatch_rate, 0.0);
        assert_eq!(report.date_range.days, 7);
    }

    #[test]
    fn test_trends_empty_window() {
        let svc = test_service();
        let report = svc
            .operation_trends(&ReportQuery {
                start_date: Some("2020-01-01".into()),
                end_date: Some("2020-01-03".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(report.timeline.len(), 3);
        assert!(report.timeline.iter().all(|p| p.count == 0));
        assert_eq!(report.kpis.avg_operations_per_day, 0.0);
    }
}
