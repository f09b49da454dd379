use motorlog_core::{ListResult, new_id, now_rfc3339};
use motorlog_sql::Value;

use crate::model::{Car, CreateCar, UpdateCar};
use crate::service::{WorkshopError, WorkshopService};

fn validate_car(input: &CreateCar) -> Result<(), WorkshopError> {
    if input.brand.trim().is_empty() {
        return Err(WorkshopError::Validation("brand cannot be empty".into()));
    }
    if input.model.trim().is_empty() {
        return Err(WorkshopError::Validation("model cannot be empty".into()));
    }
    if input.engine_size.trim().is_empty() {
        return Err(WorkshopError::Validation("engine_size cannot be empty".into()));
    }
    if input.oil_type.trim().is_empty() || input.oil_viscosity.trim().is_empty() {
        return Err(WorkshopError::Validation(
            "oil_type and oil_viscosity cannot be empty".into(),
        ));
    }
    if input.year_from > input.year_to {
        return Err(WorkshopError::Validation(
            "year_from must not exceed year_to".into(),
        ));
    }
    if !(input.oil_quantity > 0.0) {
        return Err(WorkshopError::Validation(
            "oil_quantity must be positive".into(),
        ));
    }
    Ok(())
}

fn car_from_row(row: &motorlog_sql::Row) -> Result<Car, WorkshopError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| WorkshopError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| WorkshopError::Internal(e.to_string()))
}

impl WorkshopService {
    /// Create a reference row.
    pub fn create_car(&self, input: CreateCar) -> Result<Car, WorkshopError> {
        validate_car(&input)?;

        let now = now_rfc3339();
        let car = Car {
            id: new_id(),
            brand: input.brand.trim().to_string(),
            model: input.model.trim().to_string(),
            year_from: input.year_from,
            year_to: input.year_to,
            engine_size: input.engine_size.trim().to_string(),
            oil_type: input.oil_type.trim().to_string(),
            oil_viscosity: input.oil_viscosity.trim().to_string(),
            oil_quantity: input.oil_quantity,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "cars",
            &car.id,
            &car,
            &[
                ("brand", Value::text(&car.brand)),
                ("model", Value::text(&car.model)),
                ("year_from", Value::Integer(car.year_from as i64)),
                ("year_to", Value::Integer(car.year_to as i64)),
                ("engine_size", Value::text(&car.engine_size)),
                ("created_at", Value::text(&now)),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(car)
    }

    /// Create many reference rows at once. Stops at the first invalid
    /// entry; nothing before it is rolled back.
    pub fn bulk_create_cars(&self, inputs: Vec<CreateCar>) -> Result<Vec<Car>, WorkshopError> {
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(self.create_car(input)?);
        }
        Ok(created)
    }

    /// Get a reference row by id.
    pub fn get_car(&self, id: &str) -> Result<Car, WorkshopError> {
        self.get_record("cars", id)
    }

    /// List reference rows ordered by brand then model, with an
    /// optional LIKE search over brand and model.
    pub fn list_cars(
        &self,
        search: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<ListResult<Car>, WorkshopError> {
        let (where_clause, mut params) = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => {
                let pat = format!("%{}%", s);
                (
                    "WHERE brand LIKE ?1 OR model LIKE ?1".to_string(),
                    vec![Value::Text(pat)],
                )
            }
            None => (String::new(), Vec::new()),
        };

        let count_sql = format!("SELECT COUNT(*) as cnt FROM cars {}", where_clause);
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
            "SELECT data FROM cars {} ORDER BY brand, model, year_from LIMIT ?{} OFFSET ?{}",
            where_clause, limit_idx, offset_idx,
        );
        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(car_from_row(row)?);
        }

        Ok(ListResult { items, total })
    }

    /// Update a reference row (full field replacement).
    pub fn update_car(&self, id: &str, input: UpdateCar) -> Result<Car, WorkshopError> {
        validate_car(&input)?;

        let mut car: Car = self.get_record("cars", id)?;
        let now = now_rfc3339();

        car.brand = input.brand.trim().to_string();
        car.model = input.model.trim().to_string();
        car.year_from = input.year_from;
        car.year_to = input.year_to;
        car.engine_size = input.engine_size.trim().to_string();
        car.oil_type = input.oil_type.trim().to_string();
        car.oil_viscosity = input.oil_viscosity.trim().to_string();
        car.oil_quantity = input.oil_quantity;
        car.updated_at = now.clone();

        self.update_record(
            "cars",
            id,
            &car,
            &[
                ("brand", Value::text(&car.brand)),
                ("model", Value::text(&car.model)),
                ("year_from", Value::Integer(car.year_from as i64)),
                ("year_to", Value::Integer(car.year_to as i64)),
                ("engine_size", Value::text(&car.engine_size)),
                ("updated_at", Value::text(&now)),
            ],
        )?;

        Ok(car)
    }

    /// Delete a reference row by id.
    pub fn delete_car(&self, id: &str) -> Result<(), WorkshopError> {
        self.delete_record("cars", id)
    }

    /// Distinct brands, alphabetical.
    pub fn distinct_brands(&self) -> Result<Vec<String>, WorkshopError> {
        self.distinct_column("SELECT DISTINCT brand AS v FROM cars ORDER BY brand", &[])
    }

    /// Distinct models for a brand, alphabetical.
    pub fn distinct_models(&self, brand: &str) -> Result<Vec<String>, WorkshopError> {
        self.distinct_column(
            "SELECT DISTINCT model AS v FROM cars WHERE brand = ?1 COLLATE NOCASE ORDER BY model",
            &[Value::text(brand.trim())],
        )
    }

    /// Distinct engine sizes for a brand and model.
    pub fn distinct_engines(&self, brand: &str, model: &str) -> Result<Vec<String>, WorkshopError> {
        self.distinct_column(
            "SELECT DISTINCT engine_size AS v FROM cars
             WHERE brand = ?1 COLLATE NOCASE AND model = ?2 COLLATE NOCASE
             ORDER BY engine_size",
            &[Value::text(brand.trim()), Value::text(model.trim())],
        )
    }

    fn distinct_column(&self, sql: &str, params: &[Value]) -> Result<Vec<String>, WorkshopError> {
        let rows = self
            .sql
            .query(sql, params)
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("v").map(|s| s.to_string()))
            .collect())
    }

    /// Resolve the recommended spec for a concrete car.
    ///
    /// Brand, model and engine size compare case-insensitively and the
    /// year must fall inside the row's range. A given engine size is a
    /// hard filter, not a preference. Returns None when no row covers
    /// the car.
    pub fn resolve_spec(
        &self,
        brand: &str,
        model: &str,
        year: i32,
        engine_size: Option<&str>,
    ) -> Result<Option<Car>, WorkshopError> {
        let candidates = self.candidate_specs(brand, model)?;
        let engine = engine_size.map(str::trim).filter(|e| !e.is_empty());

        let hit = candidates
            .iter()
            .filter(|c| c.year_from <= year && year <= c.year_to)
            .find(|c| match engine {
                Some(e) => c.engine_size.eq_ignore_ascii_case(e),
                None => true,
            });

        Ok(hit.cloned())
    }

    /// All reference rows for a brand and model, newest range first.
    pub fn candidate_specs(&self, brand: &str, model: &str) -> Result<Vec<Car>, WorkshopError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM cars
                 WHERE brand = ?1 COLLATE NOCASE AND model = ?2 COLLATE NOCASE
                 ORDER BY year_from DESC",
                &[Value::text(brand.trim()), Value::text(model.trim())],
            )
            .map_err(|e| WorkshopError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(car_from_row(row)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ai::AdvisorConfig;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service() -> Arc<WorkshopService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        WorkshopService::new(sql, AdvisorConfig::default()).unwrap()
    }

    fn camry() -> CreateCar {
        CreateCar {
            brand: "Toyota".into(),
            model: "Camry".into(),
            year_from: 2018,
            year_to: 2024,
            engine_size: "2.5L".into(),
            oil_type: "Toyota Genuine".into(),
            oil_viscosity: "0W-20".into(),
            oil_quantity: 4.5,
        }
    }

    #[test]
    fn test_car_crud() {
        let svc = test_service();

        let car = svc.create_car(camry()).unwrap();
        assert_eq!(car.oil_viscosity, "0W-20");

        let fetched = svc.get_car(&car.id).unwrap();
        assert_eq!(fetched.brand, "Toyota");

        let mut update = camry();
        update.oil_quantity = 5.0;
        let updated = svc.update_car(&car.id, update).unwrap();
        assert_eq!(updated.oil_quantity, 5.0);

        let list = svc.list_cars(None, 50, 0).unwrap();
        assert_eq!(list.total, 1);

        svc.delete_car(&car.id).unwrap();
        assert!(svc.get_car(&car.id).is_err());
    }

    #[test]
    fn test_invalid_year_range_rejected() {
        let svc = test_service();
        let mut input = camry();
        input.year_from = 2025;
        input.year_to = 2020;
        assert!(matches!(
            svc.create_car(input),
            Err(WorkshopError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_case_insensitive_and_in_range() {
        let svc = test_service();
        svc.create_car(camry()).unwrap();

        let hit = svc.resolve_spec("toyota", "CAMRY", 2020, None).unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().oil_viscosity, "0W-20");

        // Year outside the range resolves nothing.
        let miss = svc.resolve_spec("Toyota", "Camry", 2010, None).unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn test_resolve_requires_engine_match() {
        let svc = test_service();
        svc.create_car(camry()).unwrap();
        let mut v6 = camry();
        v6.engine_size = "3.5L".into();
        v6.oil_quantity = 5.7;
        svc.create_car(v6).unwrap();

        let hit = svc
            .resolve_spec("Toyota", "Camry", 2020, Some("3.5l"))
            .unwrap()
            .unwrap();
        assert_eq!(hit.oil_quantity, 5.7);

        // An engine size that no row carries resolves nothing, even
        // when other engines are in range.
        let miss = svc
            .resolve_spec("Toyota", "Camry", 2020, Some("9.9L"))
            .unwrap();
        assert!(miss.is_none());

        // No engine given matches any in-range row.
        assert!(
            svc.resolve_spec("Toyota", "Camry", 2020, None)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_distinct_lists() {
        let svc = test_service();
        svc.create_car(camry()).unwrap();
        let mut corolla = camry();
        corolla.model = "Corolla".into();
        corolla.engine_size = "1.8L".into();
        svc.create_car(corolla).unwrap();

        assert_eq!(svc.distinct_brands().unwrap(), vec!["Toyota"]);
        assert_eq!(
            svc.distinct_models("toyota").unwrap(),
            vec!["Camry", "Corolla"]
        );
        assert_eq!(
            svc.distinct_engines("Toyota", "Corolla").unwrap(),
            vec!["1.8L"]
        );
    }

    #[test]
    fn test_list_search() {
        let svc = test_service();
        svc.create_car(camry()).unwrap();
        let mut kia = camry();
        kia.brand = "Kia".into();
        kia.model = "Sportage".into();
        svc.create_car(kia).unwrap();

        let hits = svc.list_cars(Some("Sport"), 50, 0).unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].brand, "Kia");
    }
}
