use motorlog_sql::SQLStore;

use crate::service::WorkshopError;

/// Initialize the SQLite schema for workshop resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), WorkshopError> {
    let statements = [
        // Cars: the oil-spec reference table
        "CREATE TABLE IF NOT EXISTS cars (
            id TEXT PRIMARY KEY,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            year_from INTEGER NOT NULL,
            year_to INTEGER NOT NULL,
            engine_size TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_cars_brand_model ON cars(brand, model)",

        // Operations: the append-mostly maintenance log
        "CREATE TABLE IF NOT EXISTS operations (
            id TEXT PRIMARY KEY,
            car_brand TEXT NOT NULL,
            car_model TEXT NOT NULL,
            car_year INTEGER NOT NULL,
            engine_size TEXT NOT NULL,
            oil_used TEXT NOT NULL,
            oil_viscosity TEXT NOT NULL,
            oil_quantity REAL NOT NULL,
            is_matching INTEGER NOT NULL,
            operation_type TEXT NOT NULL,
            user_id TEXT,
            branch_id TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_operations_created ON operations(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_operations_branch ON operations(branch_id)",
        "CREATE INDEX IF NOT EXISTS idx_operations_matching ON operations(is_matching)",
    ];

    sql.exec_batch(&statements)
        .map_err(|e| WorkshopError::Storage(e.to_string()))
}
