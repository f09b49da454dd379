//! First-start seeding: demo branches, accounts and the initial oil
//! reference table. Runs only when the branch table is empty, so a
//! restart never duplicates data.

use std::sync::Arc;

use auth::model::{CreateBranch, CreateUser, Role};
use auth::service::AuthService;
use tracing::info;
use workshop::model::CreateCar;
use workshop::service::WorkshopService;

use crate::config::SeedConfig;

const BRANCHES: &[(&str, &str)] = &[
    ("الفرع الرئيسي", "القاهرة"),
    ("فرع الإسكندرية", "الإسكندرية"),
    ("فرع الجيزة", "الجيزة"),
];

#[rustfmt::skip]
const CARS: &[(&str, &str, i32, i32, &str, &str, &str, f64)] = &[
    ("Toyota", "Camry", 2018, 2024, "2.5L", "Toyota Genuine", "0W-20", 4.5),
    ("Toyota", "Camry", 2012, 2017, "2.5L", "Toyota Genuine", "5W-30", 4.5),
    ("Toyota", "Corolla", 2019, 2024, "1.8L", "Toyota Genuine", "0W-20", 4.0),
    ("Toyota", "Corolla", 2014, 2018, "1.8L", "Toyota Genuine", "5W-30", 4.0),
    ("Toyota", "Land Cruiser", 2016, 2024, "4.5L", "Toyota Genuine", "5W-30", 8.0),
    ("Toyota", "Hilux", 2016, 2024, "2.7L", "Toyota Genuine", "5W-30", 5.5),
    ("Toyota", "Yaris", 2018, 2024, "1.5L", "Toyota Genuine", "0W-20", 3.5),
    ("Hyundai", "Elantra", 2017, 2024, "1.6L", "Hyundai Genuine", "5W-30", 4.0),
    ("Hyundai", "Accent", 2018, 2024, "1.4L", "Hyundai Genuine", "5W-30", 3.5),
    ("Hyundai", "Tucson", 2016, 2024, "2.0L", "Hyundai Genuine", "5W-30", 4.5),
    ("Hyundai", "Sonata", 2015, 2024, "2.4L", "Hyundai Genuine", "5W-20", 5.0),
    ("Nissan", "Sunny", 2015, 2024, "1.5L", "Nissan Genuine", "5W-30", 3.5),
    ("Nissan", "Sentra", 2016, 2024, "1.8L", "Nissan Genuine", "5W-30", 4.0),
    ("Nissan", "X-Trail", 2017, 2024, "2.5L", "Nissan Genuine", "5W-30", 5.0),
    ("Nissan", "Patrol", 2010, 2024, "5.6L", "Nissan Genuine", "5W-30", 7.5),
    ("Kia", "Cerato", 2016, 2024, "1.6L", "Kia Genuine", "5W-30", 4.0),
    ("Kia", "Sportage", 2017, 2024, "2.0L", "Kia Genuine", "5W-30", 4.5),
    ("Kia", "Picanto", 2017, 2024, "1.2L", "Kia Genuine", "5W-30", 3.0),
    ("Chevrolet", "Cruze", 2015, 2020, "1.8L", "GM Genuine", "5W-30", 4.0),
    ("Chevrolet", "Aveo", 2014, 2020, "1.6L", "GM Genuine", "5W-30", 3.5),
    ("BMW", "320i", 2016, 2024, "2.0L", "BMW Longlife", "0W-30", 5.0),
    ("BMW", "520i", 2017, 2024, "2.0L", "BMW Longlife", "0W-30", 5.5),
    ("BMW", "X5", 2014, 2024, "3.0L", "BMW Longlife", "0W-40", 6.5),
    ("Mercedes-Benz", "C200", 2015, 2024, "2.0L", "Mercedes-Benz Genuine", "5W-30", 5.5),
    ("Mercedes-Benz", "E200", 2016, 2024, "2.0L", "Mercedes-Benz Genuine", "5W-30", 6.0),
    ("Mercedes-Benz", "GLC", 2016, 2024, "2.0L", "Mercedes-Benz Genuine", "5W-30", 5.5),
    ("Honda", "Civic", 2016, 2024, "1.5L", "Honda Genuine", "0W-20", 3.5),
    ("Honda", "Accord", 2018, 2024, "1.5L", "Honda Genuine", "0W-20", 4.0),
    ("Honda", "CR-V", 2017, 2024, "1.5L", "Honda Genuine", "0W-20", 4.0),
];

/// Seed demo data unless branches already exist.
pub fn run(
    auth: &Arc<AuthService>,
    workshop: &Arc<WorkshopService>,
    config: &SeedConfig,
) -> anyhow::Result<()> {
    let existing = auth.list_branches(1, 0).map_err(|e| anyhow::anyhow!(e))?;
    if existing.total > 0 {
        info!("seed skipped, data already present");
        return Ok(());
    }

    let mut branch_ids = Vec::new();
    for (name, location) in BRANCHES {
        let branch = auth
            .create_branch(CreateBranch {
                name: (*name).to_string(),
                location: (*location).to_string(),
            })
            .map_err(|e| anyhow::anyhow!(e))?;
        branch_ids.push(branch.id);
    }

    let main_branch = branch_ids.first().cloned();

    auth.create_user(CreateUser {
        username: "admin".into(),
        password: config.admin_password.clone(),
        name: "مدير النظام".into(),
        role: Role::Admin,
        branch_id: main_branch.clone(),
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    if !config.employee_password.is_empty() {
        auth.create_user(CreateUser {
            username: "employee1".into(),
            password: config.employee_password.clone(),
            name: "أحمد محمد".into(),
            role: Role::Employee,
            branch_id: main_branch,
        })
        .map_err(|e| anyhow::anyhow!(e))?;
    }

    let cars: Vec<CreateCar> = CARS
        .iter()
        .map(
            |(brand, model, year_from, year_to, engine, oil_type, viscosity, quantity)| CreateCar {
                brand: (*brand).to_string(),
                model: (*model).to_string(),
                year_from: *year_from,
                year_to: *year_to,
                engine_size: (*engine).to_string(),
                oil_type: (*oil_type).to_string(),
                oil_viscosity: (*viscosity).to_string(),
                oil_quantity: *quantity,
            },
        )
        .collect();
    let created = workshop
        .bulk_create_cars(cars)
        .map_err(|e| anyhow::anyhow!(e))?;

    info!(
        branches = BRANCHES.len(),
        cars = created.len(),
        "seeded initial data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::service::AuthConfig;
    use motorlog_sql::SqliteStore;
    use workshop::service::ai::AdvisorConfig;

    fn stores() -> (Arc<AuthService>, Arc<WorkshopService>) {
        let sql: Arc<dyn motorlog_sql::SQLStore> =
            Arc::new(SqliteStore::open_in_memory().unwrap());
        let auth = AuthService::new(Arc::clone(&sql), AuthConfig::default()).unwrap();
        let workshop = WorkshopService::new(sql, AdvisorConfig::default()).unwrap();
        (auth, workshop)
    }

    fn seed_config() -> SeedConfig {
        SeedConfig {
            enabled: true,
            admin_password: "admin123".into(),
            employee_password: "123456".into(),
        }
    }

    #[test]
    fn test_seed_populates_everything() {
        let (auth, workshop) = stores();
        run(&auth, &workshop, &seed_config()).unwrap();

        assert_eq!(auth.list_branches(10, 0).unwrap().total, 3);
        assert_eq!(auth.list_users(10, 0).unwrap().total, 2);
        let cars = workshop.list_cars(None, 100, 0).unwrap();
        assert_eq!(cars.total, CARS.len());

        // Seeded credentials work.
        let admin = auth.verify_credentials("admin", "admin123").unwrap();
        assert!(admin.role.is_admin());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (auth, workshop) = stores();
        run(&auth, &workshop, &seed_config()).unwrap();
        run(&auth, &workshop, &seed_config()).unwrap();
        assert_eq!(auth.list_branches(10, 0).unwrap().total, 3);
        assert_eq!(auth.list_users(10, 0).unwrap().total, 2);
    }
}
