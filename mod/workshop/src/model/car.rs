use serde::{Deserialize, Serialize};

/// A reference row: which oil a (brand, model, year range, engine)
/// combination should get.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    pub brand: String,
    pub model: String,

    /// First model year this spec applies to (inclusive).
    pub year_from: i32,
    /// Last model year this spec applies to (inclusive).
    pub year_to: i32,

    /// Engine displacement label, e.g. "2.5L".
    pub engine_size: String,

    /// Recommended oil product line.
    pub oil_type: String,
    /// Recommended viscosity grade, e.g. "0W-20".
    pub oil_viscosity: String,
    /// Recommended fill quantity in litres.
    pub oil_quantity: f64,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

impl Car {
    /// The recommended spec carried by this row.
    pub fn spec(&self) -> OilSpec {
        OilSpec {
            oil_type: self.oil_type.clone(),
            oil_viscosity: self.oil_viscosity.clone(),
            oil_quantity: self.oil_quantity,
        }
    }
}

/// Oil facts — used both for what a technician entered and for what the
/// reference table recommends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OilSpec {
    pub oil_type: String,
    pub oil_viscosity: String,
    pub oil_quantity: f64,
}

/// Input for creating a reference row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCar {
    pub brand: String,
    pub model: String,
    pub year_from: i32,
    pub year_to: i32,
    pub engine_size: String,
    pub oil_type: String,
    pub oil_viscosity: String,
    pub oil_quantity: f64,
}

/// Input for updating a reference row (full replacement of fields).
pub type UpdateCar = CreateCar;
