use serde::{Deserialize, Serialize};

/// A workshop location. Operations and users reference a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Branch name (unique).
    pub name: String,

    /// City / address.
    pub location: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBranch {
    pub name: String,
    pub location: String,
}

/// Input for updating a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBranch {
    pub name: String,
    pub location: String,
}
