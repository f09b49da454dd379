use serde::{Deserialize, Serialize};

/// Role claim carried in JWTs and stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A login identity tied to a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Login name (unique).
    pub username: String,

    /// Argon2id password hash. Never leaves the service layer.
    pub password_hash: String,

    /// Display name.
    pub name: String,

    /// Role for access control.
    pub role: Role,

    /// Branch affiliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Public projection of a user — everything except the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            role: u.role,
            branch_id: u.branch_id,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub branch_id: Option<String>,
}

/// Input for updating a user. Password is re-hashed only when present.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_role() -> Role {
    Role::Employee
}
