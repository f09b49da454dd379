use serde::{Deserialize, Serialize};

/// The authenticated principal for the current request.
///
/// The server binary's auth middleware validates the JWT and inserts an
/// Actor into request extensions; module handlers extract it without
/// needing to know about tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// User id.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Branch affiliation, if any.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// True when the role claim is `admin`.
    pub admin: bool,
}
