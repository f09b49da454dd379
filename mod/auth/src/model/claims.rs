use serde::{Deserialize, Serialize};

use crate::model::Role;

/// JWT claims payload for both access and refresh tokens.
///
/// Refresh tokens carry `refresh: true` and a longer expiry; the refresh
/// endpoint rejects access tokens and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Role for access control.
    pub role: Role,
    /// Branch affiliation.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// True for refresh tokens.
    #[serde(default)]
    pub refresh: bool,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}
