//! Token authentication and the admin gate.
//!
//! Accepts `Authorization: Bearer <token>` or the `accessToken` cookie
//! set by login, validates the access token, and stores both the raw
//! `Claims` and a `motorlog_core::Actor` in request extensions so
//! module handlers can attribute actions without depending on the auth
//! crate.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use auth::api::{bearer_token, cookie_value};
use auth::service::AuthService;
use motorlog_core::{Actor, ServiceError};

pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers())
        .or_else(|| cookie_value(request.headers(), "accessToken"))
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization token".into()))?;

    let claims = auth
        .verify_access_token(&token)
        .map_err(ServiceError::from)?;

    let admin = claims.role.is_admin();
    if requires_admin(&path, request.method()) && !admin {
        return Err(ServiceError::PermissionDenied(format!(
            "user {} may not access {} {}",
            claims.username,
            request.method(),
            path,
        )));
    }

    let actor = Actor {
        user_id: claims.sub.clone(),
        name: claims.name.clone(),
        branch_id: claims.branch_id.clone(),
        admin,
    };
    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Endpoints reachable without a token.
fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/health" | "/version")
        || path.starts_with("/auth/login")
        || path.starts_with("/auth/token/refresh")
}

/// Administrative routes: user and branch management, reference-table
/// writes, and operation deletion.
fn requires_admin(path: &str, method: &Method) -> bool {
    if path.starts_with("/auth/users") || path.starts_with("/auth/branches") {
        return true;
    }
    if path.starts_with("/workshop/cars") {
        return *method == Method::POST || *method == Method::PUT || *method == Method::DELETE;
    }
    if path.starts_with("/workshop/operations") {
        return *method == Method::DELETE;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/health"));
        assert!(is_public_path("/auth/login"));
        assert!(is_public_path("/auth/token/refresh"));
        assert!(!is_public_path("/auth/me"));
        assert!(!is_public_path("/workshop/operations"));
    }

    #[test]
    fn test_admin_gate() {
        assert!(requires_admin("/auth/users", &Method::GET));
        assert!(requires_admin("/auth/branches/abc", &Method::PUT));
        assert!(requires_admin("/workshop/cars", &Method::POST));
        assert!(requires_admin("/workshop/cars/abc", &Method::DELETE));
        assert!(!requires_admin("/workshop/cars", &Method::GET));
        assert!(!requires_admin("/workshop/cars/search", &Method::GET));
        assert!(requires_admin("/workshop/operations/abc", &Method::DELETE));
        assert!(!requires_admin("/workshop/operations", &Method::POST));
        assert!(!requires_admin("/workshop/reports/stats", &Method::GET));
    }
}
