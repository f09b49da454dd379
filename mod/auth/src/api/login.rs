use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use motorlog_core::ServiceError;

use crate::api::AppState;
use crate::model::{Claims, TokenPair, UserPublic};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// POST /auth/login — verify credentials, issue tokens, set cookies.
async fn login(
    State(svc): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ServiceError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ServiceError::Validation(
            "username and password required".into(),
        ));
    }

    let user = svc
        .verify_credentials(&body.username, &body.password)
        .map_err(ServiceError::from)?;
    let tokens = svc.issue_tokens(&user).map_err(ServiceError::from)?;

    tracing::info!(username = %user.username, "user logged in");

    let body = serde_json::json!({
        "access_token": tokens.access_token,
        "token_type": tokens.token_type,
        "expires_in": tokens.expires_in,
        "user": UserPublic::from(user),
    });

    Ok((token_cookies(&tokens, svc.config().refresh_ttl_secs), Json(body)).into_response())
}

/// POST /auth/token/refresh — rotate tokens from the refresh cookie.
///
/// Falls back to a Bearer refresh token for non-browser clients. On any
/// failure both cookies are cleared so the client drops stale state.
async fn refresh(State(svc): State<AppState>, headers: HeaderMap) -> Response {
    let token = cookie_value(&headers, "refreshToken")
        .or_else(|| bearer_token(&headers))
        .map(|t| t.to_string());

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            clear_cookies(),
            Json(serde_json::json!({"code": "UNAUTHENTICATED", "message": "refresh token not found"})),
        )
            .into_response();
    };

    match svc.refresh_tokens(&token) {
        Ok(tokens) => {
            let body = serde_json::json!({
                "access_token": tokens.access_token,
                "token_type": tokens.token_type,
                "expires_in": tokens.expires_in,
            });
            (token_cookies(&tokens, svc.config().refresh_ttl_secs), Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            clear_cookies(),
            Json(serde_json::json!({"code": "UNAUTHENTICATED", "message": e.to_string()})),
        )
            .into_response(),
    }
}

/// POST /auth/logout — clear both auth cookies.
async fn logout() -> Response {
    (
        clear_cookies(),
        Json(serde_json::json!({"message": "logged out"})),
    )
        .into_response()
}

/// GET /auth/me — current user resolved from JWT claims.
async fn me(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserPublic>, ServiceError> {
    let user = svc.get_user(&claims.sub).map_err(ServiceError::from)?;
    Ok(Json(user))
}

/// Set-Cookie headers for a freshly issued token pair.
fn token_cookies(tokens: &TokenPair, refresh_max_age: i64) -> [(header::HeaderName, String); 2] {
    [
        (
            header::SET_COOKIE,
            format!(
                "accessToken={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
                tokens.access_token, tokens.expires_in
            ),
        ),
        (
            header::SET_COOKIE,
            format!(
                "refreshToken={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
                tokens.refresh_token, refresh_max_age
            ),
        ),
    ]
}

/// Set-Cookie headers that expire both auth cookies.
fn clear_cookies() -> [(header::HeaderName, String); 2] {
    [
        (
            header::SET_COOKIE,
            "accessToken=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0".to_string(),
        ),
        (
            header::SET_COOKIE,
            "refreshToken=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0".to_string(),
        ),
    ]
}

/// Extract a named cookie from the Cookie header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

/// Extract a Bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "accessToken=abc; refreshToken=xyz".parse().unwrap(),
        );
        assert_eq!(cookie_value(&headers, "refreshToken"), Some("xyz"));
        assert_eq!(cookie_value(&headers, "accessToken"), Some("abc"));
        assert_eq!(cookie_value(&headers, "other"), None);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer tok123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok123"));

        headers.insert(header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
