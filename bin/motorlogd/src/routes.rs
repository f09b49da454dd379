//! Route registration — collects all module routes + system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use auth::service::AuthService;

use crate::auth_middleware;
use crate::rate_limit::{self, RateLimiter};

/// Build the complete router with all routes.
///
/// Module routers are already `Router<()>` (they called `.with_state()`
/// internally) and get nested under `/{module_name}`. The token
/// middleware wraps everything; the rate limiter, when configured,
/// wraps that in turn so throttled requests never hit token
/// validation.
pub fn build_router(
    auth_service: Arc<AuthService>,
    module_routes: Vec<(&str, Router)>,
    limiter: Option<Arc<RateLimiter>>,
) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app = app.layer(middleware::from_fn_with_state(
        auth_service,
        auth_middleware::auth_middleware,
    ));

    if let Some(limiter) = limiter {
        app = app.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ));
    }

    app
}

async fn index() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "motorlogd",
        "message": "see /health and /version",
    }))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "motorlogd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
