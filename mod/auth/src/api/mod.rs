mod branches;
mod login;
mod users;

pub use login::{bearer_token, cookie_value};

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Shared application state for auth handlers.
pub type AppState = Arc<AuthService>;

/// Build the complete auth API router.
///
/// All routes are relative — the caller nests them under `/auth`.
/// Authentication and the admin gate for `/users` and `/branches` are
/// applied by the server binary's middleware, not here.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new()
        .merge(login::routes())
        .merge(users::routes())
        .merge(branches::routes())
        .with_state(svc)
}
