//! Route definitions
//!
//! Maps the HTTP surface onto the handlers. The bare `GET /{code}` redirect
//! is the hot path; everything else is API plumbing.

use axum::routing::{get, post};
use axum::Router;

use crate::handler::{health, info, list_urls, login, register, resolve, shorten, AppState};

/// Builds the application router.
///
/// # Routes
///
/// - `POST /shorten` - create a short link (auth required)
/// - `GET /{code}` - redirect to the target URL (public)
/// - `GET /info/{code}` - link metadata without the expiry timestamp (public)
/// - `GET /urls` - the caller's links, newest first (auth required)
/// - `POST /register` - create an account
/// - `POST /login` - exchange credentials for a token
/// - `GET /health` - store liveness probe
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/shorten", post(shorten))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/urls", get(list_urls))
        .route("/info/{code}", get(info))
        .route("/health", get(health))
        // Static routes take priority over this parameter route.
        .route("/{code}", get(resolve))
        .with_state(state)
}
