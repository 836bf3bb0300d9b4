//! HTTP request handlers
//!
//! Thin adapters between axum and the core services: they extract inputs,
//! call the resolution engine or auth gateway, and map results onto the wire
//! shapes. All failure paths go through [`AppError`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthGateway;
use crate::error::AppError;
use crate::model::{ListParams, LoginRequest, RegisterRequest, ShortenRequest, UserContext};
use crate::shortener::ResolutionEngine;
use crate::store::MappingStore;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResolutionEngine>,
    pub auth: Arc<AuthGateway>,
    pub store: Arc<dyn MappingStore>,
}

/// Query fallback for endpoints that accept `?api_key=`.
#[derive(Deserialize, Default)]
pub struct AuthQuery {
    pub api_key: Option<String>,
}

fn require_user(
    state: &AppState,
    headers: &HeaderMap,
    api_key: Option<&str>,
) -> Result<UserContext, AppError> {
    state
        .auth
        .authenticate(headers, api_key)
        .ok_or(AppError::AuthRequired)
}

/// `POST /shorten` - creates a short link owned by the authenticated caller.
pub async fn shorten(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuthQuery>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Response, AppError> {
    let user = require_user(&state, &headers, query.api_key.as_deref())?;
    let created = state.engine.create(&payload.url, payload.ttl, user.id)?;
    tracing::info!(code = %created.code, owner = user.id, "short link created");
    Ok(Json(created).into_response())
}

/// `GET /{code}` - redirects to the target URL with a 302.
pub async fn resolve(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let url = state.engine.resolve(&code)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// `GET /info/{code}` - reports the target and whether an expiry is set.
pub async fn info(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let info = state.engine.info(&code)?;
    Ok(Json(info).into_response())
}

/// `GET /urls?limit=` - lists the caller's links, newest first.
pub async fn list_urls(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let user = require_user(&state, &headers, params.api_key.as_deref())?;
    let links = state.engine.list_owned(user.id, params.limit)?;
    Ok(Json(json!({ "data": links })).into_response())
}

/// `POST /register` - creates a user and returns a fresh token.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let out = state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    tracing::info!(user = out.user.id, "user registered");
    Ok(Json(out).into_response())
}

/// `POST /login` - authenticates credentials and returns a fresh token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let out = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(out).into_response())
}

/// `GET /health` - liveness probe against the durable store.
pub async fn health(State(state): State<AppState>) -> Response {
    if state.store.ping() {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "db-unavailable").into_response()
    }
}
