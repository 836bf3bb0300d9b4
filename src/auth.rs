//! Auth gateway: register, login, request authentication
//!
//! Orchestrates the credential store, the token service and the user table.
//! Login failure is deliberately uniform: an unknown email and a wrong
//! password produce the identical outcome, and the unknown-email path still
//! burns a hash verification so the two are also comparable in timing.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::AppError;
use crate::model::{AuthResponse, UserContext};
use crate::password;
use crate::store::MappingStore;
use crate::token::TokenService;

const MIN_PASSWORD_LEN: usize = 8;

/// A syntactically valid digest of a password nobody knows. Verified on the
/// unknown-email login path to keep its duration close to the real one.
const DUMMY_HASH: &str = "00000000000000000000000000000000:0000000000000000000000000000000000000000000000000000000000000000";

pub struct AuthGateway {
    store: Arc<dyn MappingStore>,
    tokens: TokenService,
}

impl AuthGateway {
    pub fn new(store: Arc<dyn MappingStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Registers a new user and logs them straight in.
    ///
    /// All three fields must be non-empty after trimming, the email is
    /// normalized (trim + lowercase), and the password must be at least 8
    /// characters. A duplicate email is a conflict.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("name required".into()));
        }
        let email = normalize_email(email)?;
        ensure_password_present(password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        // Key derivation is CPU-bound; keep it off the async workers.
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || password::hash(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let Some(user) = self.store.create_user(&name, &email, &password_hash)? else {
            return Err(AppError::EmailConflict);
        };

        let token = self.tokens.issue(user.id, &user.name, &user.email);
        Ok(AuthResponse {
            token,
            user: UserContext {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        })
    }

    /// Authenticates an email/password pair and issues a fresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email)?;
        ensure_password_present(password)?;

        let user = self.store.find_user_by_email(&email)?;
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());

        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || password::verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // One outcome for both failure modes; no email enumeration.
        let user = match user {
            Some(user) if matches => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        let token = self.tokens.issue(user.id, &user.name, &user.email);
        Ok(AuthResponse {
            token,
            user: UserContext {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        })
    }

    /// Resolves the caller's identity from request credentials, or `None`
    /// for anonymous. Never errors; requiring identity is the caller's
    /// policy.
    pub fn authenticate(
        &self,
        headers: &HeaderMap,
        api_key_param: Option<&str>,
    ) -> Option<UserContext> {
        let token = extract_token(headers, api_key_param)?;
        let claims = self.tokens.verify(&token)?;
        Some(UserContext {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        })
    }
}

/// Pulls a bearer credential out of a request. Priority order:
/// `Authorization: Bearer`, `Authorization: Token`, a raw `Authorization`
/// value, `X-Api-Key`, `X-Api-Token`, then the `api_key` query parameter.
pub fn extract_token(headers: &HeaderMap, api_key_param: Option<&str>) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if !value.is_empty() {
            let token = value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("Token "))
                .unwrap_or(value);
            return Some(token.to_string());
        }
    }
    for header in ["x-api-key", "x-api-token"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    api_key_param
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AppError::Validation("email required".into()));
    }
    Ok(normalized)
}

fn ensure_password_present(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::Validation("password required".into()));
    }
    Ok(())
}
