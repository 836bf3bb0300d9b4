//! Data models for the link shortener
//!
//! Defines the durable records (short links, users), the token claims, and
//! the request/response shapes used by the HTTP handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One code -> URL binding, as stored durably.
///
/// A link with a non-null `expires_at` in the past is logically deleted: no
/// read operation returns it, even though it may still occupy a storage slot
/// until external cleanup reclaims it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShortLink {
    /// Fixed-width base62 code, the primary key.
    pub code: String,

    /// The redirect destination. Never empty.
    pub url: String,

    /// Absolute expiry; `None` means the link never expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// Owning user. `None` only for legacy/unowned records.
    pub owner_id: Option<u64>,

    /// Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Whether the link is live at `now` (no expiry, or expiry in the future).
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }
}

/// A registered principal.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    /// Store-assigned, unique.
    pub id: u64,
    pub name: String,
    /// Normalized (trimmed, lower-cased), unique.
    pub email: String,
    /// Salted PBKDF2 digest, never the raw password. API responses use
    /// [`UserContext`], so this never leaves the store layer.
    pub password_hash: String,
}

/// Verified identity of a caller, reconstructed from token claims.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserContext {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Claims carried inside an issued token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

/// Request payload for `POST /shorten`.
#[derive(Deserialize)]
pub struct ShortenRequest {
    pub url: String,

    /// Lifetime in seconds; absent or non-positive means the link never
    /// expires.
    #[serde(default)]
    pub ttl: i64,
}

/// Response for a successful `POST /shorten`.
#[derive(Serialize, Debug)]
pub struct ShortenResponse {
    pub code: String,
    pub short: String,
}

/// Response for `GET /info/{code}`.
#[derive(Serialize, Debug)]
pub struct InfoResponse {
    pub code: String,
    pub url: String,
    /// Whether the link carries an expiry. The timestamp itself is not
    /// exposed.
    pub ttl_active: bool,
}

/// One entry of `GET /urls`.
#[derive(Serialize)]
pub struct LinkSummary {
    pub code: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub ttl_active: bool,
}

impl From<ShortLink> for LinkSummary {
    fn from(link: ShortLink) -> Self {
        Self {
            code: link.code,
            url: link.url,
            created_at: link.created_at,
            ttl_active: link.expires_at.is_some(),
        }
    }
}

/// Query parameters for `GET /urls`.
#[derive(Deserialize, Default)]
pub struct ListParams {
    /// Page size, clamped to [1, 200]. Defaults to 50.
    pub limit: Option<usize>,
    /// Token fallback for clients that cannot set headers.
    pub api_key: Option<String>,
}

/// Request payload for `POST /register`.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful register/login.
#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserContext,
}
