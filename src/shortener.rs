//! Resolution engine: create, resolve, info, list
//!
//! Orchestrates the codec, the mapping store and the cache. The store is
//! authoritative; the cache only shaves latency off the resolve path and its
//! failures are logged and swallowed.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::cache::UrlCache;
use crate::codec;
use crate::error::AppError;
use crate::model::{InfoResponse, LinkSummary, ShortLink, ShortenResponse};
use crate::store::MappingStore;

/// Attempts before a create gives up on drawing a free code. At 62^7 keys a
/// genuine collision is astronomically unlikely; the bound exists so a
/// pathological RNG cannot loop forever.
const CODE_RETRY_BUDGET: u32 = 5;

/// Cache TTL used at create time for links without their own expiry. Keeps
/// hot permanent links fast without growing the cache unboundedly.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 86_400;

/// Cache TTL for the backfill after a store hit on the resolve path. Kept
/// short: the backfill is a defensive accelerator, not the authoritative
/// expiry, and this window bounds how long cache staleness can outlive
/// store-side expiry.
const BACKFILL_CACHE_TTL_SECONDS: u64 = 300;

/// Limit clamp for [`ResolutionEngine::list_owned`].
const LIST_LIMIT_MIN: usize = 1;
const LIST_LIMIT_MAX: usize = 200;
pub const LIST_LIMIT_DEFAULT: usize = 50;

pub struct ResolutionEngine {
    store: Arc<dyn MappingStore>,
    cache: Arc<dyn UrlCache>,
    base_url: String,
}

impl ResolutionEngine {
    pub fn new(store: Arc<dyn MappingStore>, cache: Arc<dyn UrlCache>, base_url: String) -> Self {
        Self {
            store,
            cache,
            base_url,
        }
    }

    /// Creates a new short link owned by `owner_id`.
    ///
    /// Draws random codes until the store's insert-if-absent succeeds, up to
    /// the retry budget. With `ttl_seconds > 0` the record carries an
    /// absolute expiry; otherwise it never expires. The new binding is
    /// written through to the cache; a cache failure never fails the create.
    pub fn create(
        &self,
        url: &str,
        ttl_seconds: i64,
        owner_id: u64,
    ) -> Result<ShortenResponse, AppError> {
        if url.trim().is_empty() {
            return Err(AppError::Validation("url cannot be empty".into()));
        }

        let now = Utc::now();
        let expires_at = if ttl_seconds > 0 {
            // try_seconds rejects magnitudes chrono cannot represent, and
            // checked_add_signed rejects timestamps past the calendar range.
            let expiry = Duration::try_seconds(ttl_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| AppError::Validation("ttl out of range".into()))?;
            Some(expiry)
        } else {
            None
        };

        let mut rng = rand::rng();
        for attempt in 1..=CODE_RETRY_BUDGET {
            let code = codec::encode(rng.random::<u64>());
            let link = ShortLink {
                code: code.clone(),
                url: url.to_string(),
                expires_at,
                owner_id: Some(owner_id),
                created_at: now,
            };

            if self.store.insert_link_if_absent(&link)? {
                let cache_ttl = if ttl_seconds > 0 {
                    StdDuration::from_secs(ttl_seconds as u64)
                } else {
                    StdDuration::from_secs(DEFAULT_CACHE_TTL_SECONDS)
                };
                if let Err(err) = self.cache.set(&code, url, cache_ttl) {
                    tracing::warn!(code = %code, error = %err, "cache write-through failed");
                }

                return Ok(ShortenResponse {
                    short: format!("{}/{}", self.base_url, code),
                    code,
                });
            }

            tracing::debug!(code = %code, attempt, "code collision, redrawing");
        }

        Err(AppError::CollisionExhausted)
    }

    /// Resolves a code to its target URL.
    ///
    /// Cache hits return without touching the store. On a miss the store is
    /// read with the expiry filter; a store hit backfills the cache on a
    /// detached task with a short fixed TTL. A store miss is terminal.
    pub fn resolve(&self, code: &str) -> Result<String, AppError> {
        match self.cache.get(code) {
            Ok(Some(url)) => {
                tracing::debug!(code = %code, "cache hit");
                return Ok(url);
            }
            Ok(None) => {}
            Err(err) => {
                // Indistinguishable from a miss; degrade to store latency.
                tracing::warn!(code = %code, error = %err, "cache read failed");
            }
        }

        let link = self
            .store
            .find_active_link(code, Utc::now())?
            .ok_or(AppError::NotFound)?;

        let cache = Arc::clone(&self.cache);
        let backfill_code = code.to_string();
        let backfill_url = link.url.clone();
        tokio::spawn(async move {
            if let Err(err) = cache.set(
                &backfill_code,
                &backfill_url,
                StdDuration::from_secs(BACKFILL_CACHE_TTL_SECONDS),
            ) {
                tracing::warn!(code = %backfill_code, error = %err, "cache backfill failed");
            }
        });

        Ok(link.url)
    }

    /// Reports a code's target and whether it carries an expiry. Always
    /// reads the store directly, never the cache.
    pub fn info(&self, code: &str) -> Result<InfoResponse, AppError> {
        let link = self
            .store
            .find_active_link(code, Utc::now())?
            .ok_or(AppError::NotFound)?;

        Ok(InfoResponse {
            code: link.code,
            url: link.url,
            ttl_active: link.expires_at.is_some(),
        })
    }

    /// Lists the owner's links, newest first, with the limit clamped to a
    /// sane range. Listing is not latency-critical, so the cache is not
    /// involved.
    pub fn list_owned(&self, owner_id: u64, limit: Option<usize>) -> Result<Vec<LinkSummary>, AppError> {
        let limit = limit
            .unwrap_or(LIST_LIMIT_DEFAULT)
            .clamp(LIST_LIMIT_MIN, LIST_LIMIT_MAX);

        let links = self.store.list_links_by_owner(owner_id, limit)?;
        Ok(links.into_iter().map(LinkSummary::from).collect())
    }
}
