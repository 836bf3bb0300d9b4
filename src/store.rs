//! Durable mapping store
//!
//! Persists short links and users behind the [`MappingStore`] trait. Two
//! implementations ship:
//!
//! - [`RedbStore`] - the production store, backed by an embedded redb B-tree.
//!   Write transactions give the atomic insert-if-absent semantics that the
//!   code uniqueness constraint requires.
//! - [`MemoryStore`] - a sharded in-process map, used by unit tests and as a
//!   throwaway single-instance fallback. Not suitable as the source of truth
//!   in a multi-instance deployment.
//!
//! Link records are stored as JSON strings keyed by code. A secondary index
//! keyed by `"{owner_id}:{created_micros}:{code}"` serves the per-owner
//! listing in chronological key order; listing walks it in reverse for
//! newest-first results.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::model::{ShortLink, User};

/// Main table: short code -> JSON-serialized [`ShortLink`].
const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Secondary index: `"{owner_id}:{created_micros}:{code}"` -> JSON link.
///
/// The micros timestamp keeps keys chronologically ordered; the code suffix
/// keeps them unique when two links share a timestamp.
const TABLE_OWNER_INDEX: TableDefinition<&str, &str> = TableDefinition::new("owner_index_v1");

/// User records: store-assigned id -> JSON-serialized [`User`].
const TABLE_USERS: TableDefinition<u64, &str> = TableDefinition::new("users_v1");

/// Unique-email index: normalized email -> user id.
const TABLE_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails_v1");

/// Durable persistence contract for short links and users.
///
/// `insert_link_if_absent` is the single point in the system that must be
/// atomic across concurrent writers: two creators racing on the same code
/// must see exactly one `true`.
pub trait MappingStore: Send + Sync {
    /// Inserts the link unless its code is already taken. Returns whether
    /// the insert happened.
    fn insert_link_if_absent(&self, link: &ShortLink) -> Result<bool, StoreError>;

    /// Expiry-filtered lookup: returns the link only if it has no expiry or
    /// its expiry is after `now`.
    fn find_active_link(&self, code: &str, now: DateTime<Utc>)
        -> Result<Option<ShortLink>, StoreError>;

    /// Returns up to `limit` of the owner's active links, newest first.
    fn list_links_by_owner(&self, owner_id: u64, limit: usize)
        -> Result<Vec<ShortLink>, StoreError>;

    /// Creates a user with a fresh store-assigned id. Returns `None` when
    /// the email is already registered; the uniqueness check and the insert
    /// happen in one transaction.
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Cheap liveness probe for the health endpoint.
    fn ping(&self) -> bool;
}

fn owner_index_key(owner_id: u64, created_at: DateTime<Utc>, code: &str) -> String {
    format!("{}:{}:{}", owner_id, created_at.timestamp_micros(), code)
}

/// Production store backed by an embedded redb database.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Creates or opens the database file and ensures all tables exist.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let db = Database::create(db_path).map_err(|e| StoreError::Database(e.to_string()))?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_LINKS)?;
            write_txn.open_table(TABLE_OWNER_INDEX)?;
            write_txn.open_table(TABLE_USERS)?;
            write_txn.open_table(TABLE_EMAILS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl MappingStore for RedbStore {
    fn insert_link_if_absent(&self, link: &ShortLink) -> Result<bool, StoreError> {
        let record_json = serde_json::to_string(link)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table_links = write_txn.open_table(TABLE_LINKS)?;

            if table_links.get(link.code.as_str())?.is_some() {
                // Lost the race (or the random draw collided). The caller
                // decides whether to redraw.
                return Ok(false);
            }
            table_links.insert(link.code.as_str(), record_json.as_str())?;

            if let Some(owner_id) = link.owner_id {
                let index_key = owner_index_key(owner_id, link.created_at, &link.code);
                let mut table_index = write_txn.open_table(TABLE_OWNER_INDEX)?;
                table_index.insert(index_key.as_str(), record_json.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(true)
    }

    fn find_active_link(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ShortLink>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_LINKS)?;

        let Some(guard) = table.get(code)? else {
            return Ok(None);
        };
        let link: ShortLink = serde_json::from_str(guard.value())?;

        Ok(link.is_active(now).then_some(link))
    }

    fn list_links_by_owner(
        &self,
        owner_id: u64,
        limit: usize,
    ) -> Result<Vec<ShortLink>, StoreError> {
        let now = Utc::now();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_OWNER_INDEX)?;

        // All keys of this owner fall between "{id}:" and "{id};" because
        // ';' is the ASCII successor of ':'.
        let start_key = format!("{}:", owner_id);
        let end_key = format!("{};", owner_id);

        let mut links = Vec::new();
        for row in table.range(start_key.as_str()..end_key.as_str())?.rev() {
            let (_, value) = row?;
            let link: ShortLink = serde_json::from_str(value.value())?;
            if link.is_active(now) {
                links.push(link);
                if links.len() == limit {
                    break;
                }
            }
        }

        Ok(links)
    }

    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut table_emails = write_txn.open_table(TABLE_EMAILS)?;
            if table_emails.get(email)?.is_some() {
                return Ok(None);
            }

            let mut table_users = write_txn.open_table(TABLE_USERS)?;
            let next_id = match table_users.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            let user = User {
                id: next_id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            };
            let user_json = serde_json::to_string(&user)?;

            table_users.insert(next_id, user_json.as_str())?;
            table_emails.insert(email, next_id)?;
            user
        };
        write_txn.commit()?;

        Ok(Some(user))
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table_emails = read_txn.open_table(TABLE_EMAILS)?;

        let Some(id_guard) = table_emails.get(email)? else {
            return Ok(None);
        };
        let user_id = id_guard.value();

        let table_users = read_txn.open_table(TABLE_USERS)?;
        let Some(guard) = table_users.get(user_id)? else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(guard.value())?;

        Ok(Some(user))
    }

    fn ping(&self) -> bool {
        self.db.begin_read().is_ok()
    }
}

const SHARD_COUNT: usize = 16;

/// In-process store: link records spread over a fixed set of mutex-guarded
/// shards so concurrent tests don't contend on one lock.
pub struct MemoryStore {
    link_shards: Vec<Mutex<HashMap<String, ShortLink>>>,
    users: Mutex<Vec<User>>,
    next_user_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            link_shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            users: Mutex::new(Vec::new()),
            next_user_id: AtomicU64::new(1),
        }
    }

    fn shard_for(&self, code: &str) -> &Mutex<HashMap<String, ShortLink>> {
        let mut hasher = DefaultHasher::new();
        code.hash(&mut hasher);
        &self.link_shards[(hasher.finish() as usize) % SHARD_COUNT]
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingStore for MemoryStore {
    fn insert_link_if_absent(&self, link: &ShortLink) -> Result<bool, StoreError> {
        let mut shard = self.shard_for(&link.code).lock().unwrap();
        if shard.contains_key(&link.code) {
            return Ok(false);
        }
        shard.insert(link.code.clone(), link.clone());
        Ok(true)
    }

    fn find_active_link(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ShortLink>, StoreError> {
        let shard = self.shard_for(code).lock().unwrap();
        Ok(shard.get(code).filter(|link| link.is_active(now)).cloned())
    }

    fn list_links_by_owner(
        &self,
        owner_id: u64,
        limit: usize,
    ) -> Result<Vec<ShortLink>, StoreError> {
        let now = Utc::now();
        let mut links: Vec<ShortLink> = self
            .link_shards
            .iter()
            .flat_map(|shard| {
                shard
                    .lock()
                    .unwrap()
                    .values()
                    .filter(|link| link.owner_id == Some(owner_id) && link.is_active(now))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        links.truncate(limit);
        Ok(links)
    }

    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|user| user.email == email) {
            return Ok(None);
        }

        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    fn ping(&self) -> bool {
        true
    }
}
