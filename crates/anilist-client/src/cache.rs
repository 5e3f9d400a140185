//! Request cache for GraphQL responses.
//!
//! Responses are keyed by query text, canonical variables and user name, and
//! stay valid until their expiry time passes or the mutation epoch moves on.
//! Finding an invalid entry purges every invalid entry in the store.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use shared::{Clock, Database, SystemClock};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Mutation counter, bumped after every authenticated mutation
pub type Epoch = u32;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache (
    query TEXT,
    variables TEXT,
    user TEXT DEFAULT '',
    data BLOB,
    expiry_time INTEGER,
    version INTEGER,
    PRIMARY KEY (query, variables, user)
)";

/// A cached response
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub query: String,
    pub variables: String,
    pub user: String,
    pub data: Value,
    /// Unix milliseconds
    pub expiry_time: i64,
    pub version: Epoch,
}

/// Result of [`RequestCache::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Stored,
    /// A valid entry already holds the key; it was left untouched
    AlreadyExists,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
}

/// SQLite-backed request cache
pub struct RequestCache {
    db: Database,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

/// Canonical text form of a variables map
///
/// Object keys come out sorted, so equal maps always give equal strings.
pub fn canonical_variables<V: Serialize + ?Sized>(variables: &V) -> Result<String> {
    let value = serde_json::to_value(variables).context("Failed to serialize variables")?;
    serde_json::to_string(&value).context("Failed to serialize variables")
}

impl RequestCache {
    /// Open or create the cache at `path`, using the system clock
    pub fn open(path: impl AsRef<Path>, ttl_ms: i64) -> Result<Self> {
        Self::with_clock(path, ttl_ms, Arc::new(SystemClock))
    }

    /// Open or create the cache at `path` with a custom clock
    pub fn with_clock(path: impl AsRef<Path>, ttl_ms: i64, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Database::open(path).context("Failed to open cache database")?;
        db.execute_batch(SCHEMA)
            .context("Failed to create cache table")?;

        info!(path = %db.path().display(), ttl_ms, "Request cache initialized");

        Ok(Self { db, ttl_ms, clock })
    }

    /// Look up a response
    ///
    /// Returns `None` on a miss. An entry that has expired or was written
    /// under another epoch counts as a miss, and every such entry is deleted.
    pub fn get<V: Serialize + ?Sized>(
        &self,
        query: &str,
        variables: &V,
        user: Option<&str>,
        epoch: Epoch,
    ) -> Result<Option<CacheEntry>> {
        let variables = canonical_variables(variables)?;
        let user = user.unwrap_or("");

        self.db
            .with_connection(|conn| self.lookup(conn, query, &variables, user, epoch))
    }

    /// Store a response unless a valid one is already cached
    pub fn set<V: Serialize + ?Sized>(
        &self,
        query: &str,
        variables: &V,
        user: Option<&str>,
        data: &Value,
        epoch: Epoch,
    ) -> Result<SetOutcome> {
        let variables = canonical_variables(variables)?;
        let user = user.unwrap_or("");
        let blob = serde_json::to_vec(data).context("Failed to serialize response")?;

        self.db.with_connection(|conn| {
            if self.lookup(conn, query, &variables, user, epoch)?.is_some() {
                debug!(user, "Cache entry already exists");
                return Ok(SetOutcome::AlreadyExists);
            }

            let expiry_time = self.clock.now_ms() + self.ttl_ms;
            conn.execute(
                "INSERT INTO cache (query, variables, user, data, expiry_time, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![query, variables, user, blob, expiry_time, epoch],
            )
            .context("Failed to insert cache entry")?;

            debug!(user, expiry_time, epoch, "Cache stored");
            Ok(SetOutcome::Stored)
        })
    }

    fn lookup(
        &self,
        conn: &Connection,
        query: &str,
        variables: &str,
        user: &str,
        epoch: Epoch,
    ) -> Result<Option<CacheEntry>> {
        let row: Option<(Vec<u8>, i64, Epoch)> = conn
            .query_row(
                "SELECT data, expiry_time, version FROM cache
                 WHERE query = ?1 AND variables = ?2 AND user = ?3",
                params![query, variables, user],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("Failed to query cache")?;

        let Some((blob, expiry_time, version)) = row else {
            debug!(user, "Cache miss");
            return Ok(None);
        };

        let now = self.clock.now_ms();
        if now >= expiry_time || version != epoch {
            let purged = Self::purge(conn, now, epoch)?;
            debug!(
                user,
                expired = now >= expiry_time,
                stored_epoch = version,
                epoch,
                purged,
                "Cache entry invalid, purged stale entries"
            );
            return Ok(None);
        }

        let data = serde_json::from_slice(&blob).context("Failed to parse cached response")?;
        debug!(user, "Cache hit");

        Ok(Some(CacheEntry {
            query: query.to_string(),
            variables: variables.to_string(),
            user: user.to_string(),
            data,
            expiry_time,
            version,
        }))
    }

    fn purge(conn: &Connection, now: i64, epoch: Epoch) -> Result<usize> {
        conn.execute(
            "DELETE FROM cache WHERE expiry_time <= ?1 OR version != ?2",
            params![now, epoch],
        )
        .context("Failed to purge cache entries")
    }

    /// Delete every expired or out-of-epoch entry
    pub fn purge_expired(&self, epoch: Epoch) -> Result<usize> {
        let now = self.clock.now_ms();
        let purged = self.db.with_connection(|conn| Self::purge(conn, now, epoch))?;
        if purged > 0 {
            info!(purged, epoch, "Purged stale cache entries");
        }
        Ok(purged)
    }

    /// Delete every entry
    pub fn clear(&self) -> Result<usize> {
        let removed = self.db.with_connection(|conn| {
            conn.execute("DELETE FROM cache", [])
                .context("Failed to clear cache")
        })?;
        info!(removed, "Cache cleared");
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        self.db.with_connection(|conn| {
            let (count, size): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(data)), 0) FROM cache",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(CacheStats {
                total_entries: count as usize,
                total_size_bytes: size as u64,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::ManualClock;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const TTL: i64 = 60_000;
    const START: i64 = 1_700_000_000_000;

    fn open_cache(dir: &TempDir) -> Result<(RequestCache, Arc<ManualClock>)> {
        let clock = Arc::new(ManualClock::new(START));
        let cache = RequestCache::with_clock(dir.path().join("cache.db"), TTL, clock.clone())?;
        Ok((cache, clock))
    }

    #[test]
    fn test_cache_miss() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;

        assert_eq!(cache.get("Q", "V", None, 0)?, None);

        Ok(())
    }

    #[test]
    fn test_set_then_get_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;
        let payload = json!({ "data": { "Page": { "media": [{ "id": 1 }] } } });

        assert_eq!(cache.set("Q", "V", Some("alice"), &payload, 1)?, SetOutcome::Stored);

        let first = cache.get("Q", "V", Some("alice"), 1)?.expect("hit");
        let second = cache.get("Q", "V", Some("alice"), 1)?.expect("hit");
        assert_eq!(first.data, payload);
        assert_eq!(first, second);
        assert_eq!(first.expiry_time, START + TTL);

        Ok(())
    }

    #[test]
    fn test_set_does_not_overwrite() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;
        let payload = json!({ "n": 1 });
        let payload2 = json!({ "n": 2 });

        assert_eq!(cache.set("Q", "V", Some("alice"), &payload, 1)?, SetOutcome::Stored);
        assert_eq!(
            cache.set("Q", "V", Some("alice"), &payload2, 1)?,
            SetOutcome::AlreadyExists
        );

        let entry = cache.get("Q", "V", Some("alice"), 1)?.expect("hit");
        assert_eq!(entry.data, payload);

        Ok(())
    }

    #[test]
    fn test_expiry_boundary() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, clock) = open_cache(&temp_dir)?;
        cache.set("Q", "V", None, &json!(1), 0)?;

        clock.set(START + TTL - 1);
        assert!(cache.get("Q", "V", None, 0)?.is_some());

        clock.set(START + TTL + 1);
        assert!(cache.get("Q", "V", None, 0)?.is_none());

        // the expired row is gone, so moving back in time does not revive it
        clock.set(START);
        assert!(cache.get("Q", "V", None, 0)?.is_none());

        Ok(())
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, clock) = open_cache(&temp_dir)?;
        cache.set("Q", "V", None, &json!(1), 0)?;

        clock.set(START + TTL);
        assert!(cache.get("Q", "V", None, 0)?.is_none());
        assert_eq!(cache.stats()?.total_entries, 0);

        Ok(())
    }

    #[test]
    fn test_epoch_mismatch_purges() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;
        cache.set("Q", "V", Some("alice"), &json!("old"), 1)?;

        assert!(cache.get("Q", "V", Some("alice"), 2)?.is_none());
        assert_eq!(cache.stats()?.total_entries, 0);

        assert_eq!(cache.set("Q", "V", Some("alice"), &json!("new"), 2)?, SetOutcome::Stored);
        assert_eq!(cache.get("Q", "V", Some("alice"), 2)?.expect("hit").data, json!("new"));

        Ok(())
    }

    #[test]
    fn test_invalid_hit_purges_all_stale_rows() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;
        cache.set("A", "V", None, &json!(1), 1)?;
        cache.set("B", "V", None, &json!(2), 1)?;
        cache.set("C", "V", None, &json!(3), 2)?;
        assert_eq!(cache.stats()?.total_entries, 3);

        assert!(cache.get("A", "V", None, 2)?.is_none());

        // B was never looked up but shares A's stale epoch
        assert_eq!(cache.stats()?.total_entries, 1);
        assert!(cache.get("C", "V", None, 2)?.is_some());

        Ok(())
    }

    #[test]
    fn test_key_includes_user() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;
        cache.set("Q", "V", Some("alice"), &json!("alice"), 0)?;
        cache.set("Q", "V", None, &json!("anonymous"), 0)?;

        assert_eq!(cache.get("Q", "V", Some("alice"), 0)?.expect("hit").data, json!("alice"));
        assert_eq!(cache.get("Q", "V", Some(""), 0)?.expect("hit").data, json!("anonymous"));
        assert!(cache.get("Q", "V", Some("bob"), 0)?.is_none());

        Ok(())
    }

    #[test]
    fn test_variables_are_canonical() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, _) = open_cache(&temp_dir)?;

        let mut first = HashMap::new();
        first.insert("type", json!("ANIME"));
        first.insert("sort", json!(["TRENDING_DESC"]));
        cache.set("Q", &first, None, &json!("x"), 0)?;

        let second = json!({ "sort": ["TRENDING_DESC"], "type": "ANIME" });
        let entry = cache.get("Q", &second, None, 0)?.expect("hit");
        assert_eq!(entry.variables, r#"{"sort":["TRENDING_DESC"],"type":"ANIME"}"#);

        Ok(())
    }

    #[test]
    fn test_purge_and_clear() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, clock) = open_cache(&temp_dir)?;
        cache.set("A", "V", None, &json!(1), 0)?;
        clock.advance(TTL / 2);
        cache.set("B", "V", None, &json!(2), 0)?;

        clock.advance(TTL / 2);
        assert_eq!(cache.purge_expired(0)?, 1);

        let stats = cache.stats()?;
        assert_eq!(stats.total_entries, 1);
        assert!(stats.total_size_bytes > 0);

        assert_eq!(cache.clear()?, 1);
        assert_eq!(cache.stats()?.total_entries, 0);

        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (cache, clock) = open_cache(&temp_dir)?;
        cache.set("Q", "V", None, &json!({ "a": 1 }), 0)?;
        drop(cache);

        let reopened = RequestCache::with_clock(temp_dir.path().join("cache.db"), TTL, clock)?;
        assert!(reopened.get("Q", "V", None, 0)?.is_some());

        Ok(())
    }
}
