//! Transient lookup-result caches.
//!
//! Search results and per-artist song lists use the same mechanics as the
//! chord-sheet cache — hashed keys, TTL, touch-on-read, score-based
//! eviction — but have no saved partition: every row is eviction- and
//! TTL-eligible. Each namespace gets its own table, TTL, and size bound.

use super::connection::StoreDb;
use super::key::query_cache_key;
use super::sweep::{CachePolicy, eviction_victims};
use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A song reference as produced by search or artist-page scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SongSummary {
    pub artist: String,
    pub title: String,
    /// Absolute URL of the song page on the source site.
    pub url: String,
}

/// Cache namespace for transient lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultNamespace {
    Search,
    ArtistSongs,
}

impl ResultNamespace {
    const fn table(self) -> &'static str {
        match self {
            ResultNamespace::Search => "search_results",
            ResultNamespace::ArtistSongs => "artist_songs",
        }
    }

    /// Namespace label mixed into the key hash and used in logs.
    const fn label(self) -> &'static str {
        match self {
            ResultNamespace::Search => "search",
            ResultNamespace::ArtistSongs => "artist-songs",
        }
    }
}

/// TTL-only cache of lookup results for one namespace.
#[derive(Clone, Debug)]
pub struct ResultsCache {
    db: StoreDb,
    namespace: ResultNamespace,
    policy: CachePolicy,
}

impl ResultsCache {
    pub fn new(db: StoreDb, namespace: ResultNamespace, policy: CachePolicy) -> Self {
        Self { db, namespace, policy }
    }

    /// Look up cached results for a query.
    ///
    /// Equivalent queries hit the same row via normalization. Expired and
    /// corrupt rows are deleted and reported as None; hits bump the row's
    /// bookkeeping best-effort.
    pub async fn get<T: DeserializeOwned>(&self, query: &str) -> Result<Option<Vec<T>>, Error> {
        let key = query_cache_key(self.namespace.label(), query);
        let table = self.namespace.table();

        let select = format!("SELECT results_json, timestamp FROM {table} WHERE key = ?1");
        let key_for_select = key.clone();
        let row: Option<(String, i64)> = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(String, i64)>, Error> {
                let result = conn.query_row(&select, params![key_for_select], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                });
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((results_json, timestamp)) = row else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp_millis();
        if now - timestamp > self.policy.ttl_ms {
            tracing::debug!(namespace = self.namespace.label(), "cached results expired, dropping");
            self.delete_key(&key).await?;
            return Ok(None);
        }

        let results = match serde_json::from_str::<Vec<T>>(&results_json) {
            Ok(results) => results,
            Err(e) => {
                let err = Error::MalformedPayload(e.to_string());
                tracing::warn!(namespace = self.namespace.label(), "dropping corrupt result entry: {err}");
                self.delete_key(&key).await?;
                return Ok(None);
            }
        };

        if let Err(e) = self.touch(&key, now).await {
            tracing::warn!(namespace = self.namespace.label(), "failed to touch result entry: {e}");
        }

        Ok(Some(results))
    }

    /// Insert or update the cached results for a query.
    ///
    /// A quota failure triggers one eviction sweep and a single retry.
    pub async fn store<T: Serialize>(&self, query: &str, results: &[T]) -> Result<(), Error> {
        let key = query_cache_key(self.namespace.label(), query);
        let results_json = serde_json::to_string(results)
            .map_err(|e| Error::InvalidInput(format!("failed to serialize results: {e}")))?;
        let now = chrono::Utc::now().timestamp_millis();

        match self.upsert(&key, query, &results_json, now).await {
            Err(Error::QuotaExceeded(msg)) => {
                tracing::warn!(
                    namespace = self.namespace.label(),
                    "storage quota hit, evicting and retrying: {msg}"
                );
                self.evict_over_capacity().await?;
                self.upsert(&key, query, &results_json, now).await?;
            }
            other => other?,
        }

        if let Err(e) = self.purge_expired().await {
            tracing::warn!(namespace = self.namespace.label(), "expiration sweep failed: {e}");
        }
        if let Err(e) = self.evict_over_capacity().await {
            tracing::warn!(namespace = self.namespace.label(), "eviction sweep failed: {e}");
        }

        Ok(())
    }

    /// Delete expired entries. Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let table = self.namespace.table();
        let cutoff = chrono::Utc::now().timestamp_millis() - self.policy.ttl_ms;
        let delete = format!("DELETE FROM {table} WHERE timestamp < ?1");
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(&delete, params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Evict lowest-scoring entries until at or under the size bound.
    ///
    /// Returns the number of deleted entries.
    pub async fn evict_over_capacity(&self) -> Result<u64, Error> {
        let table = self.namespace.table();
        let max_entries = self.policy.max_entries;
        let weights = self.policy.weights;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let select = format!("SELECT key, timestamp, access_count FROM {table} ORDER BY rowid ASC");
        let delete = format!("DELETE FROM {table} WHERE key = ?1");
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let mut stmt = conn.prepare(&select)?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<(String, i64, i64)>, _>>()?;
                drop(stmt);

                let victims = eviction_victims(rows, max_entries, weights, now_ms);
                let mut deleted = 0u64;
                let mut stmt = conn.prepare(&delete)?;
                for key in &victims {
                    deleted += stmt.execute(params![key])? as u64;
                }
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count for this namespace.
    pub async fn count(&self) -> Result<i64, Error> {
        let count_sql = format!("SELECT COUNT(*) FROM {}", self.namespace.table());
        self.db
            .conn
            .call(move |conn| -> Result<i64, Error> {
                let count = conn.query_row(&count_sql, [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    async fn upsert(&self, key: &str, query: &str, results_json: &str, now: i64) -> Result<(), Error> {
        let table = self.namespace.table();
        let sql = format!(
            "INSERT INTO {table} (key, query, results_json, timestamp, access_count)
             VALUES (?1, ?2, ?3, ?4, 0)
             ON CONFLICT(key) DO UPDATE SET
                 query = excluded.query,
                 results_json = excluded.results_json,
                 timestamp = excluded.timestamp,
                 access_count = excluded.access_count"
        );
        let key = key.to_string();
        let query = query.to_string();
        let results_json = results_json.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, params![key, query, results_json, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_key(&self, key: &str) -> Result<(), Error> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", self.namespace.table());
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn touch(&self, key: &str, now: i64) -> Result<(), Error> {
        let sql = format!(
            "UPDATE {} SET access_count = access_count + 1, timestamp = ?2 WHERE key = ?1",
            self.namespace.table()
        );
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, params![key, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
