//! Expiration and eviction for the unsaved partition.
//!
//! Two independent mechanisms, both restricted to `saved = 'unsaved'` rows:
//! TTL expiration deletes rows older than the namespace TTL; size-bounded
//! eviction removes the lowest-scoring rows once the unsaved population
//! exceeds its bound. Saved rows are never counted, never scored, never
//! removed.
//!
//! The score blends access frequency and recency:
//! `access_count * w_access + (timestamp / now) * w_recency`. Not a strict
//! LRU; ties fall back to insertion order through the stable sort.

use super::connection::StoreDb;
use super::records::SavedFlag;
use crate::Error;
use tokio_rusqlite::params;

/// Weights of the eviction score terms. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct EvictionWeights {
    pub access: f64,
    pub recency: f64,
}

impl Default for EvictionWeights {
    fn default() -> Self {
        Self { access: 0.7, recency: 0.3 }
    }
}

/// Per-namespace cache tuning: TTL, size bound, and scoring weights.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl_ms: i64,
    pub max_entries: usize,
    pub weights: EvictionWeights,
}

/// Pick the ids to evict from `(id, timestamp, access_count)` rows given in
/// insertion order. Returns the lowest-scoring ids beyond `max_entries`,
/// lowest first; the stable sort keeps insertion order on score ties.
pub(crate) fn eviction_victims(
    rows: Vec<(String, i64, i64)>, max_entries: usize, weights: EvictionWeights, now_ms: i64,
) -> Vec<String> {
    if rows.len() <= max_entries {
        return Vec::new();
    }
    let excess = rows.len() - max_entries;
    let now = now_ms.max(1) as f64;

    let mut scored: Vec<(f64, String)> = rows
        .into_iter()
        .map(|(id, timestamp, access_count)| {
            let score = access_count as f64 * weights.access + (timestamp as f64 / now) * weights.recency;
            (score, id)
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    scored.into_iter().take(excess).map(|(_, id)| id).collect()
}

impl StoreDb {
    /// Delete unsaved chord sheets older than the TTL.
    ///
    /// Saved rows are exempt no matter their age. Returns the number of
    /// deleted entries.
    pub async fn purge_expired_sheets(&self, ttl_ms: i64) -> Result<u64, Error> {
        let cutoff = chrono::Utc::now().timestamp_millis() - ttl_ms;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM chord_sheets WHERE saved = ?1 AND timestamp < ?2",
                    params![SavedFlag::Unsaved.as_str(), cutoff],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Evict lowest-scoring unsaved chord sheets until the unsaved
    /// population is at or under `max_entries`.
    ///
    /// Returns the number of deleted entries.
    pub async fn evict_sheets_over_capacity(
        &self, max_entries: usize, weights: EvictionWeights,
    ) -> Result<u64, Error> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, timestamp, access_count FROM chord_sheets
                     WHERE saved = ?1 ORDER BY rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![SavedFlag::Unsaved.as_str()], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                    })?
                    .collect::<Result<Vec<(String, i64, i64)>, _>>()?;
                drop(stmt);

                let victims = eviction_victims(rows, max_entries, weights, now_ms);
                let mut deleted = 0u64;
                let mut delete = conn.prepare("DELETE FROM chord_sheets WHERE id = ?1")?;
                for id in &victims {
                    deleted += delete.execute(params![id])? as u64;
                }
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::records::{ChordSheetPayload, ChordSheetRecord, STANDARD_TUNING};
    use chrono::Utc;

    fn make_record(artist: &str, title: &str, saved: bool, timestamp: i64) -> ChordSheetRecord {
        ChordSheetRecord {
            id: crate::cache::key::generate_key(artist, title),
            artist: artist.to_string(),
            title: title.to_string(),
            saved,
            payload: ChordSheetPayload {
                title: title.to_string(),
                artist: artist.to_string(),
                song_chords: "[Verse]\nG  D  Am7".to_string(),
                song_key: "G".to_string(),
                guitar_tuning: STANDARD_TUNING.map(str::to_string),
                guitar_capo: 0,
            },
            timestamp,
            access_count: 0,
        }
    }

    #[test]
    fn test_victims_under_bound_is_empty() {
        let rows = vec![("a".to_string(), 1, 0), ("b".to_string(), 2, 0)];
        assert!(eviction_victims(rows, 2, EvictionWeights::default(), 1_000).is_empty());
    }

    #[test]
    fn test_victims_prefers_low_access_count() {
        let rows = vec![
            ("popular".to_string(), 1_000, 50),
            ("ignored".to_string(), 1_000, 0),
            ("middling".to_string(), 1_000, 5),
        ];
        let victims = eviction_victims(rows, 1, EvictionWeights::default(), 2_000);
        assert_eq!(victims, vec!["ignored".to_string(), "middling".to_string()]);
    }

    #[test]
    fn test_victims_prefers_stale_on_equal_access() {
        let rows = vec![
            ("old".to_string(), 1_000, 1),
            ("fresh".to_string(), 900_000, 1),
        ];
        let victims = eviction_victims(rows, 1, EvictionWeights::default(), 1_000_000);
        assert_eq!(victims, vec!["old".to_string()]);
    }

    #[test]
    fn test_victims_tie_breaks_by_insertion_order() {
        let rows = vec![
            ("first".to_string(), 1_000, 1),
            ("second".to_string(), 1_000, 1),
            ("third".to_string(), 1_000, 1),
        ];
        let victims = eviction_victims(rows, 1, EvictionWeights::default(), 2_000);
        assert_eq!(victims, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_purge_expired_leaves_fresh_and_saved() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let now = Utc::now().timestamp_millis();
        let ttl_ms = 1_000 * 60;

        db.upsert_record(&make_record("Oasis", "Wonderwall", false, now - ttl_ms - 1)).await.unwrap();
        db.upsert_record(&make_record("Bob Dylan", "Hurricane", false, now)).await.unwrap();
        // Saved and ten TTLs old: still immune.
        db.upsert_record(&make_record("Eagles", "Hotel California", true, now - 10 * ttl_ms)).await.unwrap();

        let deleted = db.purge_expired_sheets(ttl_ms).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(db.get_record("oasis_wonderwall").await.unwrap().is_none());
        assert!(db.get_record("bob-dylan_hurricane").await.unwrap().is_some());
        assert!(db.get_record("eagles_hotel-california").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_eviction_respects_saved_boundary() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let now = Utc::now().timestamp_millis();
        let max = 3usize;

        // max + 2 unsaved rows, plus 2 saved rows with the worst scores.
        for i in 0..(max + 2) {
            db.upsert_record(&make_record("Artist", &format!("Song {i}"), false, now - i as i64)).await.unwrap();
        }
        db.upsert_record(&make_record("Eagles", "Hotel California", true, 1)).await.unwrap();
        db.upsert_record(&make_record("Oasis", "Wonderwall", true, 2)).await.unwrap();

        let deleted = db.evict_sheets_over_capacity(max, EvictionWeights::default()).await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(db.count_by_saved(SavedFlag::Unsaved).await.unwrap(), max as i64);
        assert_eq!(db.count_by_saved(SavedFlag::Saved).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_eviction_noop_at_bound() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let now = Utc::now().timestamp_millis();
        db.upsert_record(&make_record("Oasis", "Wonderwall", false, now)).await.unwrap();

        let deleted = db.evict_sheets_over_capacity(1, EvictionWeights::default()).await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(db.count().await.unwrap(), 1);
    }
}
