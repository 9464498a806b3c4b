//! Typed chord-sheet repository over the record store.
//!
//! The repository is the only component that sets the saved flag; the store
//! below it just indexes whatever it is handed. Reads handle TTL lazily (an
//! expired unsaved row is deleted and reported as a miss) and touch the row's
//! bookkeeping. Writes run the opportunistic expiration and eviction sweeps.
//!
//! The touch on the read path is a separate statement from the read itself,
//! so a concurrent writer to the same id can win the race; the bookkeeping
//! update is lost, not corrupted. Callers must not assume read-then-write
//! atomicity.

use super::connection::StoreDb;
use super::records::{ChordSheetPayload, ChordSheetRecord, SavedFlag};
use super::sweep::CachePolicy;
use crate::Error;

/// Domain façade for chord-sheet storage.
#[derive(Clone, Debug)]
pub struct ChordSheetRepository {
    db: StoreDb,
    policy: CachePolicy,
}

impl ChordSheetRepository {
    pub fn new(db: StoreDb, policy: CachePolicy) -> Self {
        Self { db, policy }
    }

    /// Read a chord sheet by id.
    ///
    /// An unsaved record past its TTL is deleted and reported as None.
    /// Hits bump access_count and refresh the timestamp, best-effort.
    pub async fn get(&self, id: &str) -> Result<Option<ChordSheetPayload>, Error> {
        let Some(record) = self.db.get_record(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp_millis();
        if !record.saved && now - record.timestamp > self.policy.ttl_ms {
            tracing::debug!(id = %id, "chord sheet expired, dropping");
            self.db.delete_record(id).await?;
            return Ok(None);
        }

        if let Err(e) = self.db.touch_record(id, now).await {
            tracing::warn!(id = %id, "failed to touch chord sheet: {e}");
        }

        Ok(Some(record.payload))
    }

    /// Upsert a chord sheet with an explicit saved flag.
    ///
    /// Resets the timestamp and access count; nothing from an existing row
    /// survives. A quota failure triggers one eviction sweep and a single
    /// retry before surfacing.
    pub async fn store(&self, payload: &ChordSheetPayload, saved: bool, id: &str) -> Result<(), Error> {
        let record = ChordSheetRecord {
            id: id.to_string(),
            artist: payload.artist.clone(),
            title: payload.title.clone(),
            saved,
            payload: payload.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            access_count: 0,
        };

        match self.db.upsert_record(&record).await {
            Err(Error::QuotaExceeded(msg)) => {
                tracing::warn!(id = %id, "storage quota hit, evicting and retrying: {msg}");
                self.db
                    .evict_sheets_over_capacity(self.policy.max_entries, self.policy.weights)
                    .await?;
                self.db.upsert_record(&record).await?;
            }
            other => other?,
        }

        self.sweep().await;
        Ok(())
    }

    /// Flip the saved flag on an existing record, content untouched.
    ///
    /// A no-op when the record does not exist: there is nothing to save
    /// before a sheet has been stored.
    pub async fn set_saved_status(&self, id: &str, saved: bool) -> Result<(), Error> {
        let changed = self.db.update_saved_flag(id, SavedFlag::from_bool(saved)).await?;
        if !changed {
            tracing::debug!(id = %id, "set_saved_status on missing record, ignoring");
        }
        Ok(())
    }

    /// All saved chord sheets, insertion order. Backs "My Chord Sheets".
    ///
    /// Served by the saved index, never a full scan.
    pub async fn get_all_saved(&self) -> Result<Vec<ChordSheetPayload>, Error> {
        let records = self.db.query_by_saved(SavedFlag::Saved).await?;
        Ok(records.into_iter().map(|r| r.payload).collect())
    }

    /// Hard delete, regardless of saved status. Idempotent.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.db.delete_record(id).await
    }

    /// Whether the record exists with the saved flag set.
    pub async fn is_saved(&self, id: &str) -> Result<bool, Error> {
        Ok(self.db.get_record(id).await?.is_some_and(|r| r.saved))
    }

    /// Whether a record exists at all, without touching it.
    pub async fn contains(&self, id: &str) -> Result<bool, Error> {
        Ok(self.db.get_record(id).await?.is_some())
    }

    /// Run the expiration sweep on demand. Returns deleted row count.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.db.purge_expired_sheets(self.policy.ttl_ms).await
    }

    /// Run the eviction sweep on demand. Returns deleted row count.
    pub async fn evict_over_capacity(&self) -> Result<u64, Error> {
        self.db
            .evict_sheets_over_capacity(self.policy.max_entries, self.policy.weights)
            .await
    }

    /// Opportunistic write-path sweep; failures are logged, not surfaced.
    async fn sweep(&self) {
        if let Err(e) = self.purge_expired().await {
            tracing::warn!("expiration sweep failed: {e}");
        }
        if let Err(e) = self.evict_over_capacity().await {
            tracing::warn!("eviction sweep failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::generate_key;
    use crate::cache::records::STANDARD_TUNING;
    use crate::cache::sweep::EvictionWeights;

    fn sheet(artist: &str, title: &str) -> ChordSheetPayload {
        ChordSheetPayload {
            title: title.to_string(),
            artist: artist.to_string(),
            song_chords: "[Verse]\nEm7  G  Dsus4  A7sus4".to_string(),
            song_key: "Em".to_string(),
            guitar_tuning: STANDARD_TUNING.map(str::to_string),
            guitar_capo: 2,
        }
    }

    fn policy() -> CachePolicy {
        CachePolicy { ttl_ms: 60_000, max_entries: 100, weights: EvictionWeights::default() }
    }

    async fn repo() -> ChordSheetRepository {
        let db = StoreDb::open_in_memory().await.unwrap();
        ChordSheetRepository::new(db, policy())
    }

    #[tokio::test]
    async fn test_round_trip() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);

        repo.store(&payload, true, &id).await.unwrap();

        let retrieved = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(retrieved, payload);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = repo().await;
        assert!(repo.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_idempotent_save() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);

        repo.store(&payload, true, &id).await.unwrap();
        repo.store(&payload, true, &id).await.unwrap();

        let saved = repo.get_all_saved().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Wonderwall");
    }

    #[tokio::test]
    async fn test_expired_unsaved_read_is_a_miss() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);

        // Backdate past the TTL through the store layer.
        let record = ChordSheetRecord {
            id: id.clone(),
            artist: payload.artist.clone(),
            title: payload.title.clone(),
            saved: false,
            payload: payload.clone(),
            timestamp: chrono::Utc::now().timestamp_millis() - policy().ttl_ms - 1,
            access_count: 0,
        };
        repo.db.upsert_record(&record).await.unwrap();

        assert!(repo.get(&id).await.unwrap().is_none());
        // Lazy delete: the row is gone from every subsequent scan.
        assert!(repo.db.query_by_saved(SavedFlag::Unsaved).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_records_are_ttl_immune() {
        let repo = repo().await;
        let payload = sheet("Eagles", "Hotel California");
        let id = generate_key(&payload.artist, &payload.title);

        let record = ChordSheetRecord {
            id: id.clone(),
            artist: payload.artist.clone(),
            title: payload.title.clone(),
            saved: true,
            payload: payload.clone(),
            timestamp: chrono::Utc::now().timestamp_millis() - 10 * policy().ttl_ms,
            access_count: 0,
        };
        repo.db.upsert_record(&record).await.unwrap();

        assert_eq!(repo.get(&id).await.unwrap().unwrap(), payload);
    }

    #[tokio::test]
    async fn test_set_saved_status_missing_is_noop() {
        let repo = repo().await;
        repo.set_saved_status("nonexistent", true).await.unwrap();
        assert!(repo.get_all_saved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsave_retains_content_and_restores_ttl() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);

        repo.store(&payload, true, &id).await.unwrap();
        repo.set_saved_status(&id, false).await.unwrap();

        // Content survives the flip and the row is back in the transient
        // partition.
        assert_eq!(repo.get(&id).await.unwrap().unwrap(), payload);
        assert!(!repo.is_saved(&id).await.unwrap());
        assert_eq!(repo.db.count_by_saved(SavedFlag::Unsaved).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_read_touch_feeds_eviction_score() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);
        repo.store(&payload, false, &id).await.unwrap();

        repo.get(&id).await.unwrap();
        repo.get(&id).await.unwrap();

        let record = repo.db.get_record(&id).await.unwrap().unwrap();
        assert_eq!(record.access_count, 2);
    }

    #[tokio::test]
    async fn test_delete_overrides_saved() {
        let repo = repo().await;
        let payload = sheet("Eagles", "Hotel California");
        let id = generate_key(&payload.artist, &payload.title);

        repo.store(&payload, true, &id).await.unwrap();
        repo.delete(&id).await.unwrap();

        assert!(repo.get(&id).await.unwrap().is_none());
        assert!(repo.get_all_saved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_unsave_then_delete_scenario() {
        let repo = repo().await;
        let payload = sheet("Oasis", "Wonderwall");
        let id = generate_key(&payload.artist, &payload.title);

        // Fetched: lands unsaved.
        repo.store(&payload, false, &id).await.unwrap();
        assert!(repo.get_all_saved().await.unwrap().is_empty());

        // User saves it.
        repo.set_saved_status(&id, true).await.unwrap();
        let saved = repo.get_all_saved().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Wonderwall");

        // User deletes it.
        repo.delete(&id).await.unwrap();
        assert!(repo.get_all_saved().await.unwrap().is_empty());
        assert!(repo.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_sweeps_to_capacity() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let repo = ChordSheetRepository::new(
            db,
            CachePolicy { ttl_ms: 3_600_000, max_entries: 2, weights: EvictionWeights::default() },
        );

        for i in 0..4 {
            let payload = sheet("Artist", &format!("Song {i}"));
            let id = generate_key(&payload.artist, &payload.title);
            repo.store(&payload, false, &id).await.unwrap();
        }
        let payload = sheet("Eagles", "Hotel California");
        repo.store(&payload, true, "eagles_hotel-california").await.unwrap();

        assert_eq!(repo.db.count_by_saved(SavedFlag::Unsaved).await.unwrap(), 2);
        assert_eq!(repo.db.count_by_saved(SavedFlag::Saved).await.unwrap(), 1);
    }
}
