//! Chord-sheet record CRUD operations.
//!
//! One row per unique (artist, title). The `saved` column partitions the
//! table into the user's library and the transient fetch cache. The
//! partition value is stored as one of exactly two strings, `'saved'` and
//! `'unsaved'`, enforced by a CHECK constraint; the domain model only ever
//! sees a bool, translated at this boundary. An indexed string pair cannot
//! be conflated by numeric or boolean coercion the way adjacent integers
//! can, which is what keeps `query_by_saved` exhaustive and disjoint.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Standard guitar tuning, low E to high E.
pub const STANDARD_TUNING: [&str; 6] = ["E", "A", "D", "G", "B", "E"];

fn default_tuning() -> [String; 6] {
    STANDARD_TUNING.map(str::to_string)
}

/// The domain content of a chord sheet. Opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ChordSheetPayload {
    pub title: String,
    pub artist: String,
    /// The chord text itself, section labels and chord lines.
    pub song_chords: String,
    /// Musical key, e.g. "Em". Empty when unknown.
    #[serde(default)]
    pub song_key: String,
    /// Always six strings; absent tuning means standard.
    #[serde(default = "default_tuning")]
    pub guitar_tuning: [String; 6],
    /// Capo fret, 0 for none.
    #[serde(default)]
    pub guitar_capo: u8,
}

/// The saved/unsaved partition flag as stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedFlag {
    Saved,
    Unsaved,
}

impl SavedFlag {
    /// The canonical column representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            SavedFlag::Saved => "saved",
            SavedFlag::Unsaved => "unsaved",
        }
    }

    pub const fn from_bool(saved: bool) -> Self {
        if saved { SavedFlag::Saved } else { SavedFlag::Unsaved }
    }

    pub const fn as_bool(self) -> bool {
        matches!(self, SavedFlag::Saved)
    }
}

/// One stored chord-sheet row, bookkeeping fields included.
#[derive(Debug, Clone)]
pub struct ChordSheetRecord {
    pub id: String,
    /// Denormalized from the payload for indexed lookup independent of the
    /// id format.
    pub artist: String,
    pub title: String,
    pub saved: bool,
    pub payload: ChordSheetPayload,
    /// Last write or last touch, epoch milliseconds.
    pub timestamp: i64,
    /// Reads since the last full write; the popularity term of the
    /// eviction score.
    pub access_count: i64,
}

type RawRow = (String, String, String, String, String, i64, i64);

fn parse_row(raw: RawRow) -> Result<ChordSheetRecord, (String, serde_json::Error)> {
    let (id, artist, title, saved, payload_json, timestamp, access_count) = raw;
    match serde_json::from_str::<ChordSheetPayload>(&payload_json) {
        Ok(payload) => Ok(ChordSheetRecord {
            id,
            artist,
            title,
            saved: saved == SavedFlag::Saved.as_str(),
            payload,
            timestamp,
            access_count,
        }),
        Err(e) => Err((id, e)),
    }
}

impl StoreDb {
    /// Insert or update a chord-sheet record.
    ///
    /// Uses UPSERT semantics: inserts if the id doesn't exist, overwrites
    /// every field if it does. Nothing from the old row survives.
    pub async fn upsert_record(&self, record: &ChordSheetRecord) -> Result<(), Error> {
        let payload_json = serde_json::to_string(&record.payload)
            .map_err(|e| Error::InvalidInput(format!("failed to serialize chord sheet: {e}")))?;
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO chord_sheets (
                        id, artist, title, saved, payload_json, timestamp, access_count
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(id) DO UPDATE SET
                        artist = excluded.artist,
                        title = excluded.title,
                        saved = excluded.saved,
                        payload_json = excluded.payload_json,
                        timestamp = excluded.timestamp,
                        access_count = excluded.access_count",
                    params![
                        &record.id,
                        &record.artist,
                        &record.title,
                        SavedFlag::from_bool(record.saved).as_str(),
                        &payload_json,
                        record.timestamp,
                        record.access_count,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by id.
    ///
    /// Returns None if the id doesn't exist. A row whose stored payload no
    /// longer parses is deleted and reported as a miss; corruption never
    /// propagates upward.
    pub async fn get_record(&self, id: &str) -> Result<Option<ChordSheetRecord>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ChordSheetRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, artist, title, saved, payload_json, timestamp, access_count
                     FROM chord_sheets WHERE id = ?1",
                )?;

                let result = stmt.query_row(params![id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                });

                match result {
                    Ok(raw) => match parse_row(raw) {
                        Ok(record) => Ok(Some(record)),
                        Err((id, e)) => {
                            let err = Error::MalformedPayload(e.to_string());
                            tracing::warn!(id = %id, "dropping corrupt chord-sheet entry: {err}");
                            conn.execute("DELETE FROM chord_sheets WHERE id = ?1", params![id])?;
                            Ok(None)
                        }
                    },
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a record by id. No error if absent.
    pub async fn delete_record(&self, id: &str) -> Result<(), Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM chord_sheets WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Indexed scan over one side of the saved partition, insertion order.
    ///
    /// Corrupt rows are dropped from the table and omitted from the result.
    pub async fn query_by_saved(&self, flag: SavedFlag) -> Result<Vec<ChordSheetRecord>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<ChordSheetRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, artist, title, saved, payload_json, timestamp, access_count
                     FROM chord_sheets WHERE saved = ?1 ORDER BY rowid ASC",
                )?;

                let rows = stmt
                    .query_map(params![flag.as_str()], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<RawRow>, _>>()?;
                drop(stmt);

                let mut records = Vec::with_capacity(rows.len());
                for raw in rows {
                    match parse_row(raw) {
                        Ok(record) => records.push(record),
                        Err((id, e)) => {
                            let err = Error::MalformedPayload(e.to_string());
                            tracing::warn!(id = %id, "dropping corrupt chord-sheet entry: {err}");
                            conn.execute("DELETE FROM chord_sheets WHERE id = ?1", params![id])?;
                        }
                    }
                }
                Ok(records)
            })
            .await
            .map_err(Error::from)
    }

    /// Full scan in insertion order. Maintenance and debugging only; the
    /// saved partition is served by `query_by_saved`.
    pub async fn query_all(&self) -> Result<Vec<ChordSheetRecord>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<ChordSheetRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, artist, title, saved, payload_json, timestamp, access_count
                     FROM chord_sheets ORDER BY rowid ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<RawRow>, _>>()?;
                drop(stmt);

                let mut records = Vec::with_capacity(rows.len());
                for raw in rows {
                    if let Ok(record) = parse_row(raw) {
                        records.push(record);
                    }
                }
                Ok(records)
            })
            .await
            .map_err(Error::from)
    }

    /// Total row count, both partitions.
    pub async fn count(&self) -> Result<i64, Error> {
        self.conn
            .call(|conn| -> Result<i64, Error> {
                let count = conn.query_row("SELECT COUNT(*) FROM chord_sheets", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    /// Row count for one side of the saved partition.
    pub async fn count_by_saved(&self, flag: SavedFlag) -> Result<i64, Error> {
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                let count = conn.query_row(
                    "SELECT COUNT(*) FROM chord_sheets WHERE saved = ?1",
                    params![flag.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    /// Flip the saved flag in place, content untouched.
    ///
    /// Returns whether a row was actually updated.
    pub async fn update_saved_flag(&self, id: &str, flag: SavedFlag) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute(
                    "UPDATE chord_sheets SET saved = ?2 WHERE id = ?1",
                    params![id, flag.as_str()],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Bump access_count and refresh the timestamp after a read.
    ///
    /// Best-effort bookkeeping for the eviction score; a concurrent writer
    /// may win the race and the update is simply lost, never corrupted.
    pub async fn touch_record(&self, id: &str, now_ms: i64) -> Result<(), Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE chord_sheets SET access_count = access_count + 1, timestamp = ?2 WHERE id = ?1",
                    params![id, now_ms],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
