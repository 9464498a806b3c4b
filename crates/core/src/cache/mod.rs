//! SQLite-backed persistent cache for chord sheets and lookup results.
//!
//! This module provides a durable, indexed store using SQLite with async
//! access via tokio-rusqlite. It holds two logically distinct populations in
//! one table — transient, TTL-bound fetch results and the user's saved
//! library — partitioned by an indexed `saved` flag. It supports:
//!
//! - Stable cache keys derived from (artist, title)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Lazy TTL expiration and score-based eviction of unsaved rows
//! - Parallel TTL-only caches for search and artist-song results

pub mod connection;
pub mod key;
pub mod migrations;
pub mod records;
pub mod repository;
pub mod results;
pub mod seed;
pub mod sweep;

pub use crate::Error;

pub use connection::StoreDb;
pub use key::{generate_key, parse_key};
pub use records::{ChordSheetPayload, ChordSheetRecord, SavedFlag};
pub use repository::ChordSheetRepository;
pub use results::{ResultNamespace, ResultsCache, SongSummary};
pub use sweep::{CachePolicy, EvictionWeights};
