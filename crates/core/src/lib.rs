//! Core types and storage engine for chordstash.
//!
//! This crate provides:
//! - The persistent chord-sheet cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{ChordSheetPayload, ChordSheetRepository, SavedFlag, SongSummary, StoreDb};
pub use config::AppConfig;
pub use error::Error;
