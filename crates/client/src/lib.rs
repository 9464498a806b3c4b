//! Scraping collaborator for chordstash.
//!
//! This crate provides the HTTP fetch pipeline and the chord-sheet
//! extraction that turn a song page into a `ChordSheetPayload`. The cache
//! layer treats it as an opaque producer: successful fetches get cached,
//! failed ones leave the cache untouched.

pub mod extract;
pub mod fetch;
pub mod source;

pub use extract::{extract_chord_sheet, extract_song_list};
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use source::{ChordSource, SourceConfig};
