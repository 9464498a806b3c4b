//! Stable cache key derivation.
//!
//! Chord-sheet ids are readable slugs derived from (artist, title); result
//! cache keys are SHA-256 hashes of a normalized query. Both are pure and
//! deterministic so the same song or query always lands on the same row.

use sha2::{Digest, Sha256};

/// Joins the artist and title slugs inside a chord-sheet id.
///
/// Slug normalization can never produce this character inside a field, so
/// the artist/title boundary stays recoverable: `parse_key` splits on the
/// last occurrence, which keeps artists containing earlier separators intact.
const FIELD_JOIN: char = '_';

/// Normalize one key field into a slug.
///
/// Trims, lowercases ASCII, and collapses every run of non-alphanumeric
/// characters into a single hyphen. Hyphens never lead or trail the slug.
pub fn slug(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut pending_sep = false;
    for c in field.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Derive the chord-sheet id for an (artist, title) pair.
///
/// Never fails; empty fields produce a degenerate but valid key.
pub fn generate_key(artist: &str, title: &str) -> String {
    let mut key = slug(artist);
    key.push(FIELD_JOIN);
    key.push_str(&slug(title));
    key
}

/// Recover the (artist, title) slugs from a chord-sheet id.
///
/// Splits on the last separator. Returns None for keys that never carried
/// one (not produced by `generate_key`).
pub fn parse_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(FIELD_JOIN)
}

/// Normalize query text so equivalent queries hit the same cache row.
///
/// Trims, lowercases ASCII, strips punctuation, and collapses whitespace
/// runs to a single space.
pub fn normalize_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut pending_space = false;
    for c in query.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Compute the cache key for a lookup query within a namespace.
pub fn query_cache_key(namespace: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize_query(query).as_bytes());
    hex::encode(hasher.finalize())
}
