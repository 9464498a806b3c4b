//! Tool implementations for the chordstash server.
//!
//! Each tool is a params/output pair plus an `*_impl` function taking its
//! dependencies explicitly, so the implementations stay testable against
//! in-memory stores.

pub mod artist_songs;
pub mod cache_purge;
pub mod library;
pub mod sheet_get;
pub mod song_search;

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use chordstash_core::Error;

/// Serialize a tool output struct into a text content result.
pub(crate) fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
