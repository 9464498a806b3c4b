//! song_search tool implementation.
//!
//! Site search with a short-TTL result cache in front of it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use chordstash_client::ChordSource;
use chordstash_core::cache::results::ResultsCache;
use chordstash_core::{Error, SongSummary};

use super::to_result;

/// Parameters for the song_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SongSearchParams {
    /// Search query (title, artist, or both).
    pub query: String,

    /// Force a fresh search, bypassing the cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output from the song_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SongSearchOutput {
    /// Matching songs.
    pub results: Vec<SongSummary>,

    /// The query as given.
    pub query: String,

    /// Whether this response came from the cache.
    pub cache_hit: bool,
}

/// Implementation of the song_search tool.
pub async fn search_impl(
    cache: &ResultsCache, source: &ChordSource, params: SongSearchParams,
) -> Result<CallToolResult, McpError> {
    if params.query.trim().is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".into()).into());
    }

    if !params.force_refresh {
        match cache.get::<SongSummary>(&params.query).await {
            Ok(Some(results)) => {
                tracing::debug!(query = %params.query, "search cache hit");
                return to_result(&SongSearchOutput { results, query: params.query, cache_hit: true });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(query = %params.query, "search cache read failed: {e}"),
        }
    }

    let results = source.search_songs(&params.query).await?;

    if let Err(e) = cache.store(&params.query, &results).await {
        tracing::warn!(query = %params.query, "failed to cache search results: {e}");
    }

    to_result(&SongSearchOutput { results, query: params.query, cache_hit: false })
}
