//! artist_songs tool implementation.
//!
//! Per-artist song lists with their own cache namespace and TTL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use chordstash_client::ChordSource;
use chordstash_core::cache::results::ResultsCache;
use chordstash_core::{Error, SongSummary};

use super::to_result;

/// Parameters for the artist_songs tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ArtistSongsParams {
    /// Artist name.
    pub artist: String,

    /// Force a fresh scrape, bypassing the cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output from the artist_songs tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtistSongsOutput {
    /// The artist's songs as listed on the source site.
    pub songs: Vec<SongSummary>,

    /// The artist as given.
    pub artist: String,

    /// Whether this response came from the cache.
    pub cache_hit: bool,
}

/// Implementation of the artist_songs tool.
pub async fn artist_songs_impl(
    cache: &ResultsCache, source: &ChordSource, params: ArtistSongsParams,
) -> Result<CallToolResult, McpError> {
    if params.artist.trim().is_empty() {
        return Err(Error::InvalidInput("artist cannot be empty".into()).into());
    }

    if !params.force_refresh {
        match cache.get::<SongSummary>(&params.artist).await {
            Ok(Some(songs)) => {
                tracing::debug!(artist = %params.artist, "artist songs cache hit");
                return to_result(&ArtistSongsOutput { songs, artist: params.artist, cache_hit: true });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(artist = %params.artist, "artist cache read failed: {e}"),
        }
    }

    let songs = source.fetch_artist_songs(&params.artist).await?;

    if let Err(e) = cache.store(&params.artist, &songs).await {
        tracing::warn!(artist = %params.artist, "failed to cache artist songs: {e}");
    }

    to_result(&ArtistSongsOutput { songs, artist: params.artist, cache_hit: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordstash_client::SourceConfig;
    use chordstash_core::StoreDb;
    use chordstash_core::cache::results::ResultNamespace;
    use chordstash_core::cache::sweep::{CachePolicy, EvictionWeights};

    async fn cache() -> ResultsCache {
        let db = StoreDb::open_in_memory().await.unwrap();
        let policy = CachePolicy { ttl_ms: 60_000, max_entries: 50, weights: EvictionWeights::default() };
        ResultsCache::new(db, ResultNamespace::ArtistSongs, policy)
    }

    fn offline_source() -> ChordSource {
        ChordSource::new(SourceConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_artist() {
        let cache = cache().await;
        let params = ArtistSongsParams { artist: "  ".into(), force_refresh: false };
        let result = artist_songs_impl(&cache, &offline_source(), params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_artist_songs_cache_hit() {
        let cache = cache().await;
        let stored = vec![
            SongSummary {
                artist: "Oasis".into(),
                title: "Wonderwall".into(),
                url: "https://chords.example.com/chords/oasis/wonderwall".into(),
            },
            SongSummary {
                artist: "Oasis".into(),
                title: "Live Forever".into(),
                url: "https://chords.example.com/chords/oasis/live-forever".into(),
            },
        ];
        cache.store("oasis", &stored).await.unwrap();

        let params = ArtistSongsParams { artist: "Oasis".into(), force_refresh: false };
        let result = artist_songs_impl(&cache, &offline_source(), params).await.unwrap();

        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val.get("text").and_then(|v| v.as_str()).unwrap();
        let output: ArtistSongsOutput = serde_json::from_str(text).unwrap();
        assert!(output.cache_hit);
        assert_eq!(output.songs.len(), 2);
    }
}
