//! Chord-sheet site client.
//!
//! Wraps the fetch pipeline and extraction into the three lookups the cache
//! layer consumes: a song page, an artist's song list, and a site search.
//! Requests are rate limited to one per second; this is somebody else's
//! website.

use crate::extract::{extract_chord_sheet, extract_song_list};
use crate::fetch::{FetchClient, FetchConfig};
use chordstash_core::cache::key::slug;
use chordstash_core::{ChordSheetPayload, Error, SongSummary};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Default base URL of the chord-sheet site.
const DEFAULT_BASE_URL: &str = "https://www.e-chords.com";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "chordstash/0.1";

/// Minimum interval between requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Chord source configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the site (default: https://www.e-chords.com).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: chordstash/0.x).
    pub user_agent: String,
    /// Maximum response body size in bytes (default: 2MB).
    pub max_bytes: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Client for the chord-sheet site.
#[derive(Debug, Clone)]
pub struct ChordSource {
    fetch: FetchClient,
    base: Url,
    rate_limiter: Arc<RateLimiter>,
}

impl ChordSource {
    /// Create a new source client with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, Error> {
        let base = Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("unsupported scheme: {}", base.scheme())));
        }

        let fetch = FetchClient::new(FetchConfig {
            user_agent: config.user_agent,
            max_bytes: config.max_bytes,
            timeout: config.timeout,
            ..FetchConfig::default()
        })?;

        Ok(Self { fetch, base, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Fetch and extract one song's chord sheet.
    pub async fn fetch_chord_sheet(&self, artist: &str, title: &str) -> Result<ChordSheetPayload, Error> {
        let path = format!("chords/{}/{}", slug(artist), slug(title));
        let url = self.base.join(&path).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        self.rate_limiter.acquire().await;
        tracing::debug!("fetching chord sheet: {url}");
        let response = self.fetch.fetch(&url).await?;
        let html = String::from_utf8_lossy(&response.bytes);

        extract_chord_sheet(&html, artist, title)
    }

    /// Fetch the list of songs for an artist.
    pub async fn fetch_artist_songs(&self, artist: &str) -> Result<Vec<SongSummary>, Error> {
        let path = format!("artist/{}", slug(artist));
        let url = self.base.join(&path).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        self.rate_limiter.acquire().await;
        tracing::debug!("fetching artist songs: {url}");
        let response = self.fetch.fetch(&url).await?;
        let html = String::from_utf8_lossy(&response.bytes);

        Ok(extract_song_list(&html, &self.base))
    }

    /// Run a site search for songs matching a query.
    pub async fn search_songs(&self, query: &str) -> Result<Vec<SongSummary>, Error> {
        let mut url = self.base.join("search").map_err(|e| Error::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", query);

        self.rate_limiter.acquire().await;
        tracing::debug!("searching songs: {url}");
        let response = self.fetch.fetch(&url).await?;
        let html = String::from_utf8_lossy(&response.bytes);

        Ok(extract_song_list(&html, &self.base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_default() {
        let config = SourceConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "chordstash/0.1");
    }

    #[test]
    fn test_source_new() {
        let source = ChordSource::new(SourceConfig::default());
        assert!(source.is_ok());
    }

    #[test]
    fn test_source_rejects_bad_base_url() {
        let config = SourceConfig { base_url: "not a url".to_string(), ..Default::default() };
        assert!(matches!(ChordSource::new(config), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_source_rejects_non_http_scheme() {
        let config = SourceConfig { base_url: "file:///etc/passwd".to_string(), ..Default::default() };
        assert!(matches!(ChordSource::new(config), Err(Error::InvalidUrl(_))));
    }
}
