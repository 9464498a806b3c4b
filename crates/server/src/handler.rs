//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use crate::tools::artist_songs::{ArtistSongsParams, artist_songs_impl};
use crate::tools::cache_purge::{CachePurgeParams, purge_impl};
use crate::tools::library::{
    SheetDeleteParams, SheetSaveParams, SheetUnsaveParams, delete_impl, list_impl, save_impl, unsave_impl,
};
use crate::tools::sheet_get::{SheetGetParams, get_impl};
use crate::tools::song_search::{SongSearchParams, search_impl};

use chordstash_client::{ChordSource, SourceConfig};
use chordstash_core::cache::repository::ChordSheetRepository;
use chordstash_core::cache::results::{ResultNamespace, ResultsCache};
use chordstash_core::{AppConfig, Error, StoreDb};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for chordstash.
#[derive(Clone)]
pub struct ChordStashServer {
    repo: ChordSheetRepository,
    search_cache: ResultsCache,
    artist_cache: ResultsCache,
    source: ChordSource,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ChordStashServer {
    /// Create a new server handler over an open store.
    pub fn new(db: StoreDb, config: &AppConfig) -> Result<Self, Error> {
        let source = ChordSource::new(SourceConfig {
            base_url: config.site_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
        })?;

        Ok(Self {
            repo: ChordSheetRepository::new(db.clone(), config.sheet_policy()),
            search_cache: ResultsCache::new(db.clone(), ResultNamespace::Search, config.search_policy()),
            artist_cache: ResultsCache::new(db, ResultNamespace::ArtistSongs, config.artist_policy()),
            source,
            tool_router: Self::tool_router(),
        })
    }

    /// Look up a chord sheet, fetching and caching it on a miss.
    #[tool(description = "Get the chord sheet for a song. Served from the cache when fresh, scraped otherwise.")]
    async fn sheet_get(&self, params: Parameters<SheetGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.repo, &self.source, params.0).await
    }

    /// Add a chord sheet to the user's library.
    #[tool(description = "Save a chord sheet to My Chord Sheets. Fetches the sheet first if it was never cached.")]
    async fn sheet_save(&self, params: Parameters<SheetSaveParams>) -> Result<CallToolResult, McpError> {
        save_impl(&self.repo, &self.source, params.0).await
    }

    /// Remove a chord sheet from the user's library, keeping it cached.
    #[tool(description = "Unsave a chord sheet. The content stays cached but becomes expiration-eligible again.")]
    async fn sheet_unsave(&self, params: Parameters<SheetUnsaveParams>) -> Result<CallToolResult, McpError> {
        unsave_impl(&self.repo, params.0).await
    }

    /// Delete a chord sheet outright.
    #[tool(description = "Delete a chord sheet from the cache and library, regardless of saved status.")]
    async fn sheet_delete(&self, params: Parameters<SheetDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.repo, params.0).await
    }

    /// List the user's saved chord sheets.
    #[tool(description = "List all chord sheets in My Chord Sheets.")]
    async fn library_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.repo).await
    }

    /// Search the chord-sheet site for songs.
    #[tool(description = "Search for songs by title or artist. Results are cached briefly.")]
    async fn song_search(&self, params: Parameters<SongSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.search_cache, &self.source, params.0).await
    }

    /// List the songs available for an artist.
    #[tool(description = "List the songs available for an artist. Results are cached.")]
    async fn artist_songs(&self, params: Parameters<ArtistSongsParams>) -> Result<CallToolResult, McpError> {
        artist_songs_impl(&self.artist_cache, &self.source, params.0).await
    }

    /// Run cache maintenance sweeps.
    #[tool(description = "Purge expired cache entries and evict over-capacity ones across all cache namespaces.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.repo, &self.search_cache, &self.artist_cache, params.0).await
    }
}

impl ServerHandler for ChordStashServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "chordstash".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
