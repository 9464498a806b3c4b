//! sheet_get tool implementation.
//!
//! The read-through path: serve a fresh cached sheet, otherwise scrape it
//! and cache the result unsaved. A failing cache read degrades to a plain
//! fetch; a failing fetch caches nothing.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use chordstash_client::ChordSource;
use chordstash_core::cache::key::generate_key;
use chordstash_core::cache::repository::ChordSheetRepository;
use chordstash_core::{ChordSheetPayload, Error};

use super::to_result;

/// Parameters for the sheet_get tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SheetGetParams {
    /// Artist name.
    pub artist: String,

    /// Song title.
    pub title: String,

    /// Force a fresh scrape, bypassing the cache.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output from the sheet_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetGetOutput {
    /// Stable id of the sheet, usable with the library tools.
    pub id: String,

    /// The chord sheet itself.
    pub sheet: ChordSheetPayload,

    /// Whether the sheet is in My Chord Sheets.
    pub saved: bool,

    /// Whether this response came from the cache.
    pub cache_hit: bool,
}

/// Implementation of the sheet_get tool.
pub async fn get_impl(
    repo: &ChordSheetRepository, source: &ChordSource, params: SheetGetParams,
) -> Result<CallToolResult, McpError> {
    if params.artist.trim().is_empty() || params.title.trim().is_empty() {
        return Err(Error::InvalidInput("artist and title are required".into()).into());
    }

    let id = generate_key(&params.artist, &params.title);

    if !params.force_refresh {
        match repo.get(&id).await {
            Ok(Some(sheet)) => {
                tracing::debug!(id = %id, "chord sheet cache hit");
                let saved = repo.is_saved(&id).await.unwrap_or(false);
                return to_result(&SheetGetOutput { id, sheet, saved, cache_hit: true });
            }
            Ok(None) => {}
            // Read failures degrade to "not cached"; the fetch below still
            // serves the user.
            Err(e) => tracing::warn!(id = %id, "cache read failed, fetching fresh: {e}"),
        }
    }

    let sheet = source.fetch_chord_sheet(&params.artist, &params.title).await?;

    if let Err(e) = repo.store(&sheet, false, &id).await {
        tracing::warn!(id = %id, "failed to cache fetched chord sheet: {e}");
    }

    to_result(&SheetGetOutput { id, sheet, saved: false, cache_hit: false })
}
