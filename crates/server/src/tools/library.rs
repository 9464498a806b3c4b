//! My Chord Sheets tools: save, unsave, delete, list.
//!
//! These are the only operations that move records across the saved
//! partition. Save of a never-fetched sheet scrapes it first; unsave and
//! delete never touch the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use chordstash_client::ChordSource;
use chordstash_core::cache::key::generate_key;
use chordstash_core::cache::repository::ChordSheetRepository;
use chordstash_core::{ChordSheetPayload, Error};

use super::to_result;

/// Parameters for the sheet_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetSaveParams {
    /// Artist name.
    pub artist: String,

    /// Song title.
    pub title: String,
}

/// Parameters for the sheet_unsave tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetUnsaveParams {
    /// Artist name.
    pub artist: String,

    /// Song title.
    pub title: String,
}

/// Parameters for the sheet_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetDeleteParams {
    /// Artist name.
    pub artist: String,

    /// Song title.
    pub title: String,
}

/// Output from the save/unsave/delete tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryMutationOutput {
    /// Stable id of the sheet.
    pub id: String,

    /// Whether the sheet is saved after the operation.
    pub saved: bool,

    /// Whether the sheet had to be scraped as part of the operation.
    pub fetched: bool,
}

/// Output from the library_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LibraryListOutput {
    /// Saved chord sheets, oldest first.
    pub sheets: Vec<ChordSheetPayload>,

    /// Number of saved sheets.
    pub count: usize,
}

fn require_names(artist: &str, title: &str) -> Result<String, Error> {
    if artist.trim().is_empty() || title.trim().is_empty() {
        return Err(Error::InvalidInput("artist and title are required".into()));
    }
    Ok(generate_key(artist, title))
}

/// Implementation of the sheet_save tool.
///
/// A write failure here is surfaced to the caller; "could not save" is a
/// user-visible condition, unlike the silent cache fills on the read path.
pub async fn save_impl(
    repo: &ChordSheetRepository, source: &ChordSource, params: SheetSaveParams,
) -> Result<CallToolResult, McpError> {
    let id = require_names(&params.artist, &params.title)?;

    if repo.contains(&id).await? {
        repo.set_saved_status(&id, true).await?;
        return to_result(&LibraryMutationOutput { id, saved: true, fetched: false });
    }

    let sheet = source.fetch_chord_sheet(&params.artist, &params.title).await?;
    repo.store(&sheet, true, &id).await?;

    to_result(&LibraryMutationOutput { id, saved: true, fetched: true })
}

/// Implementation of the sheet_unsave tool.
///
/// The content stays cached; it just becomes TTL- and eviction-eligible
/// again. Unsaving a sheet that was never cached is a no-op.
pub async fn unsave_impl(repo: &ChordSheetRepository, params: SheetUnsaveParams) -> Result<CallToolResult, McpError> {
    let id = require_names(&params.artist, &params.title)?;
    repo.set_saved_status(&id, false).await?;
    to_result(&LibraryMutationOutput { id, saved: false, fetched: false })
}

/// Implementation of the sheet_delete tool.
///
/// An explicit delete overrides saved status. Idempotent.
pub async fn delete_impl(repo: &ChordSheetRepository, params: SheetDeleteParams) -> Result<CallToolResult, McpError> {
    let id = require_names(&params.artist, &params.title)?;
    repo.delete(&id).await?;
    to_result(&LibraryMutationOutput { id, saved: false, fetched: false })
}

/// Implementation of the library_list tool.
pub async fn list_impl(repo: &ChordSheetRepository) -> Result<CallToolResult, McpError> {
    let sheets = repo.get_all_saved().await?;
    let count = sheets.len();
    to_result(&LibraryListOutput { sheets, count })
}
