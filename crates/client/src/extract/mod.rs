//! Chord-sheet extraction from scraped HTML.
//!
//! Song pages on chord sites render the sheet itself inside a `<pre>` block
//! (fixed-width text keeps chords aligned over lyrics). Extraction picks the
//! block with the most chord lines, then recovers metadata around it: key
//! from the opening chord, capo and tuning from the page text, title and
//! artist from the caller's hints or the page heading.
//!
//! Artist and search pages are link lists; `extract_song_list` walks the
//! anchors that point at chord pages.

pub mod chords;

use chordstash_core::cache::key::generate_key;
use chordstash_core::cache::records::STANDARD_TUNING;
use chordstash_core::{ChordSheetPayload, Error, SongSummary};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static CAPO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bcapo\b[^0-9]{0,10}(\d{1,2})").unwrap());

static TUNING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btuning\b[:\s]*(.{0,40})").unwrap());

static TUNING_NOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-G][#b]?").unwrap());

/// Extract a chord sheet from a song page.
///
/// `artist_hint`/`title_hint` come from the lookup that led here and win
/// over anything on the page; empty hints fall back to the page heading.
///
/// # Errors
///
/// Returns `Error::ExtractFailed` when the page carries no recognizable
/// chord block.
pub fn extract_chord_sheet(html: &str, artist_hint: &str, title_hint: &str) -> Result<ChordSheetPayload, Error> {
    let doc = Html::parse_document(html);

    let song_chords = best_chord_block(&doc)
        .ok_or_else(|| Error::ExtractFailed("no chord block found on page".to_string()))?;

    let (artist, title) = resolve_names(&doc, artist_hint, title_hint);
    let page_text = doc.root_element().text().collect::<String>();

    let song_key = chords::detect_key(&song_chords).unwrap_or_default();
    let guitar_capo = extract_capo(&page_text);
    let guitar_tuning = extract_tuning(&page_text);

    Ok(ChordSheetPayload { title, artist, song_chords, song_key, guitar_tuning, guitar_capo })
}

/// Pick the `<pre>` block with the most chord lines.
fn best_chord_block(doc: &Html) -> Option<String> {
    let pre = Selector::parse("pre").ok()?;

    let mut best: Option<(usize, String)> = None;
    for element in doc.select(&pre) {
        let text = element.text().collect::<String>();
        let score: usize = text.lines().filter(|l| chords::is_chord_line(l)).count();
        if score == 0 {
            continue;
        }
        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, text.trim().to_string()));
        }
    }
    best.map(|(_, text)| text)
}

fn resolve_names(doc: &Html, artist_hint: &str, title_hint: &str) -> (String, String) {
    let mut artist = artist_hint.trim().to_string();
    let mut title = title_hint.trim().to_string();
    if !artist.is_empty() && !title.is_empty() {
        return (artist, title);
    }

    // Chord sites head song pages with "Title by Artist".
    if let Ok(h1) = Selector::parse("h1")
        && let Some(heading) = doc.select(&h1).next()
    {
        let text = heading.text().collect::<String>();
        if let Some((page_title, page_artist)) = text.rsplit_once(" by ") {
            if title.is_empty() {
                title = page_title.trim().to_string();
            }
            if artist.is_empty() {
                artist = page_artist.trim().to_string();
            }
        } else if title.is_empty() {
            title = text.trim().to_string();
        }
    }

    (artist, title)
}

fn extract_capo(page_text: &str) -> u8 {
    CAPO.captures(page_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Recover a six-note tuning from the page, falling back to standard.
fn extract_tuning(page_text: &str) -> [String; 6] {
    if let Some(caps) = TUNING_LINE.captures(page_text)
        && let Some(rest) = caps.get(1)
    {
        let notes: Vec<String> = TUNING_NOTE
            .find_iter(rest.as_str())
            .take(6)
            .map(|m| m.as_str().to_string())
            .collect();
        if let Ok(tuning) = <[String; 6]>::try_from(notes) {
            return tuning;
        }
    }
    STANDARD_TUNING.map(str::to_string)
}

/// Extract song references from an artist or search page.
///
/// Walks anchors that point at chord pages, resolves them against `base`,
/// and dedupes by (artist, title). Link text of the form "Artist - Title"
/// names both fields; bare titles inherit the page's artist from the URL
/// path where possible.
pub fn extract_song_list(html: &str, base: &Url) -> Vec<SongSummary> {
    let doc = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut songs = Vec::new();

    for element in doc.select(&anchor) {
        let Some(href) = element.value().attr("href") else { continue };
        if !href.contains("chords") {
            continue;
        }
        let Ok(resolved) = base.join(href) else { continue };

        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let (artist, title) = match text.split_once(" - ") {
            Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
            None => (artist_from_path(&resolved).unwrap_or_default(), text.to_string()),
        };

        if seen.insert(generate_key(&artist, &title)) {
            songs.push(SongSummary { artist, title, url: resolved.to_string() });
        }
    }

    songs
}

/// "/chords/guns-n-roses/sweet-child-o-mine" -> "guns-n-roses".
fn artist_from_path(url: &Url) -> Option<String> {
    let mut segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    segments.pop()?;
    segments.pop().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG_PAGE: &str = r#"
        <html><head><title>Wonderwall chords</title></head><body>
        <h1>Wonderwall by Oasis</h1>
        <p>Capo: 2nd fret. Tuning: E A D G B E</p>
        <pre>
[Intro]
Em7  G  Dsus4  A7sus4

[Verse]
Em7              G
Today is gonna be the day
Dsus4                 A7sus4
That they're gonna throw it back to you
        </pre>
        <pre>Just some prose in a pre block, no music here.</pre>
        </body></html>"#;

    #[test]
    fn test_extract_chord_sheet() {
        let sheet = extract_chord_sheet(SONG_PAGE, "Oasis", "Wonderwall").unwrap();
        assert_eq!(sheet.artist, "Oasis");
        assert_eq!(sheet.title, "Wonderwall");
        assert!(sheet.song_chords.contains("Em7  G  Dsus4  A7sus4"));
        assert_eq!(sheet.song_key, "Em");
        assert_eq!(sheet.guitar_capo, 2);
        assert_eq!(sheet.guitar_tuning, STANDARD_TUNING.map(str::to_string));
    }

    #[test]
    fn test_extract_names_from_heading() {
        let sheet = extract_chord_sheet(SONG_PAGE, "", "").unwrap();
        assert_eq!(sheet.artist, "Oasis");
        assert_eq!(sheet.title, "Wonderwall");
    }

    #[test]
    fn test_extract_fails_without_chord_block() {
        let html = "<html><body><p>nothing musical</p></body></html>";
        let result = extract_chord_sheet(html, "a", "b");
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_extract_dropped_tuning_defaults_to_standard() {
        let html = r#"<html><body><pre>Am  C  D  F</pre></body></html>"#;
        let sheet = extract_chord_sheet(html, "The Animals", "House of the Rising Sun").unwrap();
        assert_eq!(sheet.guitar_tuning, STANDARD_TUNING.map(str::to_string));
        assert_eq!(sheet.guitar_capo, 0);
    }

    #[test]
    fn test_extract_drop_d_tuning() {
        let html = r#"<html><body>
            <p>Tuning: D A D G B E</p>
            <pre>D5  G  A</pre>
        </body></html>"#;
        let sheet = extract_chord_sheet(html, "a", "b").unwrap();
        assert_eq!(sheet.guitar_tuning[0], "D");
        assert_eq!(sheet.guitar_tuning[1], "A");
    }

    #[test]
    fn test_extract_song_list() {
        let base = Url::parse("https://chords.example.com/").unwrap();
        let html = r#"<html><body>
            <a href="/chords/oasis/wonderwall">Oasis - Wonderwall</a>
            <a href="/chords/oasis/wonderwall">Oasis - Wonderwall</a>
            <a href="/chords/guns-n-roses/sweet-child-o-mine">Sweet Child O Mine</a>
            <a href="/about">About us</a>
        </body></html>"#;

        let songs = extract_song_list(html, &base);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].artist, "Oasis");
        assert_eq!(songs[0].title, "Wonderwall");
        assert_eq!(songs[0].url, "https://chords.example.com/chords/oasis/wonderwall");
        assert_eq!(songs[1].artist, "guns-n-roses");
    }

    #[test]
    fn test_song_list_empty_page() {
        let base = Url::parse("https://chords.example.com/").unwrap();
        assert!(extract_song_list("<html><body></body></html>", &base).is_empty());
    }
}
