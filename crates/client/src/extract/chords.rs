//! Chord-line recognition.
//!
//! Chord sheets are plain text where some lines carry chord symbols over the
//! lyrics or in bare progressions. Recognition works token-by-token: a line
//! is a chord line when its musical tokens outnumber everything else on it.

use regex::Regex;
use std::sync::LazyLock;

/// One chord symbol: root, optional accidental, quality, extension, and an
/// optional slash bass. Matches Em7, F#m, Dsus4, A7sus4, Cadd9, G/B.
static CHORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-G][#b]?(?:maj|min|m|dim|aug)?(?:\d{1,2})?(?:sus\d|add\d{1,2})?(?:/[A-G][#b]?)?$").unwrap()
});

/// Root and quality of a chord, for key detection. "Em7" -> ("E", minor).
static CHORD_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-G][#b]?)(maj|min|m|dim|aug)?").unwrap());

/// Tokens that decorate chord lines without being chords: bars, repeat
/// marks, dashes.
static DECORATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\||-+|x\d{1,2}|\(x\d{1,2}\))$").unwrap());

/// Whether a single token is a chord symbol.
pub fn is_chord_token(token: &str) -> bool {
    CHORD_TOKEN.is_match(token)
}

/// Count the chord tokens on a line.
pub fn chord_count(line: &str) -> usize {
    line.split_whitespace().filter(|t| is_chord_token(t)).count()
}

/// Whether a line reads as a chord line.
///
/// Section labels like `[Chorus]` and decoration tokens are ignored; the
/// remaining tokens must be mostly chords.
pub fn is_chord_line(line: &str) -> bool {
    let mut chords = 0usize;
    let mut other = 0usize;
    for token in line.split_whitespace() {
        if token.starts_with('[') && token.ends_with(']') {
            continue;
        }
        if DECORATION.is_match(token) {
            continue;
        }
        if is_chord_token(token) {
            chords += 1;
        } else {
            other += 1;
        }
    }
    chords > 0 && chords >= other
}

/// Guess the song key from the first chord of the sheet.
///
/// The opening chord is the most common convention in this corpus of
/// scraped sheets; returns e.g. "Em" for a sheet opening on Em7.
pub fn detect_key(chord_text: &str) -> Option<String> {
    for line in chord_text.lines() {
        if !is_chord_line(line) {
            continue;
        }
        for token in line.split_whitespace() {
            if !is_chord_token(token) {
                continue;
            }
            let caps = CHORD_ROOT.captures(token)?;
            let root = caps.get(1)?.as_str();
            let minor = matches!(caps.get(2).map(|m| m.as_str()), Some("m") | Some("min"));
            return Some(if minor { format!("{root}m") } else { root.to_string() });
        }
    }
    None
}
