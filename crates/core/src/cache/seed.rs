//! Built-in sample library.
//!
//! On a designated bootstrap run the seeder inserts a small set of sample
//! chord sheets as saved records, so a brand-new install has something in
//! "My Chord Sheets". Seeding is skipped entirely once the user has any
//! saved records, and individual samples are skipped when their id is
//! already present, so repeated startups never duplicate rows.

use super::key::generate_key;
use super::records::{ChordSheetPayload, STANDARD_TUNING};
use super::repository::ChordSheetRepository;
use crate::Error;

fn standard_tuning() -> [String; 6] {
    STANDARD_TUNING.map(str::to_string)
}

/// The fixed sample set inserted on first run.
pub fn sample_payloads() -> Vec<ChordSheetPayload> {
    vec![
        ChordSheetPayload {
            title: "Wonderwall".to_string(),
            artist: "Oasis".to_string(),
            song_chords: "[Intro]\n\
                          Em7  G  Dsus4  A7sus4   (x4)\n\n\
                          [Verse]\n\
                          Em7       G\n\
                          Dsus4     A7sus4\n\
                          Em7       G\n\
                          Dsus4     A7sus4\n\n\
                          [Pre-Chorus]\n\
                          Cadd9  Dsus4  A7sus4\n\
                          Cadd9  Dsus4  A7sus4  G\n\n\
                          [Chorus]\n\
                          Cadd9  Em7  G  Em7\n\
                          Cadd9  Em7  G  Em7"
                .to_string(),
            song_key: "Em".to_string(),
            guitar_tuning: standard_tuning(),
            guitar_capo: 2,
        },
        ChordSheetPayload {
            title: "Knockin' on Heaven's Door".to_string(),
            artist: "Bob Dylan".to_string(),
            song_chords: "[Verse]\n\
                          G  D  Am7\n\
                          G  D  C\n\
                          G  D  Am7\n\
                          G  D  C\n\n\
                          [Chorus]\n\
                          G  D  Am7\n\
                          G  D  C"
                .to_string(),
            song_key: "G".to_string(),
            guitar_tuning: standard_tuning(),
            guitar_capo: 0,
        },
        ChordSheetPayload {
            title: "House of the Rising Sun".to_string(),
            artist: "The Animals".to_string(),
            song_chords: "[Intro]\n\
                          Am  C  D  F\n\
                          Am  C  E  E\n\n\
                          [Verse]\n\
                          Am  C  D  F\n\
                          Am  C  E  E\n\
                          Am  C  D  F\n\
                          Am  E  Am  E"
                .to_string(),
            song_key: "Am".to_string(),
            guitar_tuning: standard_tuning(),
            guitar_capo: 0,
        },
    ]
}

/// Insert the sample library through the repository, saved.
///
/// Returns the number of sheets inserted. Idempotent: a user with saved
/// records, or a database that already carries the sample ids, is left
/// alone.
pub async fn seed_samples(repo: &ChordSheetRepository) -> Result<u32, Error> {
    if !repo.get_all_saved().await?.is_empty() {
        tracing::debug!("saved records present, skipping sample seeding");
        return Ok(0);
    }

    let mut inserted = 0u32;
    for payload in sample_payloads() {
        let id = generate_key(&payload.artist, &payload.title);
        if repo.contains(&id).await? {
            continue;
        }
        repo.store(&payload, true, &id).await?;
        inserted += 1;
    }

    tracing::info!(inserted, "sample chord sheets seeded");
    Ok(inserted)
}
