//! Fixture-based tests for gabc parsing and rendering.
//!
//! Each .gabc file in tests/fixtures/ is parsed and run through every
//! renderer.

use gabc::{parse, to_abc, to_lilypond, to_midi, to_tab, MidiParams};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use std::fs;
use std::path::Path;

fn load(name: &str) -> String {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.gabc", name));

    fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

fn test_fixture(name: &str) {
    let gabc_content = load(name);

    let result = parse(&gabc_content)
        .unwrap_or_else(|e| panic!("Fixture {} failed to parse: {}", name, e));
    assert!(
        !result.has_warnings(),
        "Fixture {} had warnings: {:?}",
        name,
        result.feedback
    );
    let score = &result.value;
    let note_count = score.notes().count();
    assert!(note_count > 0, "Fixture {} has no notes", name);

    // MIDI: one note-on per sounding note, lyrics present
    let midi = to_midi(score, &MidiParams::default());
    assert_eq!(&midi[0..4], b"MThd", "Fixture {} produced invalid MIDI header", name);
    let smf = Smf::parse(&midi).unwrap_or_else(|e| panic!("Fixture {}: bad SMF: {}", name, e));
    let mut note_ons = 0;
    let mut lyrics = 0;
    for event in &smf.tracks[0] {
        match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { vel, .. },
                ..
            } if vel.as_int() > 0 => note_ons += 1,
            TrackEventKind::Meta(MetaMessage::Lyric(_)) => lyrics += 1,
            _ => {}
        }
    }
    assert_eq!(note_ons, note_count, "Fixture {} lost notes in MIDI", name);
    assert!(lyrics > 0, "Fixture {} has no lyric events", name);

    // LilyPond: balanced slurs and beams
    let lily = to_lilypond(score);
    assert_eq!(
        lily.music.matches('(').count(),
        lily.music.matches(')').count(),
        "Fixture {} has unbalanced slurs",
        name
    );
    assert_eq!(
        lily.music.matches('[').count(),
        lily.music.matches(']').count(),
        "Fixture {} has unbalanced beams",
        name
    );
    assert!(!lily.lyrics.is_empty());

    // ABC: every line has music
    let abc = to_abc(score);
    assert!(!abc.lines.is_empty());
    assert!(abc.lines.iter().all(|l| !l.music.is_empty()));

    // Tab: one line per syllable plus one per word
    let tab = to_tab(score);
    let syllables = score.syllables().count();
    assert_eq!(tab.lines().count(), syllables + score.words.len());

    println!(
        "Fixture {}: {} notes, {} bytes MIDI, {} feedback items",
        name,
        note_count,
        midi.len(),
        result.feedback.len()
    );
}

#[test]
fn test_fixture_kyrie() {
    test_fixture("kyrie");
}

#[test]
fn test_fixture_alleluia() {
    test_fixture("alleluia");
}

#[test]
fn test_fixture_introit() {
    test_fixture("introit");
}

#[test]
fn test_fixture_hymn() {
    test_fixture("hymn");
}

#[test]
fn test_kyrie_header() {
    let score = parse(&load("kyrie")).unwrap().value;
    assert_eq!(score.title, "Kyrie XVI");
    assert_eq!(score.header.office_part, gabc::OfficePart::Kyriale);
    assert_eq!(score.header.get("mode"), Some("3"));
    assert_eq!(score.key, gabc::Key::C);
}

#[test]
fn test_alleluia_custom_command_reported() {
    let result = parse(&load("alleluia")).unwrap();
    assert_eq!(result.value.key, gabc::Key::F);
    assert_eq!(result.value.header.office_part, gabc::OfficePart::Alleluia);
    assert!(result
        .feedback
        .iter()
        .any(|f| f.level == gabc::FeedbackLevel::Info && f.message.contains("uh:l")));
}

#[test]
fn test_introit_clef_change() {
    let score = parse(&load("introit")).unwrap().value;
    let clefs: Vec<u8> = score
        .words
        .iter()
        .filter_map(|w| w.clef.map(|c| c.line))
        .collect();
    assert_eq!(clefs.first(), Some(&2));
    assert_eq!(clefs.last(), Some(&3));
    assert!(score.lyrics().starts_with("PUer natus est nobis,"));
}

#[test]
fn test_hymn_lyrics() {
    let score = parse(&load("hymn")).unwrap().value;
    let text = score.lyrics();
    assert!(text.starts_with("VEni creátor Spíritus,"));
    assert!(text.ends_with("Amen."));
}
