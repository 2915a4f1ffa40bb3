//! Properties that must hold for every score, checked over generated
//! inputs and the fixtures.

use gabc::pitch::{AccidentalScope, PitchTable, LETTERS};
use gabc::{
    parse, parse_with, to_abc, to_lilypond, to_midi, to_tab, Clef, MidiParams, ParseOptions, Score,
    Sign, Tessitura, Transposition,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const CLEFS: [&str; 8] = ["c1", "c2", "c3", "c4", "f1", "f2", "f3", "f4"];
const MARKS: [&str; 6] = ["", "_", ".", "'", "w", "~"];

fn body(music: &str) -> String {
    format!("%%\n{}", music)
}

fn fixtures() -> Vec<String> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let mut paths: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|x| x == "gabc"))
        .collect();
    paths.sort();
    paths.into_iter().map(|p| fs::read_to_string(p).unwrap()).collect()
}

/// Two-note neumes with every pair of marks, followed by a bar.
fn generated() -> Vec<String> {
    let mut inputs = Vec::new();
    for first in ['f', 'g', 'h'] {
        for second in ['g', 'h', 'i'] {
            for m1 in MARKS {
                for m2 in MARKS {
                    inputs.push(body(&format!(
                        "(c4) A({}{}{}{}) B(ghg) (:)",
                        first, m1, second, m2
                    )));
                }
            }
        }
    }
    inputs
}

/// Durations of the sounding notes, grouped by beamed element.
fn elements(score: &Score, signs: &[gabc::SignId]) -> Vec<Vec<f64>> {
    let mut groups: Vec<Vec<f64>> = Vec::new();
    for note in signs.iter().filter_map(|&id| score.sign(id).as_note()) {
        match groups.last_mut() {
            Some(group) if !note.element_start => group.push(note.duration),
            _ => groups.push(vec![note.duration]),
        }
    }
    groups
}

#[test]
fn test_last_note_of_element_never_shorter() {
    for input in generated().into_iter().chain(fixtures()) {
        let score = parse(&input).unwrap().value;
        for syllable in score.syllables() {
            for durations in elements(&score, &syllable.neume.signs) {
                if let [.., earlier, later] = durations[..] {
                    assert!(
                        later >= earlier,
                        "{:?} in {:?} breaks the element duration order",
                        durations,
                        syllable.text
                    );
                }
            }
        }
    }
}

#[test]
fn test_element_boundaries_keep_lengths_apart() {
    for bar in [",", ";", ":", "/", "."] {
        let score = parse(&body(&format!("(c4) A(f{}g)", bar))).unwrap().value;
        let last = score.notes().last().map(|n| n.duration);
        assert_eq!(last, Some(1.0), "note after '{}'", bar);
    }
}

#[test]
fn test_accidental_scope_starts_empty_each_word() {
    for code in CLEFS {
        let clef = Clef::parse(code).unwrap();
        let table = PitchTable::for_clef(&clef);
        for si in table.si_letters() {
            let input = body(&format!("({}) A({}x{}) B({})", code, si, si, si));
            let score = parse(&input).unwrap().value;
            let pitches: Vec<i32> = score.notes().map(|n| n.pitch).collect();
            let natural = table.pitch(si).unwrap();
            assert_eq!(pitches, vec![natural - 1, natural], "clef {} letter {}", code, si);
        }
    }
}

#[test]
fn test_flat_at_clef_seeds_every_word() {
    for code in ["cb1", "cb2", "cb3", "cb4", "fb3", "fb4"] {
        let clef = Clef::parse(code).unwrap();
        let table = PitchTable::for_clef(&clef);
        for si in table.si_letters() {
            let input = body(&format!("({}) A({}y{}) B({})", code, si, si, si));
            let score = parse(&input).unwrap().value;
            let pitches: Vec<i32> = score.notes().map(|n| n.pitch).collect();
            let natural = table.pitch(si).unwrap();
            assert_eq!(pitches, vec![natural, natural - 1], "clef {} letter {}", code, si);
        }
    }
}

#[test]
fn test_pitch_round_trip() {
    for code in CLEFS.iter().map(|c| c.to_string()).chain(["cb3".to_string(), "fb4".to_string()]) {
        let clef = Clef::parse(&code).unwrap();
        let table = PitchTable::for_clef(&clef);
        for scope in [AccidentalScope::default(), AccidentalScope::seeded(&clef, &table)] {
            for letter in LETTERS {
                let pitch = table.resolve(letter, &scope).unwrap();
                assert_eq!(
                    table.letter_for(pitch, &scope),
                    Some(letter),
                    "clef {} letter {}",
                    code,
                    letter
                );
            }
        }
    }
}

#[test]
fn test_episema_twice_same_as_once() {
    for letter in LETTERS {
        let once = parse(&body(&format!("(c4) A(g) B({}_)", letter))).unwrap().value;
        let twice = parse(&body(&format!("(c4) A(g) B({}__)", letter))).unwrap().value;
        let last = |s: &Score| s.notes().last().map(|n| n.duration);
        assert_eq!(last(&once), last(&twice), "letter {}", letter);
    }
}

#[test]
fn test_transposition_law() {
    let params = MidiParams::default();
    for input in generated().into_iter().chain(fixtures()) {
        let auto = parse(&input).unwrap().value;
        let tessitura = auto.tessitura().unwrap();
        let expected = 66 - ((tessitura.min + tessitura.max) as f64 / 2.0).round() as i32;
        assert_eq!(auto.transposition, Transposition::Automatic(expected));

        let options = ParseOptions {
            transposition: Some(expected),
            ..ParseOptions::default()
        };
        let manual = parse_with(&input, &options).unwrap().value;
        assert_eq!(manual.transposition, Transposition::Manual(expected));

        assert_eq!(to_midi(&auto, &params), to_midi(&manual, &params));
        assert_eq!(to_lilypond(&auto), to_lilypond(&manual));
        assert_eq!(to_abc(&auto), to_abc(&manual));
        assert_eq!(to_tab(&auto), to_tab(&manual));
    }
}

#[test]
fn test_tessitura_matches_notes() {
    for input in fixtures() {
        let score = parse(&input).unwrap().value;
        let pitches: Vec<i32> = score.notes().map(|n| n.pitch).collect();
        assert_eq!(
            score.tessitura(),
            Some(Tessitura {
                min: *pitches.iter().min().unwrap(),
                max: *pitches.iter().max().unwrap(),
            })
        );
    }
}

#[test]
fn test_clefs_stay_off_the_chain() {
    for input in fixtures() {
        let score = parse(&input).unwrap().value;
        for syllable in score.syllables() {
            for &id in &syllable.neume.signs {
                if matches!(score.sign(id), Sign::Clef(_)) {
                    assert_eq!(score.signs.predecessor(id), None);
                }
                for earlier in score.signs.chain(score.signs.predecessor(id)) {
                    assert!(!matches!(score.sign(earlier), Sign::Clef(_)));
                }
            }
        }
    }
}
