//! ABC rendering, with `L:1/8` so one unit is one note of duration 1.
//!
//! Notes of one beamed element are written without spaces. Accidentals
//! follow ABC rules: an explicit sign holds until the next bar line, and
//! is only written when it differs from the key signature or from an
//! earlier sign in the same bar.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{neume_signs, sounding_pitch};
use crate::key::Key;
use crate::lyrics;
use crate::score::{BarStrength, Note, Score, Sign};

/// Tune body split into lines, each with its aligned `w:` lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abc {
    /// Key for the `K:` field, e.g. `F` or `Bb`
    pub key: String,
    pub lines: Vec<AbcLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbcLine {
    pub music: String,
    pub lyrics: String,
}

impl Abc {
    /// Music lines, each followed by its `w:` line.
    pub fn body(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.music);
            out.push('\n');
            if !line.lyrics.is_empty() {
                out.push_str("w: ");
                out.push_str(&line.lyrics);
                out.push('\n');
            }
        }
        out
    }
}

/// Accidentals written so far in the current bar, by step and octave.
type BarAccidentals = HashMap<(usize, i32), i32>;

pub fn render(score: &Score) -> Abc {
    let key = score.rendered_key();
    let mut lines = Vec::new();
    let mut line = AbcLine::default();
    let mut accidentals = BarAccidentals::new();

    for word in &score.words {
        let mut first_in_word = true;
        for syllable in &word.syllables {
            let mut first_note = true;
            for sign in neume_signs(score, syllable) {
                match sign {
                    Sign::Bar(strength) => {
                        let kept = line.music.trim_end().len();
                        line.music.truncate(kept);
                        line.music.push(' ');
                        line.music.push_str(bar_token(*strength));
                        line.music.push(' ');
                        accidentals.clear();
                        if *strength >= BarStrength::Full {
                            lines.push(finish_line(std::mem::take(&mut line)));
                        }
                    }
                    sign => {
                        let Some(note) = sign.as_note() else {
                            continue;
                        };
                        let pitch = sounding_pitch(score, note);
                        line.music.push_str(&note_token(note, pitch, key, &mut accidentals));
                        if note.element_end {
                            line.music.push(' ');
                        }

                        if first_note {
                            if !line.lyrics.is_empty() {
                                line.lyrics.push(if first_in_word { ' ' } else { '-' });
                            }
                            line.lyrics.push_str(&lyric_token(&syllable.text));
                            first_note = false;
                            first_in_word = false;
                        } else {
                            line.lyrics.push('_');
                        }
                    }
                }
            }
        }
    }

    if !line.music.trim().is_empty() {
        lines.push(finish_line(line));
    }
    Abc {
        key: key.abc_name(),
        lines,
    }
}

fn finish_line(line: AbcLine) -> AbcLine {
    AbcLine {
        music: line.music.trim().to_string(),
        lyrics: line.lyrics,
    }
}

fn bar_token(strength: BarStrength) -> &'static str {
    match strength {
        BarStrength::None => "[|]",
        BarStrength::Quarter => "!shortphrase!|",
        BarStrength::Half => "!mediumphrase!|",
        BarStrength::Full => "|",
        BarStrength::Double => "||",
    }
}

fn note_token(note: &Note, pitch: i32, key: Key, accidentals: &mut BarAccidentals) -> String {
    let mut token = String::new();
    let ornaments = note.ornaments;
    if ornaments.episema || ornaments.pre_quilisma {
        token.push_str("!tenuto!");
    }
    if ornaments.ictus {
        token.push_str("!wedge!");
    }
    if ornaments.quilisma {
        token.push_str("!uppermordent!");
    }

    let spelling = key.spell(pitch);
    let octave = pitch.div_euclid(12) - 5;
    let expected = accidentals
        .get(&(spelling.step, octave))
        .copied()
        .unwrap_or_else(|| key.signature(spelling.step));
    if spelling.alter != expected {
        token.push_str(match spelling.alter {
            1 => "^",
            -1 => "_",
            _ => "=",
        });
        accidentals.insert((spelling.step, octave), spelling.alter);
    }

    let letter = ['C', 'D', 'E', 'F', 'G', 'A', 'B'][spelling.step];
    if octave >= 1 {
        token.push(letter.to_ascii_lowercase());
        for _ in 1..octave {
            token.push('\'');
        }
    } else {
        token.push(letter);
        for _ in octave..0 {
            token.push(',');
        }
    }

    token.push_str(&length(note.duration));
    token
}

/// Length suffix relative to `L:1/8`, rounded to half units.
fn length(duration: f64) -> String {
    let halves = ((duration * 2.0).round() as i64).max(1);
    match halves {
        1 => "/".to_string(),
        2 => String::new(),
        h if h % 2 == 0 => (h / 2).to_string(),
        h => format!("{}/2", h),
    }
}

fn lyric_token(text: &str) -> String {
    let cleaned = lyrics::clean(text);
    if cleaned.is_empty() {
        return "*".to_string();
    }
    cleaned
        .replace('-', "\\-")
        .replace('_', "\\_")
        .replace(' ', "~")
}
