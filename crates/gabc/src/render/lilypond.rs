//! LilyPond rendering.
//!
//! Each neume with several notes is slurred so that it carries a single
//! syllable in `\lyricsto`; beamed elements become beams. A dotted note
//! is a quarter and never sits inside a beam.

use serde::{Deserialize, Serialize};

use super::{neume_notes, neume_signs, sounding_pitch};
use crate::key::{lily_pitch_name, Key};
use crate::lyrics;
use crate::score::{BarStrength, Note, Score, Sign, Word};

/// Music and lyrics ready to be dropped into a LilyPond template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LilyPond {
    /// Tonic of the rendered key, e.g. `f` or `bes`
    pub key: String,
    pub music: String,
    pub lyrics: String,
}

pub fn render(score: &Score) -> LilyPond {
    let key = score.rendered_key();
    LilyPond {
        key: key.lily_name(),
        music: music(score, key),
        lyrics: lyrics(score),
    }
}

/// Pitch, octave marks, length and ornament suffixes of one note.
pub(crate) fn note_token(note: &Note, pitch: i32, key: Key) -> String {
    let mut token = lily_pitch_name(key.spell(pitch));
    let octave = pitch.div_euclid(12) - 4;
    let mark = if octave > 0 { "'" } else { "," };
    for _ in 0..octave.unsigned_abs() {
        token.push_str(mark);
    }
    token.push_str(if note.ornaments.point { "4" } else { "8" });

    let ornaments = note.ornaments;
    if ornaments.episema || ornaments.pre_quilisma {
        token.push_str("--");
    }
    if ornaments.ictus {
        token.push_str("-!");
    }
    if ornaments.quilisma {
        token.push_str("\\prall");
    }
    token
}

pub(crate) fn bar_token(strength: BarStrength) -> &'static str {
    match strength {
        BarStrength::None => "\\bar \"\"",
        BarStrength::Quarter | BarStrength::Half => "\\bar \"'\"",
        BarStrength::Full => "\\bar \"|\"",
        BarStrength::Double => "\\bar \"||\"",
    }
}

fn music(score: &Score, key: Key) -> String {
    let mut out = String::new();

    for syllable in score.syllables() {
        let count = neume_notes(score, syllable).count();
        let mut seen = 0;
        let mut beam = false;

        for sign in neume_signs(score, syllable) {
            if let Sign::Bar(strength) = sign {
                out.push(' ');
                out.push_str(bar_token(*strength));
                out.push('\n');
                continue;
            }
            let Some(note) = sign.as_note() else {
                continue;
            };
            seen += 1;

            let mut token = note_token(note, sounding_pitch(score, note), key);
            if !beam && note.element_start && !note.element_end && !note.ornaments.point {
                token.push('[');
                beam = true;
            } else if beam && note.element_end {
                token.push(']');
                beam = false;
            }
            if count > 1 && seen == 1 {
                token.push('(');
            } else if count > 1 && seen == count {
                token.push(')');
            }
            if note.ornaments.liquescence {
                token = format!("\\tiny {} \\normalsize", token);
            }
            out.push(' ');
            out.push_str(&token);
        }
    }

    out.push('\n');
    out
}

/// Lyric text of one syllable as a LilyPond lyric token.
fn syllable_token(text: &str) -> String {
    lyrics::clean(text).replace(' ', "_").replace('*', "&zwj;*")
}

/// The lyric tokens of a word joined with hyphens, or `None` when no
/// syllable of the word carries a note.
fn word_tokens(word: &Word) -> Option<Vec<String>> {
    if !word.has_note() {
        return None;
    }
    let mut tokens: Vec<String> = Vec::new();
    let mut prefix = String::new();
    for syllable in &word.syllables {
        let text = syllable_token(&syllable.text);
        if syllable.neume.has_note {
            let mut token = std::mem::take(&mut prefix);
            token.push_str(&text);
            tokens.push(if token.is_empty() { "_".to_string() } else { token });
        } else if let Some(last) = tokens.last_mut() {
            last.push_str(&text);
        } else {
            prefix.push_str(&text);
        }
    }
    Some(tokens)
}

/// `\lyricmode` content. A word sung on no note (typically a `*` or a
/// verse sign on a bar) is tied to the previous lyric, or given to the
/// next word when that word has no text of its own.
fn lyrics(score: &Score) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;

    for word in &score.words {
        let Some(mut tokens) = word_tokens(word) else {
            let text: String = word.syllables.iter().map(|s| syllable_token(&s.text)).collect();
            if !text.is_empty() {
                pending = Some(match pending.take() {
                    Some(p) => format!("{}_{}", p, text),
                    None => text,
                });
            }
            continue;
        };

        if let Some(carried) = pending.take() {
            if tokens.iter().all(|t| t == "_") {
                tokens[0] = carried;
            } else if let Some(last) = out.last_mut() {
                last.push('_');
                last.push_str(&carried);
            } else {
                tokens[0] = format!("{}_{}", carried, tokens[0]);
            }
        }
        out.push(tokens.join(" -- "));
    }

    if let Some(carried) = pending {
        match out.last_mut() {
            Some(last) => {
                last.push('_');
                last.push_str(&carried);
            }
            None => out.push(carried),
        }
    }
    out.join(" ")
}
