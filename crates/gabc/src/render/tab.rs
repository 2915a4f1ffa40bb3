//! Plain-text tablature: one line per syllable with its notes in LilyPond
//! spelling, and `//` closing each word.

use std::fmt::Write;

use super::lilypond::{bar_token, note_token};
use super::{neume_signs, sounding_pitch};
use crate::lyrics;
use crate::score::{Score, Sign};

pub fn render(score: &Score) -> String {
    let key = score.rendered_key();
    let mut out = String::new();

    for word in &score.words {
        for syllable in &word.syllables {
            let tokens: Vec<String> = neume_signs(score, syllable)
                .filter_map(|sign| match sign {
                    Sign::Bar(strength) => Some(bar_token(*strength).to_string()),
                    sign => sign
                        .as_note()
                        .map(|note| note_token(note, sounding_pitch(score, note), key)),
                })
                .collect();
            let _ = writeln!(out, "{}\t{}", lyrics::clean(&syllable.text), tokens.join(" "));
        }
        out.push_str("//\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tab_lines() {
        let mut score = parse("%%\n(c4) Al(gh)le(i.) (::)").unwrap().value;
        score.transposition = crate::Transposition::Manual(0);
        assert_eq!(
            render(&score),
            "\t\n//\nAl\tg'8 a'8\nle\tb'4\n//\n\t\\bar \"||\"\n//\n"
        );
    }
}
