//! Sign factory: turns one music span into tagged signs using winnow
//! combinators.
//!
//! Character classes are disjoint. A clef code (`c4`, `f3`, `cb3`) is cut
//! out of the span first; the text around it is classified on its own.

use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::error::GabcError;
use crate::feedback::FeedbackCollector;
use crate::pitch::{letter_index, AccidentalKind, Clef};
use crate::score::{Accidental, BarStrength, Note, RhythmicKind, Sign, SpecialNote};

type PResult<T> = winnow::ModalResult<T>;

/// Classify a music span into signs, in order.
pub fn parse_signs(
    music: &str,
    segment: usize,
    collector: &mut FeedbackCollector,
) -> Result<Vec<Sign>, GabcError> {
    let mut signs = Vec::new();
    let mut rest = music;
    while let Some((start, end)) = find_clef(rest) {
        classify(&rest[..start], segment, collector, &mut signs)?;
        signs.push(Sign::Clef(Clef::parse(&rest[start..end])?));
        rest = &rest[end..];
    }
    classify(rest, segment, collector, &mut signs)?;
    Ok(signs)
}

/// Byte range of the first clef code in `span`: `c` or `f`, an optional
/// `b`, then a digit.
fn find_clef(span: &str) -> Option<(usize, usize)> {
    let bytes = span.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'c' || b == b'f')
        .find_map(|(i, _)| {
            let mut digit = i + 1;
            if bytes.get(digit) == Some(&b'b') {
                digit += 1;
            }
            bytes
                .get(digit)
                .is_some_and(u8::is_ascii_digit)
                .then_some((i, digit + 1))
        })
}

fn classify(
    span: &str,
    segment: usize,
    collector: &mut FeedbackCollector,
    signs: &mut Vec<Sign>,
) -> Result<(), GabcError> {
    let mut input = span;
    while let Some(c) = input.chars().next() {
        let checkpoint = input;
        match sign.parse_next(&mut input) {
            Ok(sign) => signs.push(sign),
            Err(_) => {
                input = checkpoint;
                if matches!(c, 'x' | 'y' | '#' | '+') {
                    return Err(GabcError::syntax(
                        format!("'{}' must follow a pitch letter", c),
                        segment,
                    ));
                }
                collector.warning(format!("Dropping unknown character '{}'", c));
                input = &input[c.len_utf8()..];
            }
        }
    }
    Ok(())
}

fn sign(input: &mut &str) -> PResult<Sign> {
    alt((
        pitched,
        rhythmic_mark,
        special_note,
        bar,
        one_of(['/', ' ']).value(Sign::Cut),
        (one_of(['z', 'Z']), opt(one_of(['0', '+', '-']))).value(Sign::End),
        '!'.value(Sign::Caesura),
    ))
    .parse_next(input)
}

/// A staff letter, alone (note) or followed by `x`/`y`/`#` (accidental) or
/// `+` (custos).
fn pitched(input: &mut &str) -> PResult<Sign> {
    let letter = one_of(|c: char| letter_index(c).is_some()).parse_next(input)?;
    let modifier = opt(one_of(['x', 'y', '#', '+'])).parse_next(input)?;
    let lower = letter.to_ascii_lowercase();
    let accidental = |kind| Sign::Accidental(Accidental { letter: lower, kind });
    Ok(match modifier {
        Some('x') => accidental(AccidentalKind::Flat),
        Some('y') => accidental(AccidentalKind::Natural),
        Some('#') => accidental(AccidentalKind::Sharp),
        Some(_) => Sign::Custos(lower),
        None => Sign::Note(Note::new(letter, letter.is_ascii_uppercase())),
    })
}

/// Rhythmic mark, with any position digits (`_0`, `.1`) swallowed.
fn rhythmic_mark(input: &mut &str) -> PResult<Sign> {
    let kind = one_of(['\'', '_', '.', 'w', '~'])
        .map(|c| match c {
            '\'' => RhythmicKind::Ictus,
            '_' => RhythmicKind::Episema,
            '.' => RhythmicKind::Point,
            'w' => RhythmicKind::Quilisma,
            _ => RhythmicKind::Liquescence,
        })
        .parse_next(input)?;
    take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    Ok(Sign::RhythmicMark(kind))
}

fn special_note(input: &mut &str) -> PResult<Sign> {
    one_of(['o', 's', 'v', 'O', 'S', 'V'])
        .map(|marker| Sign::SpecialNote(SpecialNote { marker, repeat: None }))
        .parse_next(input)
}

/// One bar character. `::` arrives as two full bars and is merged by the
/// builder.
fn bar(input: &mut &str) -> PResult<Sign> {
    let strength = one_of(['`', ',', ';', ':'])
        .map(|c| match c {
            '`' => BarStrength::None,
            ',' => BarStrength::Quarter,
            ';' => BarStrength::Half,
            _ => BarStrength::Full,
        })
        .parse_next(input)?;
    take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    Ok(Sign::Bar(strength))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::ClefKind;

    fn parse(music: &str) -> Vec<Sign> {
        let mut collector = FeedbackCollector::new();
        parse_signs(music, 0, &mut collector).unwrap()
    }

    #[test]
    fn test_clef_alone() {
        let signs = parse("cb3");
        assert_eq!(
            signs,
            vec![Sign::Clef(Clef {
                kind: ClefKind::C,
                line: 3,
                flat: true
            })]
        );
    }

    #[test]
    fn test_clef_inside_span() {
        let signs = parse("g::c3h");
        assert!(matches!(signs[0], Sign::Note(ref n) if n.letter == 'g'));
        assert_eq!(signs[1], Sign::Bar(BarStrength::Full));
        assert_eq!(signs[2], Sign::Bar(BarStrength::Full));
        assert!(matches!(signs[3], Sign::Clef(Clef { line: 3, .. })));
        assert!(matches!(signs[4], Sign::Note(ref n) if n.letter == 'h'));
    }

    #[test]
    fn test_bad_clef_line() {
        let mut collector = FeedbackCollector::new();
        assert!(matches!(
            parse_signs("c7", 0, &mut collector),
            Err(GabcError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_character_classes() {
        let signs = parse("Gh_0.'w~sv/;!z`,");
        assert!(matches!(signs[0], Sign::Note(ref n) if n.letter == 'g' && n.inclinatum));
        assert!(matches!(signs[1], Sign::Note(ref n) if n.letter == 'h' && !n.inclinatum));
        assert_eq!(signs[2], Sign::RhythmicMark(RhythmicKind::Episema));
        assert_eq!(signs[3], Sign::RhythmicMark(RhythmicKind::Point));
        assert_eq!(signs[4], Sign::RhythmicMark(RhythmicKind::Ictus));
        assert_eq!(signs[5], Sign::RhythmicMark(RhythmicKind::Quilisma));
        assert_eq!(signs[6], Sign::RhythmicMark(RhythmicKind::Liquescence));
        assert!(matches!(signs[7], Sign::SpecialNote(SpecialNote { marker: 's', .. })));
        assert!(matches!(signs[8], Sign::SpecialNote(SpecialNote { marker: 'v', .. })));
        assert_eq!(signs[9], Sign::Cut);
        assert_eq!(signs[10], Sign::Bar(BarStrength::Half));
        assert_eq!(signs[11], Sign::Caesura);
        assert_eq!(signs[12], Sign::End);
        assert_eq!(signs[13], Sign::Bar(BarStrength::None));
        assert_eq!(signs[14], Sign::Bar(BarStrength::Quarter));
        assert_eq!(signs.len(), 15);
    }

    #[test]
    fn test_accidental_and_custos() {
        let signs = parse("ixiyh#g+");
        assert_eq!(
            signs[0],
            Sign::Accidental(Accidental {
                letter: 'i',
                kind: AccidentalKind::Flat
            })
        );
        assert!(matches!(
            signs[1],
            Sign::Accidental(Accidental {
                kind: AccidentalKind::Natural,
                ..
            })
        ));
        assert!(matches!(
            signs[2],
            Sign::Accidental(Accidental {
                kind: AccidentalKind::Sharp,
                ..
            })
        ));
        assert_eq!(signs[3], Sign::Custos('g'));
    }

    #[test]
    fn test_lone_accidental_is_syntax_error() {
        let mut collector = FeedbackCollector::new();
        assert!(matches!(
            parse_signs("x", 3, &mut collector),
            Err(GabcError::Syntax { segment: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_character_dropped() {
        let mut collector = FeedbackCollector::new();
        let signs = parse_signs("g>h", 0, &mut collector).unwrap();
        assert_eq!(signs.len(), 2);
        assert_eq!(collector.feedback().len(), 1);
        assert!(collector.feedback()[0].message.contains('>'));
    }
}
