//! Renderers over a finished score.
//!
//! Every renderer is a single forward pass over words, syllables and
//! neumes. None of them mutates the score, so they can run concurrently
//! on a shared reference.

pub mod abc;
pub mod lilypond;
pub mod midi;
pub mod tab;

use crate::score::{Note, Score, Sign, Syllable};

/// Signs of a syllable's neume, in order.
pub(crate) fn neume_signs<'a>(
    score: &'a Score,
    syllable: &'a Syllable,
) -> impl Iterator<Item = &'a Sign> {
    syllable.neume.signs.iter().map(move |&id| score.sign(id))
}

/// Sounding notes of a syllable's neume.
pub(crate) fn neume_notes<'a>(
    score: &'a Score,
    syllable: &'a Syllable,
) -> impl Iterator<Item = &'a Note> {
    neume_signs(score, syllable).filter_map(Sign::as_note)
}

/// Pitch as rendered, transposition included.
pub(crate) fn sounding_pitch(score: &Score, note: &Note) -> i32 {
    note.pitch + score.transposition.value()
}
