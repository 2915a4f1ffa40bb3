//! Major key of a score and how renderers spell pitches in it.

use serde::{Deserialize, Serialize};

/// A major key, stored as the pitch class of its tonic (0 = C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: u8,
}

/// How to write a pitch class: a diatonic step (0 = C .. 6 = B) and an
/// alteration in semitones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelling {
    pub step: usize,
    pub alter: i32,
}

const NATURAL_STEPS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

impl Key {
    pub const C: Key = Key { tonic: 0 };
    pub const F: Key = Key { tonic: 5 };

    pub fn transposed(&self, semitones: i32) -> Key {
        Key {
            tonic: (self.tonic as i32 + semitones).rem_euclid(12) as u8,
        }
    }

    /// Position on the circle of fifths: sharps positive, flats negative.
    pub fn fifths(&self) -> i32 {
        let f = (self.tonic as i32 * 7).rem_euclid(12);
        if f > 6 {
            f - 12
        } else {
            f
        }
    }

    fn prefers_sharps(&self, pitch_class: i32) -> bool {
        let fifths = self.fifths();
        fifths > 0 || (fifths == 0 && pitch_class == 6)
    }

    pub fn spell(&self, pitch: i32) -> Spelling {
        let pc = pitch.rem_euclid(12);
        if let Some(step) = NATURAL_STEPS.iter().position(|&n| n == pc) {
            return Spelling { step, alter: 0 };
        }
        if self.prefers_sharps(pc) {
            let step = NATURAL_STEPS.iter().position(|&n| n == pc - 1).unwrap_or(0);
            Spelling { step, alter: 1 }
        } else {
            let step = NATURAL_STEPS.iter().position(|&n| n == pc + 1).unwrap_or(0);
            Spelling { step, alter: -1 }
        }
    }

    /// Alteration the key signature gives a step.
    pub fn signature(&self, step: usize) -> i32 {
        // F C G D A E B
        const SHARP_ORDER: [usize; 7] = [3, 0, 4, 1, 5, 2, 6];
        let fifths = self.fifths();
        let count = fifths.unsigned_abs() as usize;
        if fifths > 0 && SHARP_ORDER[..count].contains(&step) {
            1
        } else if fifths < 0 && SHARP_ORDER.iter().rev().take(count).any(|&s| s == step) {
            -1
        } else {
            0
        }
    }

    /// Tonic name in LilyPond's Dutch note names.
    pub fn lily_name(&self) -> String {
        let spelling = self.spell(self.tonic as i32);
        lily_pitch_name(spelling)
    }

    pub fn abc_name(&self) -> String {
        let spelling = self.spell(self.tonic as i32);
        let letter = ['C', 'D', 'E', 'F', 'G', 'A', 'B'][spelling.step];
        match spelling.alter {
            1 => format!("{}#", letter),
            -1 => format!("{}b", letter),
            _ => letter.to_string(),
        }
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::C
    }
}

pub(crate) fn lily_pitch_name(spelling: Spelling) -> String {
    let letter = ['c', 'd', 'e', 'f', 'g', 'a', 'b'][spelling.step];
    let suffix = match spelling.alter {
        1 => "is",
        -1 => "es",
        _ => "",
    };
    format!("{}{}", letter, suffix)
}
