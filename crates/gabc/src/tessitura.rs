//! Pitch range and the transposition derived from it.

use serde::{Deserialize, Serialize};

/// Lowest and highest resolved pitch of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tessitura {
    pub min: i32,
    pub max: i32,
}

impl Tessitura {
    pub fn of(pitches: impl IntoIterator<Item = i32>) -> Option<Tessitura> {
        pitches.into_iter().fold(None, |range, p| {
            Some(match range {
                None => Tessitura { min: p, max: p },
                Some(Tessitura { min, max }) => Tessitura {
                    min: min.min(p),
                    max: max.max(p),
                },
            })
        })
    }

    /// Middle of the range, rounded half away from zero.
    pub fn center(&self) -> i32 {
        ((self.min + self.max) as f64 / 2.0).round() as i32
    }
}

/// Semitones added to every pitch at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transposition {
    Manual(i32),
    Automatic(i32),
}

impl Transposition {
    /// A manual value wins; otherwise center the tessitura on `reference`.
    /// A score without notes is not transposed.
    pub fn resolve(manual: Option<i32>, tessitura: Option<Tessitura>, reference: i32) -> Self {
        match (manual, tessitura) {
            (Some(t), _) => Transposition::Manual(t),
            (None, Some(range)) => Transposition::Automatic(reference - range.center()),
            (None, None) => Transposition::Automatic(0),
        }
    }

    pub fn value(&self) -> i32 {
        match *self {
            Transposition::Manual(t) | Transposition::Automatic(t) => t,
        }
    }
}

impl Default for Transposition {
    fn default() -> Self {
        Transposition::Automatic(0)
    }
}
