//! Clefs, the letter-to-pitch table, and per-word accidental scope.
//!
//! gabc letters name staff positions, not pitches. `a` is the lowest line
//! space below the staff and `m` the highest above it; which pitch a letter
//! means depends on the active clef. Pitches are MIDI note numbers before
//! transposition.

use serde::{Deserialize, Serialize};

use crate::error::GabcError;

/// Staff position letters, lowest first.
pub const LETTERS: [char; 13] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
];

/// Position of a letter in [`LETTERS`], case-insensitive.
pub fn letter_index(letter: char) -> Option<usize> {
    let lower = letter.to_ascii_lowercase();
    LETTERS.iter().position(|&l| l == lower)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClefKind {
    C,
    F,
}

/// A clef: kind, staff line (1 = bottom), and whether it carries a flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clef {
    pub kind: ClefKind,
    pub line: u8,
    pub flat: bool,
}

impl Clef {
    pub fn new(kind: ClefKind, line: u8, flat: bool) -> Result<Self, GabcError> {
        if !(1..=4).contains(&line) {
            return Err(GabcError::malformed(format!(
                "clef line must be 1-4, got {}",
                line
            )));
        }
        Ok(Clef { kind, line, flat })
    }

    /// Parse a clef code such as `c4`, `f3` or `cb3`.
    pub fn parse(code: &str) -> Result<Self, GabcError> {
        let mut chars = code.chars();
        let kind = match chars.next() {
            Some('c') => ClefKind::C,
            Some('f') => ClefKind::F,
            _ => return Err(GabcError::malformed(format!("unknown clef '{}'", code))),
        };
        let rest: String = chars.collect();
        let (flat, digits) = match rest.strip_prefix('b') {
            Some(digits) => (true, digits),
            None => (false, rest.as_str()),
        };
        let line = digits
            .parse::<u8>()
            .map_err(|_| GabcError::malformed(format!("unknown clef '{}'", code)))?;
        Clef::new(kind, line, flat)
    }

    pub fn code(&self) -> String {
        let kind = match self.kind {
            ClefKind::C => 'c',
            ClefKind::F => 'f',
        };
        if self.flat {
            format!("{}b{}", kind, self.line)
        } else {
            format!("{}{}", kind, self.line)
        }
    }

    /// Scale degree of letter `a` under this clef.
    fn offset(&self) -> usize {
        match (self.kind, self.line) {
            (ClefKind::C, 4) => 0,
            (ClefKind::C, 3) => 2,
            (ClefKind::C, 2) => 4,
            (ClefKind::C, _) => 6,
            (ClefKind::F, 4) => 3,
            (ClefKind::F, 3) => 5,
            (ClefKind::F, 2) => 0,
            (ClefKind::F, _) => 2,
        }
    }

    fn base_octave(&self) -> i32 {
        match (self.kind, self.line) {
            (ClefKind::F, 3) => -12,
            _ => 0,
        }
    }
}

/// Diatonic scale degree, named from `la` as the table does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Degree {
    La,
    Si,
    Do,
    Re,
    Mi,
    Fa,
    Sol,
}

impl Degree {
    pub fn name(&self) -> &'static str {
        match self {
            Degree::La => "la",
            Degree::Si => "si",
            Degree::Do => "do",
            Degree::Re => "re",
            Degree::Mi => "mi",
            Degree::Fa => "fa",
            Degree::Sol => "sol",
        }
    }
}

const SCALE: [(Degree, i32); 7] = [
    (Degree::La, 57),
    (Degree::Si, 59),
    (Degree::Do, 60),
    (Degree::Re, 62),
    (Degree::Mi, 64),
    (Degree::Fa, 65),
    (Degree::Sol, 67),
];

/// Letter to (degree, pitch) mapping for one clef.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    entries: [(Degree, i32); 13],
}

impl PitchTable {
    pub fn for_clef(clef: &Clef) -> Self {
        let mut entries = [(Degree::La, 0); 13];
        let mut degree = clef.offset();
        let mut octave = clef.base_octave();
        for (slot, entry) in entries.iter_mut().enumerate() {
            if slot > 0 {
                degree += 1;
            }
            if degree >= 7 {
                degree -= 7;
                octave += 12;
            }
            let (name, pitch) = SCALE[degree];
            *entry = (name, pitch + octave);
        }
        PitchTable { entries }
    }

    /// Natural pitch of a letter, ignoring accidentals.
    pub fn pitch(&self, letter: char) -> Option<i32> {
        letter_index(letter).map(|i| self.entries[i].1)
    }

    pub fn degree(&self, letter: char) -> Option<Degree> {
        letter_index(letter).map(|i| self.entries[i].0)
    }

    /// Pitch of a letter under the given accidental scope.
    pub fn resolve(&self, letter: char, scope: &AccidentalScope) -> Option<i32> {
        self.pitch(letter).map(|p| p + scope.alteration(letter))
    }

    /// Inverse of [`PitchTable::resolve`].
    pub fn letter_for(&self, pitch: i32, scope: &AccidentalScope) -> Option<char> {
        LETTERS
            .iter()
            .copied()
            .find(|&l| self.resolve(l, scope) == Some(pitch))
    }

    /// Every letter that falls on `si`, where a flat at the clef applies.
    pub fn si_letters(&self) -> impl Iterator<Item = char> + '_ {
        LETTERS
            .iter()
            .zip(self.entries.iter())
            .filter(|(_, (degree, _))| *degree == Degree::Si)
            .map(|(&l, _)| l)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccidentalKind {
    Flat,
    Natural,
    Sharp,
}

impl AccidentalKind {
    pub fn semitones(&self) -> i32 {
        match self {
            AccidentalKind::Flat => -1,
            AccidentalKind::Natural => 0,
            AccidentalKind::Sharp => 1,
        }
    }
}

/// Accidentals in force for the current word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccidentalScope {
    alterations: [i32; 13],
}

impl AccidentalScope {
    /// Scope at the start of a word: empty, or every `si` flatted when the
    /// clef carries a flat.
    pub fn seeded(clef: &Clef, table: &PitchTable) -> Self {
        let mut scope = AccidentalScope::default();
        if clef.flat {
            for letter in table.si_letters() {
                scope.apply(letter, AccidentalKind::Flat);
            }
        }
        scope
    }

    pub fn apply(&mut self, letter: char, kind: AccidentalKind) {
        if let Some(i) = letter_index(letter) {
            self.alterations[i] = kind.semitones();
        }
    }

    pub fn alteration(&self, letter: char) -> i32 {
        letter_index(letter).map_or(0, |i| self.alterations[i])
    }

    pub fn is_empty(&self) -> bool {
        self.alterations.iter().all(|&a| a == 0)
    }
}

/// French solfège name with octave, e.g. `Do3` for 60 or `Sib2` for 58.
pub fn pitch_name(pitch: i32) -> String {
    const NAMES: [&str; 12] = [
        "Do", "Do#", "Ré", "Mib", "Mi", "Fa", "Fa#", "Sol", "Sol#", "La", "Sib", "Si",
    ];
    let name = NAMES[pitch.rem_euclid(12) as usize];
    format!("{}{}", name, pitch.div_euclid(12) - 2)
}
