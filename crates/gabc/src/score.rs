//! The score graph shared by every renderer.
//!
//! Signs live in one arena per score and are addressed by [`SignId`]. Each
//! sign except a clef records the sign emitted just before it, in score
//! order and across syllable and word boundaries, so rules can reach back
//! to notes that were emitted earlier.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::lyrics;
use crate::pitch::{AccidentalKind, Clef};
use crate::tessitura::{Tessitura, Transposition};

/// Index of a sign in its score's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignId(pub usize);

/// A complete parsed score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub title: String,
    pub header: Header,
    pub key: Key,
    pub words: Vec<Word>,
    pub signs: SignArena,
    pub transposition: Transposition,
}

impl Score {
    pub fn sign(&self, id: SignId) -> &Sign {
        &self.signs.get(id).sign
    }

    pub fn syllables(&self) -> impl Iterator<Item = &Syllable> {
        self.words.iter().flat_map(|w| w.syllables.iter())
    }

    /// Sounding notes in score order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.syllables()
            .flat_map(|s| s.neume.signs.iter())
            .filter_map(|&id| self.signs.get(id).sign.as_note())
    }

    pub fn tessitura(&self) -> Option<Tessitura> {
        Tessitura::of(self.notes().map(|n| n.pitch))
    }

    /// Key after transposition, as renderers print it.
    pub fn rendered_key(&self) -> Key {
        self.key.transposed(self.transposition.value())
    }

    /// Plain lyric text: syllables joined into words, words separated by a
    /// single space, markup removed.
    pub fn lyrics(&self) -> String {
        self.words
            .iter()
            .map(|w| {
                w.syllables
                    .iter()
                    .map(|s| lyrics::clean(&s.text))
                    .collect::<String>()
            })
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Header fields in file order, plus the normalized office part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub fields: Vec<(String, String)>,
    pub office_part: OfficePart,
}

impl Header {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").filter(|n| !n.is_empty())
    }
}

/// Liturgical category of a piece.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfficePart {
    Alleluia,
    Antiphona,
    Communio,
    Graduale,
    Hymnus,
    Introitus,
    Kyriale,
    Lectio,
    Offertorium,
    Responsorium,
    Sequentia,
    Tractus,
    Versus,
    #[default]
    Varia,
}

impl OfficePart {
    /// Recognizes Latin, French and English spellings, with or without
    /// accents.
    pub fn normalize(raw: &str) -> OfficePart {
        match without_accents(&raw.trim().to_lowercase()).as_str() {
            "alleluia" => OfficePart::Alleluia,
            "antiphona" | "antienne" | "antiphon" => OfficePart::Antiphona,
            "communio" | "communion" => OfficePart::Communio,
            "graduale" | "graduel" | "gradual" => OfficePart::Graduale,
            "hymnus" | "hymne" | "hymn" => OfficePart::Hymnus,
            "introitus" | "introit" => OfficePart::Introitus,
            "kyriale" => OfficePart::Kyriale,
            "lectio" | "lecon" | "lesson" => OfficePart::Lectio,
            "offertorium" | "offertoire" | "offertory" => OfficePart::Offertorium,
            "responsorium" | "responsum" | "repons" | "response" => OfficePart::Responsorium,
            "sequentia" | "sequence" => OfficePart::Sequentia,
            "tractus" | "trait" | "tract" => OfficePart::Tractus,
            "versus" | "verset" | "verse" => OfficePart::Versus,
            _ => OfficePart::Varia,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfficePart::Alleluia => "alleluia",
            OfficePart::Antiphona => "antiphona",
            OfficePart::Communio => "communio",
            OfficePart::Graduale => "graduale",
            OfficePart::Hymnus => "hymnus",
            OfficePart::Introitus => "introitus",
            OfficePart::Kyriale => "kyriale",
            OfficePart::Lectio => "lectio",
            OfficePart::Offertorium => "offertorium",
            OfficePart::Responsorium => "responsorium",
            OfficePart::Sequentia => "sequentia",
            OfficePart::Tractus => "tractus",
            OfficePart::Versus => "versus",
            OfficePart::Varia => "varia",
        }
    }
}

/// Latin-script letters with their diacritics dropped. Covers the
/// lowercase accented letters of French and Latin liturgical books.
fn without_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => 'e',
            'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ō' => 'o',
            'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
            'ý' | 'ÿ' => 'y',
            c => c,
        })
        .collect()
}

/// A word: syllables sung under one clef context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub syllables: Vec<Syllable>,
    /// Clef in force when the word starts (explicit or inherited)
    pub clef: Option<Clef>,
}

impl Word {
    pub fn has_note(&self) -> bool {
        self.syllables.iter().any(|s| s.neume.has_note)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    pub neume: Neume,
    /// Last sign emitted before this syllable, if any
    pub previous: Option<SignId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neume {
    pub signs: Vec<SignId>,
    /// The current beamed element has not been terminated
    pub element_open: bool,
    pub has_note: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignNode {
    pub sign: Sign,
    pub predecessor: Option<SignId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sign {
    Clef(Clef),
    Note(Note),
    SpecialNote(SpecialNote),
    RhythmicMark(RhythmicKind),
    /// Only produced by the sign factory; folded into the accidental scope
    Accidental(Accidental),
    Cut,
    Bar(BarStrength),
    /// Only produced by the sign factory; never sounded
    Custos(char),
    End,
    Caesura,
}

impl Sign {
    /// The note this sign sounds, if any.
    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Sign::Note(note) => Some(note),
            Sign::SpecialNote(SpecialNote {
                repeat: Some(note), ..
            }) => Some(note),
            _ => None,
        }
    }

    pub fn as_note_mut(&mut self) -> Option<&mut Note> {
        match self {
            Sign::Note(note) => Some(note),
            Sign::SpecialNote(SpecialNote {
                repeat: Some(note), ..
            }) => Some(note),
            _ => None,
        }
    }

    /// Signs that hand pitch and duration lookups to their predecessor.
    fn delegates(&self) -> bool {
        matches!(
            self,
            Sign::RhythmicMark(_) | Sign::SpecialNote(SpecialNote { repeat: None, .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Lowercase staff letter `a`..`m`
    pub letter: char,
    /// Written uppercase (punctum inclinatum)
    pub inclinatum: bool,
    /// Resolved MIDI pitch, before transposition
    pub pitch: i32,
    /// In eighth-note units
    pub duration: f64,
    pub ornaments: Ornaments,
    pub element_start: bool,
    pub element_end: bool,
}

impl Note {
    pub fn new(letter: char, inclinatum: bool) -> Self {
        Note {
            letter: letter.to_ascii_lowercase(),
            inclinatum,
            pitch: 0,
            duration: 1.0,
            ornaments: Ornaments::default(),
            element_start: false,
            element_end: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ornaments {
    pub ictus: bool,
    pub episema: bool,
    pub point: bool,
    pub quilisma: bool,
    pub liquescence: bool,
    /// Lengthened because a quilisma follows
    pub pre_quilisma: bool,
}

/// Stropha, oriscus or virga marker. A repeated marker sounds the previous
/// pitch again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialNote {
    pub marker: char,
    pub repeat: Option<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmicKind {
    Ictus,
    Episema,
    Point,
    Quilisma,
    Liquescence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accidental {
    pub letter: char,
    pub kind: AccidentalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BarStrength {
    None,
    Quarter,
    Half,
    Full,
    Double,
}

/// Arena holding every sign of a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignArena {
    nodes: Vec<SignNode>,
}

impl SignArena {
    pub fn new() -> Self {
        SignArena::default()
    }

    pub fn push(&mut self, sign: Sign, predecessor: Option<SignId>) -> SignId {
        let id = SignId(self.nodes.len());
        self.nodes.push(SignNode { sign, predecessor });
        id
    }

    pub fn get(&self, id: SignId) -> &SignNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: SignId) -> &mut SignNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn note(&self, id: SignId) -> Option<&Note> {
        self.get(id).sign.as_note()
    }

    pub fn note_mut(&mut self, id: SignId) -> Option<&mut Note> {
        self.get_mut(id).sign.as_note_mut()
    }

    pub fn predecessor(&self, id: SignId) -> Option<SignId> {
        self.get(id).predecessor
    }

    /// Walk the predecessor chain starting at `from` (inclusive).
    pub fn chain(&self, from: Option<SignId>) -> Chain<'_> {
        Chain {
            arena: self,
            next: from,
        }
    }

    /// First sign at or before `from` that does not delegate.
    fn resolve(&self, from: SignId) -> Option<&Sign> {
        self.chain(Some(from))
            .map(|id| &self.get(id).sign)
            .find(|sign| !sign.delegates())
    }

    /// Duration of a sign; marks and shape-only special notes report their
    /// predecessor's.
    pub fn duration_of(&self, id: SignId) -> f64 {
        self.resolve(id)
            .and_then(Sign::as_note)
            .map_or(0.0, |n| n.duration)
    }

    pub fn pitch_of(&self, id: SignId) -> Option<i32> {
        self.resolve(id).and_then(Sign::as_note).map(|n| n.pitch)
    }

    /// Nearest sounding note at or before `from`, looking through rhythmic
    /// marks and shape-only special notes only.
    pub fn nearest_note(&self, from: Option<SignId>) -> Option<SignId> {
        for id in self.chain(from) {
            let sign = &self.get(id).sign;
            if sign.as_note().is_some() {
                return Some(id);
            }
            if !sign.delegates() {
                return None;
            }
        }
        None
    }
}

pub struct Chain<'a> {
    arena: &'a SignArena,
    next: Option<SignId>,
}

impl Iterator for Chain<'_> {
    type Item = SignId;

    fn next(&mut self) -> Option<SignId> {
        let id = self.next?;
        self.next = self.arena.predecessor(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(letter: char, pitch: i32, duration: f64) -> Sign {
        let mut n = Note::new(letter, false);
        n.pitch = pitch;
        n.duration = duration;
        Sign::Note(n)
    }

    #[test]
    fn test_delegated_lookups() {
        let mut arena = SignArena::new();
        let g = arena.push(note('g', 67, 1.7), None);
        let mark = arena.push(Sign::RhythmicMark(RhythmicKind::Episema), Some(g));
        let shape = arena.push(
            Sign::SpecialNote(SpecialNote {
                marker: 's',
                repeat: None,
            }),
            Some(mark),
        );

        assert_eq!(arena.duration_of(mark), 1.7);
        assert_eq!(arena.duration_of(shape), 1.7);
        assert_eq!(arena.pitch_of(shape), Some(67));
        assert_eq!(arena.nearest_note(Some(shape)), Some(g));
    }

    #[test]
    fn test_nearest_note_stops_at_bar() {
        let mut arena = SignArena::new();
        let g = arena.push(note('g', 67, 1.0), None);
        let bar = arena.push(Sign::Bar(BarStrength::Full), Some(g));
        assert_eq!(arena.nearest_note(Some(bar)), None);
        assert_eq!(arena.duration_of(bar), 0.0);
        assert_eq!(arena.chain(Some(bar)).collect::<Vec<_>>(), vec![bar, g]);
    }

    #[test]
    fn test_repercussion_sounds() {
        let mut arena = SignArena::new();
        let g = arena.push(note('g', 67, 1.0), None);
        let mut repeat = Note::new('g', false);
        repeat.pitch = 67;
        let rep = arena.push(
            Sign::SpecialNote(SpecialNote {
                marker: 's',
                repeat: Some(repeat),
            }),
            Some(g),
        );
        assert_eq!(arena.nearest_note(Some(rep)), Some(rep));
        assert_eq!(arena.pitch_of(rep), Some(67));
    }

    #[test]
    fn test_office_part() {
        assert_eq!(OfficePart::normalize("Antienne"), OfficePart::Antiphona);
        assert_eq!(OfficePart::normalize("répons"), OfficePart::Responsorium);
        assert_eq!(OfficePart::normalize("Gradual"), OfficePart::Graduale);
        assert_eq!(OfficePart::normalize("motet"), OfficePart::Varia);
        assert_eq!(OfficePart::Tractus.as_str(), "tractus");
    }

    #[test]
    fn test_office_part_ignores_accents() {
        assert_eq!(OfficePart::normalize("Offertóire"), OfficePart::Offertorium);
        assert_eq!(OfficePart::normalize("Introït"), OfficePart::Introitus);
        assert_eq!(OfficePart::normalize("LEÇON"), OfficePart::Lectio);
        assert_eq!(OfficePart::normalize("Séquence"), OfficePart::Sequentia);
        assert_eq!(OfficePart::normalize("Allelúia"), OfficePart::Alleluia);
    }
}
