//! Score graph builder.
//!
//! Consumes segments in order and grows the word → syllable → neume → sign
//! graph in a single pass. Pitches are resolved as notes arrive, and the
//! rules in [`rules`] rewrite earlier notes as marks and bars arrive.

mod rules;

pub use rules::DurationRules;

use tracing::{debug, trace};

use crate::error::GabcError;
use crate::feedback::FeedbackCollector;
use crate::key::Key;
use crate::parser::segment::Segment;
use crate::parser::sign::parse_signs;
use crate::pitch::{AccidentalScope, Clef, Degree, PitchTable};
use crate::score::{
    Accidental, Header, Neume, Note, Score, Sign, SignArena, SignId, SpecialNote, Syllable, Word,
};
use crate::tessitura::Transposition;
use crate::ParseOptions;

pub(crate) struct ScoreBuilder<'a> {
    options: &'a ParseOptions,
    collector: &'a mut FeedbackCollector,
    signs: SignArena,
    words: Vec<Word>,
    /// Neume of the syllable being built
    neume: Neume,
    text: String,
    previous: Option<SignId>,
    /// Last sign in score order, clefs excluded
    last: Option<SignId>,
    clef: Option<Clef>,
    first_clef: Option<Clef>,
    table: Option<PitchTable>,
    scope: AccidentalScope,
    segment: usize,
    note_since_clef: bool,
}

impl<'a> ScoreBuilder<'a> {
    pub fn new(options: &'a ParseOptions, collector: &'a mut FeedbackCollector) -> Self {
        ScoreBuilder {
            options,
            collector,
            signs: SignArena::new(),
            words: Vec::new(),
            neume: Neume::default(),
            text: String::new(),
            previous: None,
            last: None,
            clef: None,
            first_clef: None,
            table: None,
            scope: AccidentalScope::default(),
            segment: 0,
            note_since_clef: false,
        }
    }

    pub fn push_segment(&mut self, index: usize, segment: &Segment) -> Result<(), GabcError> {
        self.segment = index;
        self.collector.set_segment(index);

        if self.words.is_empty() || segment.text.starts_with(' ') {
            self.start_word();
        }
        self.text = segment.text.split_whitespace().collect::<Vec<_>>().join(" ");
        self.previous = self.last;

        for sign in parse_signs(&segment.music, index, self.collector)? {
            self.push_sign(sign)?;
        }
        self.close_neume();
        Ok(())
    }

    pub fn finish(self, header: Header) -> Score {
        if let Some(clef) = self.clef.filter(|_| !self.note_since_clef) {
            self.collector.warning_with_suggestion(
                format!("Clef {} is not followed by any note", clef.code()),
                "Remove the clef or add the notes it introduces",
            );
        }

        let title = self
            .options
            .title
            .clone()
            .or_else(|| header.name().map(str::to_string))
            .unwrap_or_else(|| self.options.default_title.clone());
        let key = match self.first_clef {
            Some(clef) if clef.flat => Key::F,
            _ => Key::C,
        };

        let mut score = Score {
            title,
            header,
            key,
            words: self.words,
            signs: self.signs,
            transposition: Transposition::default(),
        };
        score.transposition = Transposition::resolve(
            self.options.transposition,
            score.tessitura(),
            self.options.reference_pitch,
        );
        score
    }

    fn start_word(&mut self) {
        self.words.push(Word {
            syllables: Vec::new(),
            clef: self.clef,
        });
        self.reset_scope();
    }

    fn reset_scope(&mut self) {
        self.scope = match (&self.clef, &self.table) {
            (Some(clef), Some(table)) => AccidentalScope::seeded(clef, table),
            _ => AccidentalScope::default(),
        };
    }

    fn push_sign(&mut self, sign: Sign) -> Result<(), GabcError> {
        match sign {
            Sign::Clef(clef) => {
                self.push_clef(clef);
                Ok(())
            }
            Sign::Note(note) => self.push_note(note),
            Sign::SpecialNote(special) => self.push_special(special.marker),
            Sign::RhythmicMark(kind) => self.push_mark(kind),
            Sign::Accidental(accidental) => self.push_accidental(accidental),
            Sign::Cut => {
                self.push_cut();
                Ok(())
            }
            Sign::Bar(strength) => self.push_bar(strength),
            Sign::Custos(letter) => {
                trace!(letter = %letter, "custos dropped");
                Ok(())
            }
            sign @ (Sign::End | Sign::Caesura) => {
                self.append(sign);
                Ok(())
            }
        }
    }

    /// Add a sign to the current neume and thread it onto the chain.
    fn append(&mut self, sign: Sign) -> SignId {
        let id = self.signs.push(sign, self.last);
        self.last = Some(id);
        self.neume.signs.push(id);
        id
    }

    fn push_clef(&mut self, clef: Clef) {
        let word_start = self.neume.signs.is_empty()
            && self.words.last().is_some_and(|w| w.syllables.is_empty());

        let table = PitchTable::for_clef(&clef);
        self.scope = AccidentalScope::seeded(&clef, &table);
        self.table = Some(table);
        self.clef = Some(clef);
        self.first_clef.get_or_insert(clef);
        self.note_since_clef = false;

        if word_start {
            if let Some(word) = self.words.last_mut() {
                word.clef = Some(clef);
            }
        }
        // Clefs are kept in the neume but stay off the predecessor chain.
        let id = self.signs.push(Sign::Clef(clef), None);
        self.neume.signs.push(id);
        debug!(clef = %clef.code(), segment = self.segment, "clef");
    }

    fn push_note(&mut self, mut note: Note) -> Result<(), GabcError> {
        let table = self.table.as_ref().ok_or_else(|| {
            GabcError::malformed(format!(
                "note '{}' in syllable {} comes before any clef",
                note.letter, self.segment
            ))
        })?;
        note.pitch = table
            .resolve(note.letter, &self.scope)
            .ok_or_else(|| GabcError::malformed(format!("no pitch for letter '{}'", note.letter)))?;
        self.open_element(&mut note);
        self.append(Sign::Note(note));
        Ok(())
    }

    /// First note of an element starts it; every note keeps it open.
    fn open_element(&mut self, note: &mut Note) {
        note.element_start = !self.neume.element_open;
        self.neume.element_open = true;
        self.neume.has_note = true;
        self.note_since_clef = true;
    }

    fn push_special(&mut self, marker: char) -> Result<(), GabcError> {
        let anchor = self
            .signs
            .chain(self.last)
            .find(|&id| !matches!(self.signs.get(id).sign, Sign::RhythmicMark(_)));

        let repeat = match anchor.map(|id| &self.signs.get(id).sign) {
            Some(Sign::SpecialNote(previous)) if previous.marker.eq_ignore_ascii_case(&marker) => {
                self.signs
                    .nearest_note(anchor)
                    .and_then(|id| self.signs.note(id))
                    .map(|source| {
                        let mut note = Note::new(source.letter, false);
                        note.pitch = source.pitch;
                        note
                    })
            }
            Some(Sign::Note(_)) | Some(Sign::SpecialNote(_)) => None,
            _ => {
                return Err(GabcError::syntax(
                    format!("special note '{}' has no preceding note", marker),
                    self.segment,
                ))
            }
        };

        let repeat = repeat.map(|mut note| {
            self.open_element(&mut note);
            note
        });
        self.append(Sign::SpecialNote(SpecialNote { marker, repeat }));
        Ok(())
    }

    fn push_accidental(&mut self, accidental: Accidental) -> Result<(), GabcError> {
        let table = self.table.as_ref().ok_or_else(|| {
            GabcError::malformed(format!(
                "accidental on '{}' comes before any clef",
                accidental.letter
            ))
        })?;
        let degree = table.degree(accidental.letter);
        if accidental.kind.semitones() != 0 && degree != Some(Degree::Si) {
            let name = degree.map_or("?", |d| d.name());
            self.collector.warning_with_suggestion(
                format!(
                    "{:?} on {} ('{}') is unusual in chant",
                    accidental.kind, name, accidental.letter
                ),
                "Check the letter the accidental is attached to",
            );
        }
        self.scope.apply(accidental.letter, accidental.kind);
        Ok(())
    }

    fn close_neume(&mut self) {
        self.equalize();
        self.close_element();
        let syllable = Syllable {
            text: std::mem::take(&mut self.text),
            neume: std::mem::take(&mut self.neume),
            previous: self.previous,
        };
        if let Some(word) = self.words.last_mut() {
            word.syllables.push(syllable);
        }
    }

    /// Sounding notes of the current neume, in order.
    fn neume_notes(&self) -> Vec<SignId> {
        self.neume
            .signs
            .iter()
            .copied()
            .filter(|&id| self.signs.note(id).is_some())
            .collect()
    }
}
