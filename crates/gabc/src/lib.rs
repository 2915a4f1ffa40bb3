//! Gregorian chant (gabc) parser and renderers.
//!
//! This crate parses gabc notation into a score graph (words, syllables,
//! neumes and signs), resolves pitches and durations, centers the melody
//! on a reference pitch, and renders it as MIDI, LilyPond, ABC or a
//! plain tablature.
//!
//! # Example
//!
//! ```
//! use gabc::{parse, to_lilypond, to_midi, MidiParams};
//!
//! let gabc = "name: Ave Maria;\n%%\n(c4) A(g)ve(hi) Ma(h)ri(g)a.(f.) (::)\n";
//!
//! let result = parse(gabc).expect("valid gabc");
//! let score = &result.value;
//! assert_eq!(score.title, "Ave Maria");
//!
//! let midi_bytes = to_midi(score, &MidiParams::default());
//! assert_eq!(&midi_bytes[0..4], b"MThd");
//!
//! let lily = to_lilypond(score);
//! assert!(lily.lyrics.contains("A -- ve"));
//! ```

pub(crate) mod builder;
pub mod error;
pub mod feedback;
pub mod key;
pub mod lyrics;
pub mod parser;
pub mod pitch;
pub mod render;
pub mod score;
pub mod tessitura;

pub use builder::DurationRules;
pub use error::GabcError;
pub use feedback::{Feedback, FeedbackLevel, ParseResult};
pub use key::Key;
pub use pitch::{pitch_name, Clef, ClefKind};
pub use render::abc::Abc;
pub use render::lilypond::LilyPond;
pub use render::midi::{MidiEvent, MidiStream};
pub use score::*;
pub use tessitura::{Tessitura, Transposition};

/// Options that shape how a score is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Overrides the header `name`
    pub title: Option<String>,
    /// Used when neither a manual title nor a `name` header is given
    pub default_title: String,
    /// Manual transposition in semitones; automatic when `None`
    pub transposition: Option<i32>,
    /// MIDI pitch the tessitura is centered on
    pub reference_pitch: i32,
    pub durations: DurationRules,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            title: None,
            default_title: "Cantus".to_string(),
            transposition: None,
            reference_pitch: 66,
            durations: DurationRules::default(),
        }
    }
}

/// Parameters for MIDI generation
#[derive(Debug, Clone, PartialEq)]
pub struct MidiParams {
    /// MIDI velocity for notes (1-127)
    pub velocity: u8,
    /// Ticks per quarter note (typically 480)
    pub ticks_per_beat: u16,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Beats per minute, one beat being an eighth-note unit
    pub tempo: u16,
    /// General MIDI program (74 = flute)
    pub program: u8,
}

impl Default for MidiParams {
    fn default() -> Self {
        MidiParams {
            velocity: 127,
            ticks_per_beat: 480,
            channel: 0,
            tempo: 165,
            program: 74,
        }
    }
}

/// Parse gabc with default options.
pub fn parse(input: &str) -> Result<ParseResult<Score>, GabcError> {
    parser::parse(input, &ParseOptions::default())
}

pub fn parse_with(input: &str, options: &ParseOptions) -> Result<ParseResult<Score>, GabcError> {
    parser::parse(input, options)
}

/// Timed note and lyric events of a score.
pub fn midi_events(score: &Score, params: &MidiParams) -> MidiStream {
    render::midi::render(score, params)
}

/// Convert a score to MIDI bytes (SMF format 0)
pub fn to_midi(score: &Score, params: &MidiParams) -> Vec<u8> {
    midi_events(score, params).to_smf(params)
}

pub fn to_lilypond(score: &Score) -> LilyPond {
    render::lilypond::render(score)
}

pub fn to_abc(score: &Score) -> Abc {
    render::abc::render(score)
}

/// One line per syllable: lyric text, a tab, then the note tokens.
pub fn to_tab(score: &Score) -> String {
    render::tab::render(score)
}
