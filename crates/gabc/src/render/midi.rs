//! MIDI rendering.
//!
//! The score is first flattened into a [`MidiStream`] of timed note and
//! lyric events (times in beats, one beat per eighth-note unit), which
//! [`MidiStream::to_smf`] then writes as a Standard MIDI File, format 0.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{neume_notes, sounding_pitch};
use crate::lyrics;
use crate::score::Score;
use crate::MidiParams;

/// Everything needed to write one MIDI track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiStream {
    pub track_name: String,
    pub tempo: u16,
    pub program: u8,
    /// Time-ordered events
    pub events: Vec<MidiEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MidiEvent {
    Note {
        pitch: u8,
        start: f64,
        duration: f64,
        velocity: u8,
    },
    Lyric {
        start: f64,
        text: String,
    },
}

impl MidiStream {
    /// Notes only, in order.
    pub fn notes(&self) -> impl Iterator<Item = (u8, f64, f64)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            MidiEvent::Note {
                pitch,
                start,
                duration,
                ..
            } => Some((pitch, start, duration)),
            MidiEvent::Lyric { .. } => None,
        })
    }

    /// Total length in beats.
    pub fn length(&self) -> f64 {
        self.notes()
            .map(|(_, start, duration)| start + duration)
            .fold(0.0, f64::max)
    }

    /// Write the stream as SMF format 0.
    pub fn to_smf(&self, params: &MidiParams) -> Vec<u8> {
        let tick = |beats: f64| (beats * params.ticks_per_beat as f64).round().max(0.0) as u32;
        let channel = params.channel & 0x0F;
        let us_per_beat = 60_000_000u32 / u32::from(self.tempo.max(1));

        let mut track = Track::default();
        track.meta(0, 0x03, self.track_name.as_bytes());
        track.meta(0, 0x51, &us_per_beat.to_be_bytes()[1..]);
        track.push(0, vec![0xC0 | channel, self.program & 0x7F]);

        for event in &self.events {
            match event {
                MidiEvent::Lyric { start, text } => {
                    track.meta(tick(*start), 0x05, text.as_bytes());
                }
                MidiEvent::Note {
                    pitch,
                    start,
                    duration,
                    velocity,
                } => {
                    let on = tick(*start);
                    let off = tick(start + duration).max(on + 1);
                    let key = pitch & 0x7F;
                    track.push(on, vec![0x90 | channel, key, velocity & 0x7F]);
                    track.push(off, vec![0x80 | channel, key, 0]);
                }
            }
        }

        track.into_smf(params.ticks_per_beat)
    }
}

/// Flatten a score into timed events.
pub fn render(score: &Score, params: &MidiParams) -> MidiStream {
    let mut events = Vec::new();
    let mut time = 0.0;

    for syllable in score.syllables() {
        let mut first = true;
        for note in neume_notes(score, syllable) {
            if first {
                let text = lyrics::clean(&syllable.text);
                if !text.is_empty() {
                    events.push(MidiEvent::Lyric { start: time, text });
                }
                first = false;
            }
            events.push(MidiEvent::Note {
                pitch: sounding_pitch(score, note).clamp(0, 127) as u8,
                start: time,
                duration: note.duration,
                velocity: params.velocity,
            });
            time += note.duration;
        }
    }

    debug!(events = events.len(), beats = time, "midi stream");
    MidiStream {
        track_name: score.title.clone(),
        tempo: params.tempo,
        program: params.program,
        events,
    }
}

/// Raw track events at absolute ticks, in insertion order.
#[derive(Default)]
struct Track {
    events: Vec<(u32, Vec<u8>)>,
}

impl Track {
    fn push(&mut self, tick: u32, bytes: Vec<u8>) {
        self.events.push((tick, bytes));
    }

    fn meta(&mut self, tick: u32, kind: u8, payload: &[u8]) {
        let mut bytes = vec![0xFF, kind];
        write_vlq(&mut bytes, payload.len() as u32);
        bytes.extend_from_slice(payload);
        self.push(tick, bytes);
    }

    /// Header chunk and a single track chunk.
    fn into_smf(mut self, ticks_per_beat: u16) -> Vec<u8> {
        // Stable: a note-off keeps its place before a note-on at the same tick
        self.events.sort_by_key(|&(tick, _)| tick);

        let mut body = Vec::new();
        let mut now = 0;
        for (tick, bytes) in &self.events {
            write_vlq(&mut body, tick - now);
            body.extend_from_slice(bytes);
            now = *tick;
        }
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut smf = Vec::with_capacity(22 + body.len());
        smf.extend_from_slice(b"MThd");
        smf.extend_from_slice(&6u32.to_be_bytes());
        // format 0, one track
        for word in [0u16, 1, ticks_per_beat] {
            smf.extend_from_slice(&word.to_be_bytes());
        }
        smf.extend_from_slice(b"MTrk");
        smf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        smf.extend(body);
        smf
    }
}

/// Append `value` as a MIDI variable-length quantity.
fn write_vlq(out: &mut Vec<u8>, value: u32) {
    let mut shift = 28;
    while shift > 0 && value >> shift == 0 {
        shift -= 7;
    }
    while shift > 0 {
        out.push(((value >> shift) & 0x7F) as u8 | 0x80);
        shift -= 7;
    }
    out.push((value & 0x7F) as u8);
}
