//! Duration and element rules applied while the graph is built.
//!
//! Marks, cuts and bars arrive after the notes they affect, so each one
//! reaches back (through the predecessor chain or the open neume) and
//! rewrites notes already in the arena.

use serde::{Deserialize, Serialize};

use super::ScoreBuilder;
use crate::error::GabcError;
use crate::score::{BarStrength, Note, Ornaments, RhythmicKind, Sign, SignId};

/// Note lengths, in eighth-note units, that marks and bars impose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationRules {
    pub episema: f64,
    pub point: f64,
    pub pre_quilisma: f64,
    pub pose_none: f64,
    pub pose_quarter: f64,
    pub pose_half: f64,
    pub pose_full: f64,
    pub pose_double: f64,
}

impl Default for DurationRules {
    fn default() -> Self {
        DurationRules {
            episema: 1.7,
            point: 2.3,
            pre_quilisma: 2.0,
            pose_none: 0.0,
            pose_quarter: 0.0,
            pose_half: 0.5,
            pose_full: 1.0,
            pose_double: 1.2,
        }
    }
}

impl DurationRules {
    /// Lengthening given to the note before a bar.
    pub fn pose(&self, strength: BarStrength) -> f64 {
        match strength {
            BarStrength::None => self.pose_none,
            BarStrength::Quarter => self.pose_quarter,
            BarStrength::Half => self.pose_half,
            BarStrength::Full => self.pose_full,
            BarStrength::Double => self.pose_double,
        }
    }
}

fn mark_name(kind: RhythmicKind) -> &'static str {
    match kind {
        RhythmicKind::Ictus => "ictus",
        RhythmicKind::Episema => "episema",
        RhythmicKind::Point => "point",
        RhythmicKind::Quilisma => "quilisma",
        RhythmicKind::Liquescence => "liquescence",
    }
}

impl ScoreBuilder<'_> {
    pub(super) fn push_mark(&mut self, kind: RhythmicKind) -> Result<(), GabcError> {
        let target = self.signs.nearest_note(self.last).ok_or_else(|| {
            GabcError::syntax(
                format!("{} has no preceding note", mark_name(kind)),
                self.segment,
            )
        })?;
        let rules = self.options.durations;

        match kind {
            RhythmicKind::Ictus => {
                if let Some(id) = self.retarget(target, |o| o.ictus) {
                    self.update(id, |note| note.ornaments.ictus = true);
                }
            }
            RhythmicKind::Episema => {
                if let Some(id) = self.retarget(target, |o| o.episema) {
                    self.update(id, |note| {
                        note.ornaments.episema = true;
                        note.duration = note.duration.max(rules.episema);
                    });
                }
            }
            RhythmicKind::Point => {
                if let Some(id) = self.retarget(target, |o| o.point) {
                    self.update(id, |note| {
                        note.ornaments.point = true;
                        note.duration = note.duration.max(rules.point);
                    });
                    self.isolate(id);
                }
            }
            RhythmicKind::Quilisma => {
                self.mark_once(target, kind, |o| &mut o.quilisma)?;
                let before = self.signs.nearest_note(self.signs.predecessor(target));
                if let Some(id) = before {
                    self.update(id, |note| {
                        note.ornaments.pre_quilisma = true;
                        note.duration = note.duration.max(rules.pre_quilisma);
                    });
                }
            }
            RhythmicKind::Liquescence => {
                self.mark_once(target, kind, |o| &mut o.liquescence)?;
            }
        }

        self.append(Sign::RhythmicMark(kind));
        Ok(())
    }

    /// A mark already present on `target` moves one note further back.
    fn retarget(&self, target: SignId, has: fn(&Ornaments) -> bool) -> Option<SignId> {
        let already = self.signs.note(target).is_some_and(|n| has(&n.ornaments));
        if already {
            self.signs.nearest_note(self.signs.predecessor(target))
        } else {
            Some(target)
        }
    }

    fn mark_once(
        &mut self,
        target: SignId,
        kind: RhythmicKind,
        flag: fn(&mut Ornaments) -> &mut bool,
    ) -> Result<(), GabcError> {
        let segment = self.segment;
        let Some(note) = self.signs.note_mut(target) else {
            return Ok(());
        };
        let slot = flag(&mut note.ornaments);
        if *slot {
            return Err(GabcError::syntax(
                format!("{} repeated on the same note", mark_name(kind)),
                segment,
            ));
        }
        *slot = true;
        Ok(())
    }

    fn update(&mut self, id: SignId, change: impl FnOnce(&mut Note)) {
        if let Some(note) = self.signs.note_mut(id) {
            change(note);
        }
    }

    /// Give a dotted note an element of its own.
    fn isolate(&mut self, id: SignId) {
        let notes = self.neume_notes();
        let Some(pos) = notes.iter().position(|&n| n == id) else {
            return;
        };

        if pos > 0 {
            let previous = notes[pos - 1];
            let shares_element = self.signs.note(previous).is_some_and(|n| !n.element_start);
            if pos > 1 && shares_element {
                self.raise(previous, notes[pos - 2]);
            }
            self.update(previous, |note| note.element_end = true);
        }
        self.update(id, |note| {
            note.element_start = true;
            note.element_end = true;
        });
        match notes.get(pos + 1) {
            Some(&next) => self.update(next, |note| note.element_start = true),
            None => self.neume.element_open = false,
        }
    }

    /// Make `later` at least as long as `earlier`.
    fn raise(&mut self, later: SignId, earlier: SignId) {
        let floor = self.signs.duration_of(earlier);
        self.update(later, |note| {
            if note.duration < floor {
                note.duration = floor;
            }
        });
    }

    /// The last note of the open element is never shorter than the one
    /// before it. A note that starts its own element is left alone.
    pub(super) fn equalize(&mut self) {
        if let [.., earlier, later] = self.neume_notes()[..] {
            if self.signs.note(later).is_some_and(|n| !n.element_start) {
                self.raise(later, earlier);
            }
        }
    }

    pub(super) fn close_element(&mut self) {
        if let Some(&last) = self.neume_notes().last() {
            self.update(last, |note| note.element_end = true);
        }
        self.neume.element_open = false;
    }

    pub(super) fn push_cut(&mut self) {
        self.equalize();
        self.close_element();
        self.append(Sign::Cut);
    }

    pub(super) fn push_bar(&mut self, strength: BarStrength) -> Result<(), GabcError> {
        let rules = self.options.durations;
        let adjacent = self
            .neume
            .signs
            .last()
            .and_then(|&id| match self.signs.get(id).sign {
                Sign::Bar(previous) => Some((id, previous)),
                _ => None,
            });

        if let Some((id, previous)) = adjacent {
            if previous == BarStrength::Full && strength == BarStrength::Full {
                self.signs.get_mut(id).sign = Sign::Bar(BarStrength::Double);
                let bonus = rules.pose(BarStrength::Double) - rules.pose(BarStrength::Full);
                self.apply_pose(self.signs.predecessor(id), bonus);
                return Ok(());
            }
            return Err(GabcError::syntax(
                format!("{:?} bar directly after {:?} bar", strength, previous),
                self.segment,
            ));
        }

        self.equalize();
        self.close_element();
        self.reset_scope();
        self.apply_pose(self.last, rules.pose(strength));
        self.append(Sign::Bar(strength));
        Ok(())
    }

    /// Lengthen the nearest sounding note before a bar. Another bar in
    /// between means there is nothing to lengthen.
    fn apply_pose(&mut self, from: Option<SignId>, amount: f64) {
        let mut target = None;
        for id in self.signs.chain(from) {
            match &self.signs.get(id).sign {
                Sign::Bar(_) => break,
                sign if sign.as_note().is_some() => {
                    target = Some(id);
                    break;
                }
                _ => {}
            }
        }
        if let Some(id) = target {
            self.update(id, |note| note.duration += amount);
        }
    }
}
