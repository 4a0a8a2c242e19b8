//! The gyro voice: touch contact chooses *when*, tilt chooses *what*.

use std::mem;

use glove_notes::{NoteSet, TiltMap};

use crate::event::{NoteEvent, Velocity, Voice};

/// Contact level reported by the touch sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    /// Level 0.
    Released,
    /// Level 1.
    Touch,
    /// Level 2: start pianissimo.
    Soft,
}

impl Contact {
    /// Map a raw level (0, 1, 2) to a contact; anything else is `None`.
    pub fn from_level(level: u64) -> Option<Contact> {
        match level {
            0 => Some(Contact::Released),
            1 => Some(Contact::Touch),
            2 => Some(Contact::Soft),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Contact::Released => 0,
            Contact::Touch    => 1,
            Contact::Soft     => 2,
        }
    }

    pub fn is_down(self) -> bool { self != Contact::Released }
}

/// Mutable state of a [`TouchVoice`].
///
/// `current` is the note-set last sent as a start. It is cleared when that
/// set is stopped, so a non-empty `current` while `active` is false means a
/// legato release left it ringing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TouchVoiceState {
    pub active:     bool,
    pub soft_touch: bool,
    pub current:    NoteSet,
}

/// State machine for the touch/tilt voice.
#[derive(Clone, Debug)]
pub struct TouchVoice {
    tilt_map: TiltMap,
    legato:   bool,
    state:    TouchVoiceState,
}

impl TouchVoice {
    pub fn new(tilt_map: TiltMap, legato: bool) -> Self {
        TouchVoice { tilt_map, legato, state: TouchVoiceState::default() }
    }

    pub fn state(&self) -> &TouchVoiceState { &self.state }

    /// True while some note-set started by this voice has not been stopped.
    pub fn is_sounding(&self) -> bool { !self.state.current.is_empty() }

    /// Feed one contact sample taken at (handedness-corrected) `tilt`.
    ///
    /// * release → touch: stop a note still ringing from a legato release,
    ///   then start the tilt's note-set (soft velocity on [`Contact::Soft`]).
    /// * held, tilt band changed: stop the old set, start the new one at full
    ///   velocity.
    /// * touch → release: stop the current set unless legato.
    ///
    /// Anything else emits nothing.
    pub fn on_contact(&mut self, contact: Contact, tilt: f64) -> Vec<NoteEvent> {
        let next = self.tilt_map.resolve(tilt);
        let mut events = Vec::new();

        match (contact.is_down(), self.state.active) {
            (true, false) => {
                if self.is_sounding() {
                    events.push(NoteEvent::stop(Voice::Gyro, mem::take(&mut self.state.current)));
                }
                self.state.soft_touch = contact == Contact::Soft;
                let velocity = if self.state.soft_touch { Velocity::Soft } else { Velocity::Full };
                log::debug!(target: "voice", "touch start {} (level {})", next, contact.level());
                events.push(NoteEvent::start(Voice::Gyro, next.clone(), velocity));
                self.state.active = true;
                self.state.current = next.clone();
            }
            (true, true) if *next != self.state.current => {
                log::debug!(target: "voice", "tilt change {} -> {}", self.state.current, next);
                events.push(NoteEvent::stop(Voice::Gyro, mem::take(&mut self.state.current)));
                // A glide is not re-evaluated for pressure.
                events.push(NoteEvent::start(Voice::Gyro, next.clone(), Velocity::Full));
                self.state.current = next.clone();
            }
            (false, true) => {
                log::debug!(target: "voice", "touch release {} (legato={})", self.state.current, self.legato);
                if !self.legato {
                    events.push(NoteEvent::stop(Voice::Gyro, mem::take(&mut self.state.current)));
                }
                self.state.active = false;
            }
            _ => {}
        }
        events
    }

    /// Stop whatever is still sounding and return to idle.
    pub fn flush(&mut self) -> Vec<NoteEvent> {
        self.state.active = false;
        self.state.soft_touch = false;
        if self.is_sounding() {
            vec![NoteEvent::stop(Voice::Gyro, mem::take(&mut self.state.current))]
        } else {
            Vec::new()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glove_notes::{Breakpoint, NoteName};
    use Contact::*;

    /// `[[0, [C3]], [90, [E3]]]`: C3 (36) at or below 0°, E3 (40) above.
    fn voice(legato: bool) -> TouchVoice {
        let map = TiltMap::new(&[
            Breakpoint(0.0,  vec![NoteName::new("C", 3)]),
            Breakpoint(90.0, vec![NoteName::new("E", 3)]),
        ]).unwrap();
        TouchVoice::new(map, legato)
    }

    fn set(p: &[u8]) -> NoteSet { NoteSet::new(p.to_vec()) }
    fn start(p: &[u8], v: Velocity) -> NoteEvent { NoteEvent::start(Voice::Gyro, set(p), v) }
    fn stop(p: &[u8]) -> NoteEvent { NoteEvent::stop(Voice::Gyro, set(p)) }

    // ── scenarios ────────────────────────────────────────────────────────
    #[test]
    fn touch_starts_the_tilt_band() {
        let mut v = voice(false);
        assert!(v.on_contact(Released, -10.0).is_empty());
        assert_eq!(v.on_contact(Touch, -10.0), vec![start(&[36], Velocity::Full)]);
        assert!(v.state().active);
        assert_eq!(v.state().current, set(&[36]));
    }

    #[test]
    fn tilt_change_while_held_re_chords() {
        let mut v = voice(false);
        v.on_contact(Touch, -10.0);
        assert_eq!(
            v.on_contact(Touch, 45.0),
            vec![stop(&[36]), start(&[40], Velocity::Full)]
        );
        assert_eq!(v.state().current, set(&[40]));
    }

    #[test]
    fn moving_within_the_open_upper_band_changes_nothing() {
        let mut v = voice(false);
        assert_eq!(v.on_contact(Touch, 45.0), vec![start(&[40], Velocity::Full)]);
        assert!(v.on_contact(Touch, 95.0).is_empty());
    }

    #[test]
    fn release_stops_without_legato() {
        let mut v = voice(false);
        v.on_contact(Touch, -10.0);
        assert_eq!(v.on_contact(Released, -10.0), vec![stop(&[36])]);
        assert!(!v.state().active);
        assert!(!v.is_sounding());
    }

    #[test]
    fn release_is_silent_with_legato() {
        let mut v = voice(true);
        v.on_contact(Touch, -10.0);
        assert!(v.on_contact(Released, -10.0).is_empty());
        assert!(!v.state().active);
        assert!(v.is_sounding());
    }

    #[test]
    fn legato_note_is_stopped_by_the_next_touch() {
        let mut v = voice(true);
        v.on_contact(Touch, -10.0);
        v.on_contact(Released, 30.0);
        assert_eq!(
            v.on_contact(Touch, 30.0),
            vec![stop(&[36]), start(&[40], Velocity::Full)]
        );
    }

    #[test]
    fn non_legato_touch_has_no_stale_cleanup() {
        let mut v = voice(false);
        v.on_contact(Touch, -10.0);
        v.on_contact(Released, -10.0);
        assert_eq!(v.on_contact(Touch, -10.0), vec![start(&[36], Velocity::Full)]);
    }

    // ── soft touch ───────────────────────────────────────────────────────
    #[test]
    fn soft_touch_starts_pianissimo() {
        let mut v = voice(false);
        assert_eq!(v.on_contact(Soft, -10.0), vec![start(&[36], Velocity::Soft)]);
        assert!(v.state().soft_touch);
    }

    #[test]
    fn note_change_after_soft_touch_is_full_velocity() {
        let mut v = voice(false);
        v.on_contact(Soft, -10.0);
        assert_eq!(
            v.on_contact(Soft, 45.0),
            vec![stop(&[36]), start(&[40], Velocity::Full)]
        );
    }

    #[test]
    fn pressure_change_while_held_is_ignored() {
        let mut v = voice(false);
        v.on_contact(Touch, -10.0);
        assert!(v.on_contact(Soft, -10.0).is_empty());
        assert!(v.on_contact(Touch, -10.0).is_empty());
    }

    // ── properties ───────────────────────────────────────────────────────
    #[test]
    fn repeated_identical_samples_are_idempotent() {
        for legato in [false, true] {
            for contact in [Released, Touch, Soft] {
                for tilt in [-50.0, 0.0, 45.0, 200.0] {
                    let mut v = voice(legato);
                    v.on_contact(contact, tilt);
                    for _ in 0..5 {
                        assert!(v.on_contact(contact, tilt).is_empty());
                    }
                }
            }
        }
    }

    /// Every stop must close an earlier start of the same set; returns the
    /// sets still open.
    fn check_matched(events: &[NoteEvent], open: &mut Vec<NoteSet>) {
        for e in events {
            match e {
                NoteEvent::Start { pitches, .. } => open.push(pitches.clone()),
                NoteEvent::Stop { pitches, .. } => {
                    let i = open.iter().position(|s| s == pitches)
                        .unwrap_or_else(|| panic!("stop {} without start", pitches));
                    open.remove(i);
                }
            }
        }
    }

    #[test]
    fn never_stops_without_a_start() {
        let inputs: Vec<(Contact, f64)> = [Released, Touch, Soft].iter()
            .flat_map(|&c| [-10.0, 45.0, 120.0].map(|t| (c, t)))
            .collect();
        let n = inputs.len();
        for legato in [false, true] {
            for code in 0..n.pow(4) {
                let mut v = voice(legato);
                let mut open = Vec::new();
                let mut k = code;
                for _ in 0..4 {
                    let (c, t) = inputs[k % n];
                    k /= n;
                    check_matched(&v.on_contact(c, t), &mut open);
                }
                check_matched(&v.flush(), &mut open);
                assert!(open.is_empty(), "flush left {:?} open", open);
            }
        }
    }

    #[test]
    fn legato_release_never_stops() {
        for tilt in [-10.0, 45.0, 120.0] {
            let mut v = voice(true);
            v.on_contact(Soft, tilt);
            v.on_contact(Touch, -tilt);
            assert!(v.on_contact(Released, tilt).iter().all(|e| e.is_start()));
        }
    }

    // ── flush ────────────────────────────────────────────────────────────
    #[test]
    fn flush_stops_held_note_once() {
        let mut v = voice(false);
        v.on_contact(Touch, 45.0);
        assert_eq!(v.flush(), vec![stop(&[40])]);
        assert!(v.flush().is_empty());
        assert_eq!(v.state(), &TouchVoiceState::default());
    }

    #[test]
    fn flush_stops_legato_ringing_note() {
        let mut v = voice(true);
        v.on_contact(Touch, -10.0);
        v.on_contact(Released, -10.0);
        assert_eq!(v.flush(), vec![stop(&[36])]);
    }

    #[test]
    fn contact_levels() {
        assert_eq!(Contact::from_level(0), Some(Released));
        assert_eq!(Contact::from_level(2), Some(Soft));
        assert_eq!(Contact::from_level(3), None);
        assert_eq!(Soft.level(), 2);
    }
}
