//! The accel voice: a fixed note-set fired by acceleration impulses.

use std::time::{Duration, Instant};

use glove_notes::{AccelSettings, NoteSet};

use crate::event::{NoteEvent, Velocity, Voice};

/// Mutable state of an [`AccelTrigger`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccelTriggerState {
    /// A start has been sent and not yet stopped.
    pub armed:        bool,
    /// When the last start fired; `None` before the first one.
    pub last_trigger: Option<Instant>,
}

/// Threshold trigger with a refractory window.
///
/// Samples arriving within `refractory` of the last trigger are not evaluated
/// at all, so neither a new start nor the closing stop can happen inside the
/// window.
#[derive(Clone, Debug)]
pub struct AccelTrigger {
    notes:                NoteSet,
    sensitivity_positive: f64,
    sensitivity_negative: f64,
    refractory:           Duration,
    legato:               bool,
    state:                AccelTriggerState,
}

impl AccelTrigger {
    pub fn new(settings: &AccelSettings, legato: bool) -> Self {
        AccelTrigger {
            notes:                settings.notes.clone(),
            sensitivity_positive: settings.sensitivity_positive,
            sensitivity_negative: settings.sensitivity_negative,
            refractory:           settings.refractory,
            legato,
            state:                AccelTriggerState::default(),
        }
    }

    pub fn state(&self) -> &AccelTriggerState { &self.state }

    pub fn is_sounding(&self) -> bool { self.state.armed }

    /// Whether the refractory window opened by the last trigger still covers
    /// `now`.
    fn in_refractory(&self, now: Instant) -> bool {
        self.state.last_trigger
            .map(|last| now.saturating_duration_since(last) <= self.refractory)
            .unwrap_or(false)
    }

    /// Both sensitivities are compared against `|magnitude|`.
    // TODO: confirm with the firmware whether accel_sensitivity_- was meant
    // for signed negative impulses; the device configs set both the same.
    fn exceeds(&self, magnitude: f64) -> bool {
        let m = magnitude.abs();
        m > self.sensitivity_positive || m > self.sensitivity_negative
    }

    /// Feed one acceleration sample taken at `now`.
    pub fn on_acceleration(&mut self, magnitude: f64, now: Instant) -> Vec<NoteEvent> {
        if self.in_refractory(now) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.exceeds(magnitude) {
            log::debug!(target: "voice", "accel trigger {} at magnitude {}", self.notes, magnitude);
            if self.legato && self.state.armed {
                events.push(NoteEvent::stop(Voice::Accel, self.notes.clone()));
            }
            events.push(NoteEvent::start(Voice::Accel, self.notes.clone(), Velocity::Full));
            self.state.armed = true;
            self.state.last_trigger = Some(now);
        } else if self.state.armed {
            events.push(NoteEvent::stop(Voice::Accel, self.notes.clone()));
            self.state.armed = false;
        }
        events
    }

    /// Stop the note-set if a start is still open.
    pub fn flush(&mut self) -> Vec<NoteEvent> {
        if self.state.armed {
            self.state.armed = false;
            vec![NoteEvent::stop(Voice::Accel, self.notes.clone())]
        } else {
            Vec::new()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
