//! One playing session: both voices, the latest tilt, and the final flush.

use std::time::Instant;

use glove_notes::Config;

use crate::accel::AccelTrigger;
use crate::event::NoteEvent;
use crate::touch::{Contact, TouchVoice};

/// One decoded sensor reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    /// Raw tilt angle, before handedness is applied.
    Tilt(f64),
    Contact(Contact),
    Accel(f64),
    /// All three channels at once (one serial line), applied tilt → accel →
    /// contact.
    Frame { tilt: f64, accel: f64, contact: Contact },
}

/// A sample stamped with its arrival time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedSample {
    pub at:     Instant,
    pub sample: Sample,
}

impl TimedSample {
    pub fn new(at: Instant, sample: Sample) -> Self { TimedSample { at, sample } }

    pub fn now(sample: Sample) -> Self { TimedSample { at: Instant::now(), sample } }
}

/// Owns the two voices for the lifetime of a session.
///
/// Samples must be fed one at a time, in arrival order. Call [`flush`] exactly
/// when the session ends; every note still sounding is stopped and further
/// samples are ignored.
///
/// [`flush`]: Session::flush
#[derive(Clone, Debug)]
pub struct Session {
    touch:      TouchVoice,
    accel:      AccelTrigger,
    handedness: f64,
    /// Handedness-corrected tilt; `None` until the first tilt reading.
    tilt:       Option<f64>,
    /// Latest contact seen before any tilt; applied by the first tilt.
    pending:    Option<Contact>,
    flushed:    bool,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Session {
            touch:      TouchVoice::new(config.tilt_map.clone(), config.legato),
            accel:      AccelTrigger::new(&config.accel, config.legato),
            handedness: config.handedness,
            tilt:       None,
            pending:    None,
            flushed:    false,
        }
    }

    pub fn touch(&self) -> &TouchVoice { &self.touch }
    pub fn accel(&self) -> &AccelTrigger { &self.accel }
    pub fn tilt(&self) -> Option<f64> { self.tilt }
    pub fn is_flushed(&self) -> bool { self.flushed }

    /// Apply one sample and return the resulting note decisions in order.
    pub fn process(&mut self, sample: &TimedSample) -> Vec<NoteEvent> {
        if self.flushed {
            log::debug!(target: "session", "sample after flush ignored: {:?}", sample.sample);
            return Vec::new();
        }
        match sample.sample {
            Sample::Tilt(raw) => self.set_tilt(raw),
            Sample::Contact(contact) => self.contact(contact),
            Sample::Accel(magnitude) => self.accel.on_acceleration(magnitude, sample.at),
            Sample::Frame { tilt, accel, contact } => {
                let mut events = self.set_tilt(tilt);
                events.extend(self.accel.on_acceleration(accel, sample.at));
                events.extend(self.contact(contact));
                events
            }
        }
    }

    /// Store the corrected tilt. The first one also replays a contact that
    /// arrived before it.
    fn set_tilt(&mut self, raw: f64) -> Vec<NoteEvent> {
        let tilt = raw * self.handedness;
        self.tilt = Some(tilt);
        match self.pending.take() {
            Some(contact) => self.touch.on_contact(contact, tilt),
            None => Vec::new(),
        }
    }

    fn contact(&mut self, contact: Contact) -> Vec<NoteEvent> {
        match self.tilt {
            Some(tilt) => self.touch.on_contact(contact, tilt),
            None => {
                log::debug!(target: "session", "contact level {} before any tilt reading; held", contact.level());
                self.pending = Some(contact);
                Vec::new()
            }
        }
    }

    /// Stop every voice still sounding. Only the first call emits anything.
    pub fn flush(&mut self) -> Vec<NoteEvent> {
        if self.flushed {
            return Vec::new();
        }
        self.flushed = true;
        self.pending = None;
        let mut events = self.touch.flush();
        events.extend(self.accel.flush());
        if !events.is_empty() {
            log::info!(target: "session", "flushed {} sounding voice(s)", events.len());
        }
        events
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
