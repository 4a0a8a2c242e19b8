//! From note decisions to channel messages.

use glove_notes::MidiSettings;
use glove_voices::{NoteEvent, Voice};

use crate::output::MidiOut;

/// Velocity byte sent with every Note Off.
pub const NOTE_OFF_VELOCITY: u8 = 100;

/// Anything that consumes note decisions in order.
pub trait NoteEventSink {
    fn send(&mut self, event: &NoteEvent);
}

impl<S: NoteEventSink + ?Sized> NoteEventSink for &mut S {
    fn send(&mut self, event: &NoteEvent) { (**self).send(event) }
}

/// Writes each [`NoteEvent`] to a [`MidiOut`], one message per pitch code,
/// on the channel of the voice that produced it.
pub struct MidiSink<O: MidiOut> {
    out:           O,
    gyro_channel:  u8,
    accel_channel: u8,
}

impl<O: MidiOut> MidiSink<O> {
    pub fn new(out: O, settings: &MidiSettings) -> Self {
        MidiSink {
            out,
            gyro_channel:  settings.gyro_channel,
            accel_channel: settings.accel_channel,
        }
    }

    pub fn channel(&self, voice: Voice) -> u8 {
        match voice {
            Voice::Gyro  => self.gyro_channel,
            Voice::Accel => self.accel_channel,
        }
    }

    pub fn output(&self) -> &O { &self.out }

    pub fn into_output(self) -> O { self.out }
}

impl<O: MidiOut> NoteEventSink for MidiSink<O> {
    fn send(&mut self, event: &NoteEvent) {
        let channel = self.channel(event.voice());
        log::debug!(target: "midi", "ch {} {}", channel, event);
        match event {
            NoteEvent::Start { pitches, velocity, .. } => {
                for p in pitches.iter() {
                    self.out.note_on(channel, p, velocity.midi());
                }
            }
            NoteEvent::Stop { pitches, .. } => {
                for p in pitches.iter() {
                    self.out.note_off(channel, p, NOTE_OFF_VELOCITY);
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
