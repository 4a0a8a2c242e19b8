//! Note decisions emitted by the voices.

use std::fmt;

use glove_notes::NoteSet;

/// MIDI velocity of a normal start.
pub const FULL_VELOCITY: u8 = 127;
/// MIDI velocity of a soft-touch (pianissimo) start.
pub const SOFT_VELOCITY: u8 = 32;

/// Which voice produced an event. The sink maps each to its own channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Voice {
    /// Touch contact + tilt.
    Gyro,
    /// Acceleration impulses.
    Accel,
}

impl Voice {
    pub fn name(self) -> &'static str {
        match self {
            Voice::Gyro  => "gyro",
            Voice::Accel => "accel",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Velocity {
    Full,
    Soft,
}

impl Velocity {
    /// MIDI byte value.
    pub fn midi(self) -> u8 {
        match self {
            Velocity::Full => FULL_VELOCITY,
            Velocity::Soft => SOFT_VELOCITY,
        }
    }
}

/// A start/stop decision for every pitch of a note-set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    Start { voice: Voice, pitches: NoteSet, velocity: Velocity },
    Stop  { voice: Voice, pitches: NoteSet },
}

impl NoteEvent {
    pub fn start(voice: Voice, pitches: NoteSet, velocity: Velocity) -> Self {
        NoteEvent::Start { voice, pitches, velocity }
    }

    pub fn stop(voice: Voice, pitches: NoteSet) -> Self {
        NoteEvent::Stop { voice, pitches }
    }

    pub fn voice(&self) -> Voice {
        match self {
            NoteEvent::Start { voice, .. } | NoteEvent::Stop { voice, .. } => *voice,
        }
    }

    pub fn pitches(&self) -> &NoteSet {
        match self {
            NoteEvent::Start { pitches, .. } | NoteEvent::Stop { pitches, .. } => pitches,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, NoteEvent::Start { .. })
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteEvent::Start { voice, pitches, velocity } =>
                write!(f, "{} start {} vel {}", voice.name(), pitches, velocity.midi()),
            NoteEvent::Stop { voice, pitches } =>
                write!(f, "{} stop {}", voice.name(), pitches),
        }
    }
}
