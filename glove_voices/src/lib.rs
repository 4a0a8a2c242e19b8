//! # glove_voices
//!
//! The decision logic of the glove: for every sensor sample, which notes
//! should be sounding.
//!
//! Two independent voices own disjoint state:
//!
//! | Voice | Driven by | Emits |
//! |---|---|---|
//! | [`TouchVoice`] (gyro) | contact level + tilt | chord from the tilt band; re-chords while held |
//! | [`AccelTrigger`] (accel) | acceleration magnitude + time | one fixed note-set per impulse, debounced |
//!
//! [`Session`] owns one of each plus the latest tilt reading, and is the only
//! thing a transport needs to talk to. Nothing here performs I/O or blocks.
//!
//! ```rust
//! use std::time::Instant;
//! use glove_notes::Config;
//! use glove_voices::{Contact, NoteEvent, Sample, Session, TimedSample};
//!
//! let config = Config::from_json(r#"{
//!     "angle_notes_list": [[0, [["C", 3]]], [90, [["E", 3]]]],
//!     "accel_notes": [["C", 2]],
//!     "accel_sensitivity_+": 200, "accel_sensitivity_-": 200,
//!     "accel_delay": 0.3
//! }"#).unwrap();
//!
//! let mut session = Session::new(&config);
//! let now = Instant::now();
//! session.process(&TimedSample::new(now, Sample::Tilt(-10.0)));
//! let events = session.process(&TimedSample::new(now, Sample::Contact(Contact::Touch)));
//! assert!(matches!(&events[..], [NoteEvent::Start { .. }]));
//! ```

mod accel;
mod event;
mod session;
mod touch;

pub use accel::{AccelTrigger, AccelTriggerState};
pub use event::{NoteEvent, Velocity, Voice, FULL_VELOCITY, SOFT_VELOCITY};
pub use session::{Sample, Session, TimedSample};
pub use touch::{Contact, TouchVoice, TouchVoiceState};
