//! # glove_controller
//!
//! Wearable motion glove → MIDI. One touch sensor, a tilt angle and an
//! accelerometer drive two voices.
//!
//! ## Sensor → Note mapping
//!
//! | Sensor | Change | Result |
//! |---|---|---|
//! | Touch | 0 → 1 | Start the chord of the current tilt band (vel 127) |
//! | Touch | 0 → 2 | Same chord, pianissimo (vel 32) |
//! | Tilt | band change while touching | Stop old chord, start new one |
//! | Touch | → 0 | Stop the chord (kept ringing with `legato`) |
//! | Accel | \|a\| above sensitivity | Start the accel note-set, at most once per `accel_delay` |
//! | Accel | back below, after `accel_delay` | Stop the accel note-set |
//!
//! ## Transports
//!
//! * **Serial**: `<id>/<tilt>/<accel>/<touch>` lines from a tty, a capture
//!   file, or stdin ([`source::LineSource`]).
//! * **BLE**: raw characteristic notifications handed over by a BLE stack
//!   ([`source::NotificationSource`]).
//!
//! Both end up as [`glove_voices::TimedSample`]s on a channel consumed by
//! [`app::drive`].

pub mod app;
pub mod source;
mod error;

pub use error::AppError;
