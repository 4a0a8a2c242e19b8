//! # glove_midi
//!
//! Turns [`glove_voices::NoteEvent`]s into MIDI channel messages.
//!
//! | Piece | Role |
//! |---|---|
//! | [`MidiOut`] | raw Note On / Note Off writer |
//! | [`MidirOut`] | real port via `midir` |
//! | [`NullOut`] | discards everything; used when no port can be opened |
//! | [`MidiSink`] | maps each voice to its channel, one message per pitch |
//!
//! | Event | Bytes per pitch `p` |
//! |---|---|
//! | gyro start | `0x90\|gyro_ch, p, 127` (`32` on soft touch) |
//! | accel start | `0x90\|accel_ch, p, 127` |
//! | any stop | `0x80\|ch, p, 100` |

mod error;
mod output;
mod sink;

pub use error::{MidiError, Result};
pub use output::{
    list_output_ports, note_off_status, note_on_status, open_output, open_output_or_null,
    select_port, MidiOut, MidirOut, NullOut,
};
pub use sink::{MidiSink, NoteEventSink, NOTE_OFF_VELOCITY};
