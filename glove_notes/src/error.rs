//! Configuration errors. All of them are fatal at startup.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no tilt breakpoints configured")]
    NoBreakpoints,

    #[error("tilt breakpoint #{index} is lower than the one before it")]
    ThresholdsNotAscending { index: usize },

    #[error("empty note list")]
    EmptyNoteSet,

    #[error("unknown pitch class {0:?} (expected one of C C# D D# E F F# G G# A A# B)")]
    UnknownPitchClass(String),

    #[error("note {label}{octave} is outside the MIDI range 0-127")]
    PitchOutOfRange { label: String, octave: i32 },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
