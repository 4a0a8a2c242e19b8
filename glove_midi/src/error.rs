//! Error types for MIDI output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("no MIDI output ports found")]
    NoPorts,

    #[error("MIDI port error: {0}")]
    Port(String),

    #[error("MIDI connect error: {0}")]
    Connect(String),
}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::Init(e.to_string())
    }
}

impl From<midir::PortInfoError> for MidiError {
    fn from(e: midir::PortInfoError) -> Self {
        MidiError::Port(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for MidiError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        MidiError::Connect(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MidiError>;
