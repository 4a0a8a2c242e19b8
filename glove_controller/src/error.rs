//! Top-level error of the controller.

use std::path::PathBuf;

use glove_midi::MidiError;
use glove_notes::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Midi(#[from] MidiError),

    #[error("cannot open sensor device {}: {source}", path.display())]
    Device {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
