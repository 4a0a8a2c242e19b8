//! Session configuration.
//!
//! [`ConfigFile`] mirrors the JSON document field for field (including the
//! device's historical names such as `accel_sensitivity_+`).
//! [`ConfigFile::validate`] turns it into a [`Config`] whose note-sets are
//! already resolved, so nothing can fail once samples start arriving.
//!
//! ```json
//! {
//!   "angle_notes_list": [[0, [["C", 3], ["E", 3], ["G", 3]]], [90, [["E", 3]]]],
//!   "legato": false,
//!   "accel_notes": [["C", 2]],
//!   "accel_sensitivity_+": 200,
//!   "accel_sensitivity_-": 200,
//!   "accel_delay": 0.3,
//!   "hand": 1,
//!   "midi": { "port": "fluid", "gyro_channel": 0, "accel_channel": 1 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{to_pitch_codes, Breakpoint, ConfigError, NoteName, NoteSet, Result, TiltMap};

/// Channel used by the gyro (touch) voice when nothing else is configured.
pub const DEFAULT_GYRO_CHANNEL:  u8 = 0;
/// Channel used by the accel voice when nothing else is configured.
pub const DEFAULT_ACCEL_CHANNEL: u8 = 1;

// ════════════════════════════════════════════════════════════════════════════
// ConfigFile — the document as written
// ════════════════════════════════════════════════════════════════════════════

/// Raw configuration document.
#[derive(Clone, Debug, Deserialize)]
pub struct ConfigFile {
    /// Ascending tilt breakpoints.
    #[serde(rename = "angle_notes_list")]
    pub breakpoints: Vec<Breakpoint>,

    #[serde(default)]
    pub legato: bool,

    /// Notes fired by the accel voice.
    pub accel_notes: Vec<NoteName>,

    #[serde(rename = "accel_sensitivity_+")]
    pub accel_sensitivity_positive: f64,

    #[serde(rename = "accel_sensitivity_-")]
    pub accel_sensitivity_negative: f64,

    /// Refractory period of the accel voice, in seconds.
    pub accel_delay: f64,

    /// Handedness multiplier applied to raw tilt: `1` or `-1`.
    #[serde(default = "default_hand")]
    pub hand: i8,

    /// Legacy 1-based channel shared by both voices.
    #[serde(default)]
    pub midiout_port: Option<u8>,

    #[serde(default)]
    pub midi: Option<MidiSection>,
}

fn default_hand() -> i8 { 1 }

/// The optional `"midi"` object.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MidiSection {
    /// Case-insensitive substring of the output port name.
    #[serde(default)]
    pub port:          Option<String>,
    #[serde(default)]
    pub gyro_channel:  Option<u8>,
    #[serde(default)]
    pub accel_channel: Option<u8>,
}

impl ConfigFile {
    /// Check every field and resolve all note names.
    pub fn validate(self) -> Result<Config> {
        let tilt_map = TiltMap::new(&self.breakpoints)?;

        let sensitivity_positive = finite_non_negative("accel_sensitivity_+", self.accel_sensitivity_positive)?;
        let sensitivity_negative = finite_non_negative("accel_sensitivity_-", self.accel_sensitivity_negative)?;
        let refractory = Duration::try_from_secs_f64(self.accel_delay)
            .map_err(|e| ConfigError::InvalidField {
                field:  "accel_delay",
                reason: e.to_string(),
            })?;
        let accel = AccelSettings {
            notes: to_pitch_codes(&self.accel_notes)?,
            sensitivity_positive,
            sensitivity_negative,
            refractory,
        };

        let handedness = match self.hand {
            1  =>  1.0,
            -1 => -1.0,
            other => return Err(ConfigError::InvalidField {
                field:  "hand",
                reason: format!("expected 1 or -1, got {}", other),
            }),
        };

        let midi = midi_settings(self.midi, self.midiout_port)?;

        Ok(Config { tilt_map, legato: self.legato, accel, handedness, midi })
    }
}

fn finite_non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidField { field, reason: format!("expected a non-negative number, got {}", value) })
    }
}

fn channel(field: &'static str, value: u8) -> Result<u8> {
    if value <= 15 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidField { field, reason: format!("MIDI channel {} is above 15", value) })
    }
}

fn midi_settings(section: Option<MidiSection>, legacy_port: Option<u8>) -> Result<MidiSettings> {
    let (gyro_default, accel_default) = match legacy_port {
        Some(0) => return Err(ConfigError::InvalidField {
            field:  "midiout_port",
            reason: "channels are numbered from 1".to_string(),
        }),
        Some(p) if section.is_none() => (p - 1, p - 1),
        Some(_) => {
            log::warn!(target: "config", "both \"midi\" and \"midiout_port\" set; ignoring midiout_port");
            (DEFAULT_GYRO_CHANNEL, DEFAULT_ACCEL_CHANNEL)
        }
        None => (DEFAULT_GYRO_CHANNEL, DEFAULT_ACCEL_CHANNEL),
    };
    let section = section.unwrap_or_default();
    Ok(MidiSettings {
        port:          section.port,
        gyro_channel:  channel("midi.gyro_channel",  section.gyro_channel.unwrap_or(gyro_default))?,
        accel_channel: channel("midi.accel_channel", section.accel_channel.unwrap_or(accel_default))?,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Config — validated, ready for a session
// ════════════════════════════════════════════════════════════════════════════

/// Validated configuration for one session. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub tilt_map:   TiltMap,
    pub legato:     bool,
    pub accel:      AccelSettings,
    /// `1.0` or `-1.0`.
    pub handedness: f64,
    pub midi:       MidiSettings,
}

/// Accel voice parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AccelSettings {
    pub notes:                NoteSet,
    pub sensitivity_positive: f64,
    pub sensitivity_negative: f64,
    pub refractory:           Duration,
}

/// Where note events go on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiSettings {
    pub port:          Option<String>,
    pub gyro_channel:  u8,
    pub accel_channel: u8,
}

impl Config {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Config> {
        let file: ConfigFile = serde_json::from_str(text)?;
        file.validate()
    }

    /// Read, parse and validate the JSON file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = Config::from_json(&text)?;
        log::debug!(
            target: "config",
            "loaded {}: {} tilt bands, legato={}, accel notes {}",
            path.display(), config.tilt_map.bands().count(), config.legato, config.accel.notes
        );
        Ok(config)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
