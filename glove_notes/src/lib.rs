//! # glove_notes
//!
//! Note mapping for the glove controller:
//!
//! * **Pitch classes**: the twelve chromatic labels `C … B`.
//! * **Note-sets**: ordered MIDI pitch codes sounded together by one voice.
//! * **Tilt breakpoints**: ascending angle thresholds, each paired with the
//!   note-set to sound when the hand's tilt is at or below it.
//! * **Configuration**: the JSON document that describes one session
//!   (see [`config`]).
//!
//! ## Quick start
//!
//! ```rust
//! use glove_notes::{Breakpoint, NoteName, resolve_note_set};
//!
//! let breakpoints = vec![
//!     Breakpoint(0.0,  vec![NoteName::new("C", 3), NoteName::new("E", 3)]),
//!     Breakpoint(90.0, vec![NoteName::new("G", 3)]),
//! ];
//!
//! let low = resolve_note_set(-20.0, &breakpoints).unwrap();
//! assert_eq!(low.pitches(), &[36, 40]);
//!
//! // Above the highest threshold the last breakpoint still applies.
//! let high = resolve_note_set(170.0, &breakpoints).unwrap();
//! assert_eq!(high.pitches(), &[43]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub mod config;
mod error;

pub use config::{AccelSettings, Config, ConfigFile, MidiSettings};
pub use error::{ConfigError, Result};

/// A MIDI note number, 0–127.
pub type PitchCode = u8;

// ════════════════════════════════════════════════════════════════════════════
// PitchClass — the twelve chromatic labels
// ════════════════════════════════════════════════════════════════════════════

/// One of the twelve chromatic pitch classes, in the fixed order
/// `C, C#, D, D#, E, F, F#, G, G#, A, A#, B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PitchClass {
    C      = 0,
    CSharp = 1,
    D      = 2,
    DSharp = 3,
    E      = 4,
    F      = 5,
    FSharp = 6,
    G      = 7,
    GSharp = 8,
    A      = 9,
    ASharp = 10,
    B      = 11,
}

impl PitchClass {
    /// All pitch classes in chromatic order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C, PitchClass::CSharp, PitchClass::D, PitchClass::DSharp,
        PitchClass::E, PitchClass::F, PitchClass::FSharp, PitchClass::G,
        PitchClass::GSharp, PitchClass::A, PitchClass::ASharp, PitchClass::B,
    ];

    /// Semitone index within the octave (0–11).
    pub fn index(self) -> u8 { self as u8 }

    /// Label as written in configuration files.
    pub fn label(self) -> &'static str {
        match self {
            PitchClass::C      => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D      => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E      => "E",
            PitchClass::F      => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G      => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A      => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B      => "B",
        }
    }
}

impl FromStr for PitchClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        PitchClass::ALL
            .iter()
            .copied()
            .find(|pc| pc.label() == s)
            .ok_or_else(|| ConfigError::UnknownPitchClass(s.to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteName — a (pitch class, octave) pair as written in the config
// ════════════════════════════════════════════════════════════════════════════

/// A note as it appears in the configuration: `["C#", 3]`.
///
/// The label is kept as a string until [`to_pitch_codes`] resolves it, so an
/// unknown label surfaces as a [`ConfigError`] rather than a parse failure
/// deep inside serde.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NoteName(pub String, pub i32);

impl NoteName {
    pub fn new(label: &str, octave: i32) -> Self {
        NoteName(label.to_string(), octave)
    }

    /// Resolve to a MIDI pitch code: `octave * 12 + pitch_class_index`.
    pub fn pitch_code(&self) -> Result<PitchCode> {
        let class: PitchClass = self.0.parse()?;
        let code = self.1 as i64 * 12 + class.index() as i64;
        if (0..=127).contains(&code) {
            Ok(code as PitchCode)
        } else {
            Err(ConfigError::PitchOutOfRange { label: self.0.clone(), octave: self.1 })
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteSet — resolved pitch codes sounded together
// ════════════════════════════════════════════════════════════════════════════

/// An ordered sequence of pitch codes started and stopped together.
///
/// Duplicates are kept: each occurrence is its own note instance on the wire.
/// The default value is the empty set, which a voice holds before its first
/// start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NoteSet(Vec<PitchCode>);

impl NoteSet {
    pub fn new(pitches: Vec<PitchCode>) -> Self { NoteSet(pitches) }

    pub fn pitches(&self) -> &[PitchCode] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = PitchCode> + '_ { self.0.iter().copied() }
}

impl From<Vec<PitchCode>> for NoteSet {
    fn from(pitches: Vec<PitchCode>) -> Self { NoteSet(pitches) }
}

impl fmt::Display for NoteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Convert configured note names into pitch codes, preserving order and
/// duplicates.
///
/// Fails on an empty list, an unknown pitch-class label, or a note that lands
/// outside 0–127.
pub fn to_pitch_codes(notes: &[NoteName]) -> Result<NoteSet> {
    if notes.is_empty() {
        return Err(ConfigError::EmptyNoteSet);
    }
    notes.iter()
        .map(NoteName::pitch_code)
        .collect::<Result<Vec<_>>>()
        .map(NoteSet)
}

// ════════════════════════════════════════════════════════════════════════════
// Breakpoints — tilt angle → note-set
// ════════════════════════════════════════════════════════════════════════════

/// A tilt threshold and the notes to sound at or below it: `[90, [["E", 3]]]`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Breakpoint(pub f64, pub Vec<NoteName>);

/// First item whose threshold is ≥ `tilt`, falling back to the last item when
/// the tilt is above every threshold.
fn select_band<T>(tilt: f64, items: &[T], threshold: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter()
        .find(|item| tilt <= threshold(item))
        .or_else(|| items.last())
}

/// Resolve the note-set for `tilt` from raw configured breakpoints.
///
/// Breakpoints are scanned in order; the first one whose threshold is ≥ `tilt`
/// wins. A tilt above every threshold falls into an open upper band and gets
/// the last breakpoint's notes.
pub fn resolve_note_set(tilt: f64, breakpoints: &[Breakpoint]) -> Result<NoteSet> {
    let Breakpoint(_, notes) = select_band(tilt, breakpoints, |b| b.0)
        .ok_or(ConfigError::NoBreakpoints)?;
    to_pitch_codes(notes)
}

/// One validated band of a [`TiltMap`].
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub threshold: f64,
    pub notes:     NoteSet,
}

/// Breakpoints validated and resolved once, at load time.
///
/// Construction checks everything [`resolve_note_set`] could fail on, so
/// [`TiltMap::resolve`] cannot fail while a session is running.
#[derive(Clone, Debug, PartialEq)]
pub struct TiltMap {
    /// Every band but the last, ascending.
    lower: Vec<Band>,
    /// The highest band; also covers tilts above its threshold.
    upper: Band,
}

impl TiltMap {
    /// Validate and resolve `breakpoints`.
    ///
    /// Requires at least one breakpoint, finite thresholds in ascending
    /// (non-decreasing) order, and resolvable non-empty note-sets.
    pub fn new(breakpoints: &[Breakpoint]) -> Result<Self> {
        let mut bands = Vec::with_capacity(breakpoints.len());
        for (index, Breakpoint(threshold, notes)) in breakpoints.iter().enumerate() {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidField {
                    field:  "angle_notes_list",
                    reason: format!("threshold #{} is not a finite number", index),
                });
            }
            if let Some(prev) = bands.last().map(|b: &Band| b.threshold) {
                if *threshold < prev {
                    return Err(ConfigError::ThresholdsNotAscending { index });
                }
            }
            bands.push(Band { threshold: *threshold, notes: to_pitch_codes(notes)? });
        }
        let upper = bands.pop().ok_or(ConfigError::NoBreakpoints)?;
        Ok(TiltMap { lower: bands, upper })
    }

    /// Note-set for a (handedness-corrected) tilt angle.
    pub fn resolve(&self, tilt: f64) -> &NoteSet {
        self.lower.iter()
            .find(|band| tilt <= band.threshold)
            .map(|band| &band.notes)
            .unwrap_or(&self.upper.notes)
    }

    /// All bands, lowest first.
    pub fn bands(&self) -> impl Iterator<Item = &Band> {
        self.lower.iter().chain(std::iter::once(&self.upper))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
