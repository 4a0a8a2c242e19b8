//! Raw MIDI output backends and port selection.

use crate::error::{MidiError, Result};

const CLIENT_NAME:     &str = "glove";
const CONNECTION_NAME: &str = "glove-out";

/// Name fragments of software synthesisers, preferred when no port is named.
const SOFTSYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

/// A channel-message sink. Channels are 0-based and masked to 4 bits.
pub trait MidiOut: Send {
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8);
}

impl<O: MidiOut + ?Sized> MidiOut for Box<O> {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        (**self).note_on(channel, note, velocity)
    }
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) {
        (**self).note_off(channel, note, velocity)
    }
}

/// Status byte of a Note On on `channel`.
pub fn note_on_status(channel: u8) -> u8 { 0x90 | (channel & 0x0F) }

/// Status byte of a Note Off on `channel`.
pub fn note_off_status(channel: u8) -> u8 { 0x80 | (channel & 0x0F) }

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirOut {
    conn: midir::MidiOutputConnection,
    port: String,
}

impl MidirOut {
    pub fn port_name(&self) -> &str { &self.port }

    fn send(&mut self, msg: [u8; 3]) {
        // A dropped message must not end the session.
        if let Err(e) = self.conn.send(&msg) {
            log::warn!(target: "midi", "send {:02X?} to {} failed: {}", msg, self.port, e);
        }
    }
}

impl MidiOut for MidirOut {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send([note_on_status(channel), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send([note_off_status(channel), note & 0x7F, velocity & 0x7F]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct NullOut;

impl MidiOut for NullOut {
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8, _v: u8) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Pick an output port index from the available `names`.
///
/// A `hint` matches the first name containing it (case-insensitive). Without
/// a hint, or when it matches nothing, the first software synth wins, then
/// port 0. `None` only when there are no ports.
pub fn select_port<S: AsRef<str>>(names: &[S], hint: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let lower: Vec<String> = names.iter().map(|n| n.as_ref().to_lowercase()).collect();

    if let Some(hint) = hint {
        let hint = hint.to_lowercase();
        if let Some(i) = lower.iter().position(|n| n.contains(&hint)) {
            return Some(i);
        }
        log::warn!(target: "midi", "no MIDI output matches {:?}; falling back", hint);
    }

    let synth = lower.iter()
        .position(|n| SOFTSYNTH_HINTS.iter().any(|s| n.contains(s)));
    Some(synth.unwrap_or(0))
}

/// Names of every MIDI output port currently visible.
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)?;
    midi_out.ports().iter()
        .map(|p| midi_out.port_name(p).map_err(MidiError::from))
        .collect()
}

/// Open the port chosen by [`select_port`].
pub fn open_output(hint: Option<&str>) -> Result<MidirOut> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)?;
    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let idx = select_port(&names, hint).ok_or(MidiError::NoPorts)?;
    let port = names[idx].clone();
    log::info!(target: "midi", "opening MIDI port: {}", port);

    let conn = midi_out.connect(&ports[idx], CONNECTION_NAME)?;
    Ok(MidirOut { conn, port })
}

/// [`open_output`], falling back to [`NullOut`] with a warning so a session
/// can still run without a synthesiser.
pub fn open_output_or_null(hint: Option<&str>) -> Box<dyn MidiOut> {
    match open_output(hint) {
        Ok(out) => Box::new(out),
        Err(e) => {
            log::warn!(target: "midi", "{}; using null output", e);
            if matches!(e, MidiError::NoPorts) {
                log::warn!(target: "midi", "install a synthesiser such as `fluidsynth` or `timidity -iA`");
            }
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
