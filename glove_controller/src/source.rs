//! Sample sources: the serial line feed and BLE notifications.
//!
//! The public interface is [`TimedSample`] delivered over a `mpsc` channel.
//! The session loop doesn't need to know which transport produced a sample.
//!
//! The `glove` binary reads serial frames only. For BLE, the embedding
//! program owns the host BLE stack: it subscribes to the three
//! characteristics ([`TILT_CHARACTERISTIC`], [`TOUCH_CHARACTERISTIC`],
//! [`ACCEL_CHARACTERISTIC`]), maps each notification's UUID with
//! [`Channel::from_uuid`], and sends `(Channel, payload)` pairs to a
//! [`NotificationSource`] whose output goes to `app::drive`.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use glove_voices::{Contact, Sample, TimedSample};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// SensorDecodeError
// ════════════════════════════════════════════════════════════════════════════

/// A malformed line or payload. Logged and dropped by the sources.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorDecodeError {
    #[error("expected 4 '/'-separated fields, found {found}")]
    FieldCount { found: usize },

    #[error("field {field}: {value:?} is not a number")]
    BadNumber { field: &'static str, value: String },

    #[error("field {field}: {value} is not finite")]
    NonFinite { field: &'static str, value: f64 },

    #[error("contact level {0} is not 0, 1 or 2")]
    ContactLevel(u64),

    #[error("payload of {0} bytes; expected 1 to 8")]
    PayloadLength(usize),
}

// ════════════════════════════════════════════════════════════════════════════
// Serial line format
// ════════════════════════════════════════════════════════════════════════════

/// Decode one `<id>/<tilt>/<accel>/<touch>` line into a frame.
///
/// The id is the device's running counter and is not used.
pub fn decode_line(line: &str) -> Result<Sample, SensorDecodeError> {
    let fields: Vec<&str> = line.trim().split('/').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(SensorDecodeError::FieldCount { found: fields.len() });
    }
    let tilt  = parse_float("tilt",  fields[1])?;
    let accel = parse_float("accel", fields[2])?;
    let level: u64 = fields[3].parse()
        .map_err(|_| SensorDecodeError::BadNumber { field: "touch", value: fields[3].to_string() })?;
    let contact = Contact::from_level(level).ok_or(SensorDecodeError::ContactLevel(level))?;
    Ok(Sample::Frame { tilt, accel, contact })
}

fn parse_float(field: &'static str, text: &str) -> Result<f64, SensorDecodeError> {
    let value: f64 = text.parse()
        .map_err(|_| SensorDecodeError::BadNumber { field, value: text.to_string() })?;
    if !value.is_finite() {
        return Err(SensorDecodeError::NonFinite { field, value });
    }
    Ok(value)
}

// ════════════════════════════════════════════════════════════════════════════
// BLE notification payloads
// ════════════════════════════════════════════════════════════════════════════

/// GATT characteristic carrying the touch level (unsigned).
pub const TOUCH_CHARACTERISTIC: &str = "62c84a29-95d6-44e4-a13d-a9372147ce21";
/// GATT characteristic carrying the tilt angle (signed).
pub const TILT_CHARACTERISTIC:  &str = "9b7580ed-9fc2-41e7-b7c2-f63de01f0692";
/// GATT characteristic carrying the acceleration magnitude (signed).
pub const ACCEL_CHARACTERISTIC: &str = "f62094cf-21a7-4f71-bb3f-5a5b17bb134e";

/// One notifying characteristic of the glove.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Tilt,
    Touch,
    Accel,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Tilt, Channel::Touch, Channel::Accel];

    pub fn uuid(self) -> &'static str {
        match self {
            Channel::Tilt  => TILT_CHARACTERISTIC,
            Channel::Touch => TOUCH_CHARACTERISTIC,
            Channel::Accel => ACCEL_CHARACTERISTIC,
        }
    }

    /// Case-insensitive lookup by characteristic UUID.
    pub fn from_uuid(uuid: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.uuid().eq_ignore_ascii_case(uuid.trim()))
    }
}

/// Little-endian integer of 1–8 bytes, sign-extended when `signed`.
fn le_integer(bytes: &[u8], signed: bool) -> Result<i128, SensorDecodeError> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(SensorDecodeError::PayloadLength(bytes.len()));
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    let raw = u64::from_le_bytes(buf);
    if signed {
        let shift = 64 - 8 * bytes.len() as u32;
        Ok((((raw << shift) as i64) >> shift) as i128)
    } else {
        Ok(raw as i128)
    }
}

/// Decode one notification payload of `channel`.
pub fn decode_notification(channel: Channel, payload: &[u8]) -> Result<Sample, SensorDecodeError> {
    match channel {
        Channel::Tilt  => Ok(Sample::Tilt(le_integer(payload, true)? as f64)),
        Channel::Accel => Ok(Sample::Accel(le_integer(payload, true)? as f64)),
        Channel::Touch => {
            let level = le_integer(payload, false)? as u64;
            Contact::from_level(level)
                .map(Sample::Contact)
                .ok_or(SensorDecodeError::ContactLevel(level))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SampleSource trait — unified interface for every transport
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`TimedSample`]s over a channel.
///
/// A source returns when its input ends or the receiver hangs up; dropping
/// the sender is how the session learns the feed has ended.
pub trait SampleSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<TimedSample>);
}

/// Spawn a sample source on its own thread and return the receiving end.
pub fn spawn_sample_source<S: SampleSource>(source: S) -> Receiver<TimedSample> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// LineSource — serial device or stdin
// ════════════════════════════════════════════════════════════════════════════

/// Reads serial frames, one per line, from any buffered reader: a tty opened
/// as a file, a capture file, or stdin.
pub struct LineSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> LineSource<R> {
    pub fn new(reader: R) -> Self { LineSource { reader } }
}

impl<R: BufRead + Send + 'static> SampleSource for LineSource<R> {
    fn run(self: Box<Self>, tx: Sender<TimedSample>) {
        for (n, line) in self.reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    log::warn!(target: "source", "read error after {} lines: {}", n, e);
                    return;
                }
            };
            if line.trim().is_empty() { continue; }
            match decode_line(&line) {
                Ok(sample) => {
                    if tx.send(TimedSample::now(sample)).is_err() { return; }
                }
                Err(e) => log::warn!(target: "source", "line {}: {} ({:?})", n + 1, e, line),
            }
        }
        log::info!(target: "source", "input ended");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NotificationSource — BLE characteristic notifications
// ════════════════════════════════════════════════════════════════════════════

/// Decodes raw `(Channel, payload)` notifications handed over by whatever BLE
/// stack is subscribed to the glove. Ends when that sender is dropped.
///
/// ```rust
/// use std::sync::mpsc;
/// use glove_controller::source::{spawn_sample_source, Channel, NotificationSource};
/// use glove_voices::Sample;
///
/// let (ble_tx, rx) = mpsc::channel();
/// let samples = spawn_sample_source(NotificationSource { rx });
///
/// // inside the BLE stack's notification callback:
/// let uuid = "9b7580ed-9fc2-41e7-b7c2-f63de01f0692";
/// if let Some(channel) = Channel::from_uuid(uuid) {
///     ble_tx.send((channel, vec![0x2A])).unwrap();
/// }
/// drop(ble_tx);
///
/// assert_eq!(samples.recv().unwrap().sample, Sample::Tilt(42.0));
/// ```
pub struct NotificationSource {
    pub rx: Receiver<(Channel, Vec<u8>)>,
}

impl SampleSource for NotificationSource {
    fn run(self: Box<Self>, tx: Sender<TimedSample>) {
        for (channel, payload) in self.rx {
            match decode_notification(channel, &payload) {
                Ok(sample) => {
                    if tx.send(TimedSample::now(sample)).is_err() { return; }
                }
                Err(e) => log::warn!(target: "source", "{:?} notification {:02X?}: {}", channel, payload, e),
            }
        }
        log::info!(target: "source", "notifications ended");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
