//! The session loop.
//!
//! [`run`] loads the configuration, opens the sample feed and the MIDI
//! output, then hands them to [`drive`], which pulls samples until the feed
//! ends, the deadline passes or a [`Shutdown`] is requested, and flushes the
//! session exactly once.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glove_midi::{list_output_ports, open_output_or_null, MidiOut, MidiSink, NoteEventSink, NullOut};
use glove_notes::Config;
use glove_voices::{NoteEvent, Session, TimedSample};

use crate::error::AppError;
use crate::source::{spawn_sample_source, LineSource};

/// How long the loop blocks on an empty feed before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where serial frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Stdin,
    /// A serial tty (already configured for the device's baud rate) or a
    /// capture file.
    Serial(PathBuf),
}

/// Configuration for one run of the controller.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub input:       Input,
    /// Overrides the configured MIDI port name.
    pub port:        Option<String>,
    /// End the session after this long.
    pub duration:    Option<Duration>,
    /// Null MIDI output; every event is logged instead.
    pub dry_run:     bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Shutdown
// ════════════════════════════════════════════════════════════════════════════

/// Cooperative stop request shared with the loop.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self { Shutdown::default() }

    pub fn request(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_requested(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// Route SIGINT and SIGTERM to `shutdown`, so an interrupted session still
/// reaches its flush. Can be installed once per process.
pub fn install_signal_handler(shutdown: &Shutdown) -> Result<(), AppError> {
    let shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        log::info!(target: "session", "interrupt received; stopping");
        shutdown.request();
    })?;
    Ok(())
}

/// Deadline `duration` after `now`; `None` (no deadline) when that instant is
/// not representable.
pub fn deadline_after(now: Instant, duration: Duration) -> Option<Instant> {
    let deadline = now.checked_add(duration);
    if deadline.is_none() {
        log::warn!(target: "session", "time limit of {:?} is out of range; running without one", duration);
    }
    deadline
}

// ════════════════════════════════════════════════════════════════════════════
// drive — the processing loop
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub samples: usize,
    pub events:  usize,
}

/// Why [`drive`] stopped pulling samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    FeedEnded,
    Deadline,
    Shutdown,
}

/// Feed every sample from `rx` through `session` into `sink`, then flush.
pub fn drive<S: NoteEventSink>(
    session:  &mut Session,
    rx:       &Receiver<TimedSample>,
    sink:     &mut S,
    shutdown: &Shutdown,
    deadline: Option<Instant>,
) -> (SessionStats, StopReason) {
    let mut stats = SessionStats::default();

    let reason = loop {
        if shutdown.is_requested() {
            break StopReason::Shutdown;
        }
        let wait = match deadline {
            Some(d) => match d.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => left.min(POLL_INTERVAL),
                _ => break StopReason::Deadline,
            },
            None => POLL_INTERVAL,
        };
        match rx.recv_timeout(wait) {
            Ok(sample) => {
                stats.samples += 1;
                for event in session.process(&sample) {
                    sink.send(&event);
                    stats.events += 1;
                }
            }
            Err(RecvTimeoutError::Timeout)      => continue,
            Err(RecvTimeoutError::Disconnected) => break StopReason::FeedEnded,
        }
    };

    for event in session.flush() {
        sink.send(&event);
        stats.events += 1;
    }
    log::info!(
        target: "session",
        "session ended ({:?}): {} samples, {} note events",
        reason, stats.samples, stats.events,
    );
    (stats, reason)
}

/// Logs every event at `info` before passing it on.
pub struct Logged<S>(pub S);

impl<S: NoteEventSink> NoteEventSink for Logged<S> {
    fn send(&mut self, event: &NoteEvent) {
        log::info!(target: "session", "{}", event);
        self.0.send(event);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run — wire everything together
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: AppConfig) -> Result<SessionStats, AppError> {
    run_until(cfg, &Shutdown::new())
}

/// [`run`] with an external stop handle.
pub fn run_until(cfg: AppConfig, shutdown: &Shutdown) -> Result<SessionStats, AppError> {
    let config = Config::from_path(&cfg.config_path)?;
    log::info!(
        target: "session",
        "loaded {}: {} tilt bands, legato={}, accel notes {}",
        cfg.config_path.display(),
        config.tilt_map.bands().count(),
        config.legato,
        config.accel.notes,
    );

    let rx = match &cfg.input {
        Input::Stdin => {
            log::info!(target: "source", "reading frames from stdin");
            spawn_sample_source(LineSource::new(BufReader::new(io::stdin())))
        }
        Input::Serial(path) => {
            let file = File::open(path)
                .map_err(|source| AppError::Device { path: path.clone(), source })?;
            log::info!(target: "source", "reading frames from {}", path.display());
            spawn_sample_source(LineSource::new(BufReader::new(file)))
        }
    };

    let out: Box<dyn MidiOut> = if cfg.dry_run {
        log::info!(target: "midi", "dry run: MIDI output disabled");
        Box::new(NullOut)
    } else {
        open_output_or_null(cfg.port.as_deref().or(config.midi.port.as_deref()))
    };
    let sink = MidiSink::new(out, &config.midi);

    let mut session = Session::new(&config);
    let deadline = cfg.duration.and_then(|d| deadline_after(Instant::now(), d));

    let (stats, _) = if cfg.dry_run {
        drive(&mut session, &rx, &mut Logged(sink), shutdown, deadline)
    } else {
        let mut sink = sink;
        drive(&mut session, &rx, &mut sink, shutdown, deadline)
    };
    Ok(stats)
}

/// Print the visible MIDI outputs, one per line, numbered from 0.
pub fn print_ports(out: &mut impl Write) -> Result<(), AppError> {
    let ports = list_output_ports()?;
    if ports.is_empty() {
        writeln!(out, "no MIDI output ports found")?;
    }
    for (i, name) in ports.iter().enumerate() {
        writeln!(out, "{:>3}  {}", i, name)?;
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use glove_notes::NoteSet;
    use glove_voices::{Contact, Sample, Velocity, Voice};

    const CONFIG: &str = r#"{
        "angle_notes_list": [[0, [["C", 3]]], [90, [["E", 3]]]],
        "legato": false,
        "accel_notes": [["G", 2]],
        "accel_sensitivity_+": 200,
        "accel_sensitivity_-": 200,
        "accel_delay": 0.3
    }"#;

    #[derive(Default)]
    struct Collect(Vec<NoteEvent>);

    impl NoteEventSink for Collect {
        fn send(&mut self, event: &NoteEvent) { self.0.push(event.clone()) }
    }

    fn session() -> Session {
        Session::new(&Config::from_json(CONFIG).unwrap())
    }

    fn frame(tilt: f64, accel: f64, contact: Contact) -> TimedSample {
        TimedSample::now(Sample::Frame { tilt, accel, contact })
    }

    #[test]
    fn ended_feed_flushes_held_notes() {
        let (tx, rx) = mpsc::channel();
        tx.send(frame(-10.0, 0.0, Contact::Touch)).unwrap();
        drop(tx);

        let mut sink = Collect::default();
        let mut s = session();
        let (stats, reason) = drive(&mut s, &rx, &mut sink, &Shutdown::new(), None);

        assert_eq!(reason, StopReason::FeedEnded);
        assert_eq!(stats, SessionStats { samples: 1, events: 2 });
        assert_eq!(sink.0, vec![
            NoteEvent::start(Voice::Gyro, NoteSet::new(vec![36]), Velocity::Full),
            NoteEvent::stop(Voice::Gyro, NoteSet::new(vec![36])),
        ]);
        assert!(s.is_flushed());
    }

    #[test]
    fn deadline_ends_a_live_feed() {
        let (tx, rx) = mpsc::channel();
        tx.send(frame(45.0, 300.0, Contact::Released)).unwrap();

        let mut sink = Collect::default();
        let deadline = Instant::now() + Duration::from_millis(120);
        let (stats, reason) = drive(&mut session(), &rx, &mut sink, &Shutdown::new(), Some(deadline));

        assert_eq!(reason, StopReason::Deadline);
        assert_eq!(stats.samples, 1);
        // Accel start, then its flush stop.
        assert_eq!(sink.0.len(), 2);
        assert!(sink.0.iter().all(|e| e.voice() == Voice::Accel));
        drop(tx);
    }

    #[test]
    fn shutdown_stops_before_pulling() {
        let (tx, rx) = mpsc::channel();
        tx.send(frame(-10.0, 0.0, Contact::Touch)).unwrap();
        let shutdown = Shutdown::new();
        shutdown.clone().request();

        let mut sink = Collect::default();
        let (stats, reason) = drive(&mut session(), &rx, &mut sink, &shutdown, None);
        assert_eq!(reason, StopReason::Shutdown);
        assert_eq!(stats, SessionStats::default());
        assert!(sink.0.is_empty());
        drop(tx);
    }

    #[test]
    fn shutdown_from_another_thread() {
        let (tx, rx) = mpsc::channel::<TimedSample>();
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            remote.request();
        });

        let (_, reason) = drive(&mut session(), &rx, &mut Collect::default(), &shutdown, None);
        assert_eq!(reason, StopReason::Shutdown);
        handle.join().unwrap();
        drop(tx);
    }

    #[test]
    fn interrupt_mid_session_still_flushes_held_notes() {
        let (tx, rx) = mpsc::channel();
        tx.send(frame(-10.0, 300.0, Contact::Touch)).unwrap();
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            remote.request();
        });

        let mut sink = Collect::default();
        let (stats, reason) = drive(&mut session(), &rx, &mut sink, &shutdown, None);
        handle.join().unwrap();

        assert_eq!(reason, StopReason::Shutdown);
        assert_eq!(stats.samples, 1);
        let starts = sink.0.iter().filter(|e| e.is_start()).count();
        let stops  = sink.0.iter().filter(|e| !e.is_start()).count();
        assert_eq!((starts, stops), (2, 2));
        assert_eq!(sink.0[2..].to_vec(), vec![
            NoteEvent::stop(Voice::Gyro, NoteSet::new(vec![36])),
            NoteEvent::stop(Voice::Accel, NoteSet::new(vec![31])),
        ]);
        drop(tx);
    }

    #[test]
    fn oversized_time_limit_means_no_deadline() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, Duration::MAX), None);
        assert_eq!(deadline_after(now, Duration::from_secs(3600)), Some(now + Duration::from_secs(3600)));
    }

    #[test]
    fn oversized_time_limit_still_runs_to_the_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("glove.json");
        let capture = dir.path().join("capture.txt");
        std::fs::write(&config_path, CONFIG).unwrap();
        std::fs::write(&capture, "1/-10/0/1\n").unwrap();

        let stats = run(AppConfig {
            config_path,
            input:    Input::Serial(capture),
            port:     None,
            duration: Some(Duration::MAX),
            dry_run:  true,
        }).unwrap();
        assert_eq!(stats, SessionStats { samples: 1, events: 2 });
    }

    #[test]
    fn dry_run_over_a_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("glove.json");
        let capture = dir.path().join("capture.txt");
        std::fs::write(&config_path, CONFIG).unwrap();
        std::fs::write(&capture, "1/-10/0/0\n2/-10/0/1\n3/45/0/1\nbad line\n4/45/0/0\n").unwrap();

        let stats = run(AppConfig {
            config_path,
            input:    Input::Serial(capture),
            port:     None,
            duration: Some(Duration::from_secs(10)),
            dry_run:  true,
        }).unwrap();

        // start C3; stop C3, start E3; stop E3
        assert_eq!(stats, SessionStats { samples: 4, events: 4 });
    }

    #[test]
    fn missing_device_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("glove.json");
        std::fs::write(&config_path, CONFIG).unwrap();

        let err = run(AppConfig {
            config_path,
            input:    Input::Serial(dir.path().join("ttyNOPE")),
            port:     None,
            duration: None,
            dry_run:  true,
        }).unwrap_err();
        assert!(matches!(err, AppError::Device { .. }));
    }

    #[test]
    fn bad_config_is_reported_before_opening_anything() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("glove.json");
        std::fs::write(&config_path, r#"{"angle_notes_list": []}"#).unwrap();

        let err = run(AppConfig {
            config_path,
            input:    Input::Serial(dir.path().join("ttyNOPE")),
            port:     None,
            duration: None,
            dry_run:  true,
        }).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
