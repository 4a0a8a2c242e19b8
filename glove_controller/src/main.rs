//! glove — command line entry point.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glove_controller::app::{install_signal_handler, print_ports, run_until, AppConfig, Input, Shutdown};

/// Play a wearable motion glove through MIDI.
#[derive(Parser, Debug)]
#[command(name = "glove", version, about)]
struct Args {
    /// JSON configuration (breakpoints, accel notes, sensitivities, ...)
    #[arg(long, value_name = "PATH", required_unless_present = "list_ports")]
    config: Option<PathBuf>,

    /// Read serial frames from this device or capture file
    #[arg(long, value_name = "DEVICE", conflicts_with = "stdin")]
    serial: Option<PathBuf>,

    /// Read serial frames from standard input (the default)
    #[arg(long)]
    stdin: bool,

    /// MIDI output port name (substring, case-insensitive)
    #[arg(long, value_name = "NAME")]
    port: Option<String>,

    /// End the session after this many seconds
    #[arg(long, value_name = "N", value_parser = parse_seconds)]
    seconds: Option<Duration>,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Do not open a MIDI port; log every note event instead
    #[arg(long)]
    dry_run: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_seconds(text: &str) -> Result<Duration, String> {
    let secs: f64 = text.parse().map_err(|_| format!("{:?} is not a number", text))?;
    if secs <= 0.0 {
        return Err("must be positive".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_ports {
        if let Err(e) = print_ports(&mut io::stdout().lock()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // clap guarantees --config unless --list-ports.
    let Some(config_path) = args.config else {
        eprintln!("Error: --config is required");
        std::process::exit(2);
    };

    let input = match args.serial {
        Some(path) if !args.stdin => Input::Serial(path),
        _ => Input::Stdin,
    };
    let cfg = AppConfig {
        config_path,
        input,
        port:     args.port,
        duration: args.seconds,
        dry_run:  args.dry_run,
    };

    let shutdown = Shutdown::new();
    if let Err(e) = install_signal_handler(&shutdown) {
        log::warn!("{}; Ctrl-C will not flush held notes", e);
    }

    log::info!("glove {} starting", env!("CARGO_PKG_VERSION"));
    if let Err(e) = run_until(cfg, &shutdown) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
