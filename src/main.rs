//! tapkit – Pointer gesture classification for touch input streams.
//!
//! CLI entry point: replay a recorded pointer trace through the classifier
//! and print the gestures it fires.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::SystemTime;

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};

use tapkit::config::{ClassifierConfig, ProfileConfig, TapkitError, parse_config_file};
use tapkit::replay::{parse_trace, replay};

#[derive(Parser)]
#[command(name = "tapkit", about = "Replay pointer traces through the gesture classifier")]
struct Cli {
    /// Path to a pointer trace file
    trace: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Threshold profile to use
    #[arg(short, long, default_value = "default")]
    profile: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Simple logger that writes to stderr and optionally to a log file.
struct TapkitLogger {
    level: LevelFilter,
    file: Option<Mutex<std::fs::File>>,
}

impl Log for TapkitLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("tapkit")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let line = format!("[{secs} {level} tapkit] {}\n", record.args());

        eprint!("{line}");

        if let Some(ref file_mutex) = self.file {
            if let Ok(mut f) = file_mutex.lock() {
                let _ = f.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Some(ref file_mutex) = self.file {
            if let Ok(mut f) = file_mutex.lock() {
                let _ = f.flush();
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Resolve the profile first (before logger init) so we can read the
    // configured log level.
    let mut config_log_level: Option<String> = None;
    let mut config_log_file: Option<String> = None;

    let profile: ProfileConfig = match &cli.config {
        Some(config_path) => match parse_config_file(config_path) {
            Ok(app_config) => match app_config.profile(&cli.profile) {
                Ok(profile) => {
                    config_log_level = Some(app_config.log_level.clone());
                    config_log_file = app_config.log_file.clone();
                    profile.clone()
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            if cli.profile != "default" {
                eprintln!(
                    "Error: profile '{}' requested but no config file given (see --config)",
                    cli.profile
                );
                return ExitCode::FAILURE;
            }
            ProfileConfig::standard()
        }
    };

    // Initialize logging: CLI --verbose overrides the config file setting.
    let log_level: LevelFilter = if cli.verbose {
        LevelFilter::Debug
    } else {
        config_log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(LevelFilter::Info)
    };

    let log_file = config_log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(Mutex::new(file)),
            Err(e) => {
                eprintln!("Warning: cannot open log file '{path}': {e}");
                None
            }
        }
    });

    let logger = TapkitLogger {
        level: log_level,
        file: log_file,
    };
    log::set_boxed_logger(Box::new(logger)).expect("Failed to set logger");
    log::set_max_level(log_level);

    log::info!("Loading trace from: {}", cli.trace.display());

    let trace_text = match fs::read_to_string(&cli.trace) {
        Ok(text) => text,
        Err(e) => {
            let err = TapkitError::TraceReadError {
                path: cli.trace.clone(),
                source: e,
            };
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let trace = match parse_trace(&trace_text) {
        Ok(trace) => trace,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let gestures = replay(&trace, &ClassifierConfig::from(&profile));
    for line in &gestures {
        println!("{line}");
    }
    log::info!(
        "{} sample(s) in, {} gesture callback(s) out",
        trace.len(),
        gestures.len()
    );

    ExitCode::SUCCESS
}
