//! Logger setup for the wikidump binary.
//!
//! Three sinks share the `log` facade: the terminal (info and up), the
//! developer log `conversion_dev.log` (debug and up, every target) and the
//! event log `conversion_events.csv`, which only receives records on the
//! `engine_event!` target.

use std::fs::{File, OpenOptions};
use std::path::Path;

use engine_logging::EVENT_TARGET;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const DEV_LOG_FILE: &str = "conversion_dev.log";
pub const EVENT_LOG_FILE: &str = "conversion_events.csv";

pub fn initialize(logs_dir: &Path) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        terminal_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(file) = open_append(&logs_dir.join(DEV_LOG_FILE)) {
        loggers.push(WriteLogger::new(LevelFilter::Debug, dev_config(), file));
    }
    if let Some(file) = open_append(&logs_dir.join(EVENT_LOG_FILE)) {
        loggers.push(WriteLogger::new(LevelFilter::Info, event_config(), file));
    }

    let _ = CombinedLogger::init(loggers);
}

fn terminal_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .add_filter_ignore_str(EVENT_TARGET)
        .build()
}

fn dev_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build()
}

/// `<timestamp> <event>,<fields...>` with no level, thread or target columns.
fn event_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_max_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .add_filter_allow_str(EVENT_TARGET)
        .build()
}

fn open_append(path: &Path) -> Option<File> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {:?}: {}", path, err);
            None
        }
    }
}
