//! Logging initialisation.
//!
//! Called once at process start. Writes timestamped lines to a log file at the
//! requested level and mirrors warnings and errors to the terminal.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Logger already initialised: {0}")]
    AlreadyInitialised(#[from] log::SetLoggerError),
}

/// Install the file and terminal loggers.
///
/// The log file is appended to; its parent directory is created if needed.
pub fn init(log_file: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    let open_err = |source| LoggingError::Open {
        path: log_file.display().to_string(),
        source,
    };
    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(open_err)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(open_err)?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Warn,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, config, file),
    ])?;
    Ok(())
}
