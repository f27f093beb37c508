//! Logging setup for the jobdash binary.
//!
//! Command output goes to stdout, so terminal logging is kept on stderr.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const DEFAULT_LOG_FILE: &str = "./jobdash.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogDestination {
    /// Write to the log file only.
    File,
    /// Write to stderr only.
    Terminal,
    /// Write to both.
    Both,
}

impl LogDestination {
    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }

    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }
}

/// Resolved logging options for one invocation.
#[derive(Debug, Clone)]
pub struct LogSetup {
    pub destination: LogDestination,
    pub level: LevelFilter,
    pub file: PathBuf,
}

impl LogSetup {
    pub fn new(destination: LogDestination, verbose: bool, file: Option<PathBuf>) -> Self {
        Self {
            destination,
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
            file: file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    /// Builds the loggers this setup asks for. A log file that cannot be
    /// created is reported on stderr and skipped.
    fn loggers(&self) -> Vec<Box<dyn SharedLogger>> {
        let config = build_config();
        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
        if self.destination.to_terminal() {
            loggers.push(TermLogger::new(
                self.level,
                config.clone(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
        }
        if self.destination.to_file() {
            if let Some(file_logger) = create_file_logger(&self.file, self.level, config) {
                loggers.push(file_logger);
            }
        }
        loggers
    }

    pub fn initialize(&self) {
        let loggers = self.loggers();
        if loggers.is_empty() {
            return;
        }
        let _ = CombinedLogger::init(loggers);
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
