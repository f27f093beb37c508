#![deny(missing_docs)]
//! Shared logging utilities for the jobdash workspace.
//!
//! Every crate logs through the `jobdash_*` macros so the backend (set up by
//! the binary) can be swapped without touching call sites.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! jobdash_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! jobdash_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! jobdash_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! jobdash_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! jobdash_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Redacts a bearer token for log output, keeping only its length.
pub fn redact_token(token: &str) -> String {
    format!("<redacted:{}>", token.len())
}

/// Times one remote call and logs how it ended.
///
/// The label is what gets logged, so it must never contain request bodies
/// or credentials; `"METHOD /path"` is the usual shape.
#[must_use = "a timer only logs when finished"]
pub struct Elapsed {
    label: String,
    started: std::time::Instant,
}

impl Elapsed {
    /// Starts timing `label`.
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: std::time::Instant::now(),
        }
    }

    /// The label this timer was started with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Logs `label outcome in N ms` at debug level and returns the duration.
    pub fn finish(self, outcome: &str) -> std::time::Duration {
        let elapsed = self.started.elapsed();
        log::debug!("{} {} in {} ms", self.label, outcome, elapsed.as_millis());
        elapsed
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
