//! Logging infrastructure for the selection engine
//!
//! The engine itself only emits `debug` records through the `log` facade;
//! with no logger installed they cost nothing and change nothing. Hosts that
//! want to see them call [`init`] once with a [`LogConfig`].
//!
//! - Human-readable or JSON-lines output
//! - Optional timestamps and source locations
//! - Output identifiers are truncated before being logged
//!
//! # Usage
//!
//! ```
//! use coinsel_core::logging::{self, LogConfig, LogLevel};
//! use serde_json::json;
//!
//! logging::init(&LogConfig::default()).expect("Failed to initialize logging");
//!
//! logging::log_selection(
//!     LogLevel::Debug,
//!     "selection_started",
//!     Some(json!({ "target": 100_000 })),
//! );
//! ```

use chrono::Local;
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write as IoWrite;
use std::sync::Once;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Error conditions
    Error,
    /// Warning conditions
    Warn,
    /// Informational messages
    Info,
    /// Debug-level messages
    Debug,
    /// Trace level (very verbose)
    Trace,
}

/// Log context categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogContext {
    /// Coin selection decisions
    Selection,
    /// Configuration loading
    Config,
}

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level
    pub level: LogLevel,
    /// Path to log file (None for console-only)
    pub log_file: Option<String>,
    /// Whether to include timestamps in log messages
    pub include_timestamps: bool,
    /// Whether to include source location in log messages
    pub include_source_location: bool,
    /// Whether to log to console
    pub console_logging: bool,
    /// Whether to use JSON format for logs (machine-readable)
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_file: None,
            include_timestamps: true,
            include_source_location: true,
            console_logging: true,
            json_format: false,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

// Ensure logging is only initialized once
static LOGGING_INIT: Once = Once::new();

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call installs a logger. An
/// error is returned only when the first call cannot open its log file.
pub fn init(config: &LogConfig) -> Result<(), String> {
    let mut result = Ok(());

    let include_timestamps = config.include_timestamps;
    let include_source_location = config.include_source_location;
    let json_format = config.json_format;
    let log_file = config.log_file.clone();
    let console_logging = config.console_logging;
    let level = config.level;

    LOGGING_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.filter_level(if console_logging || log_file.is_some() {
            level.into()
        } else {
            LevelFilter::Off
        });

        builder.format(move |buf, record| {
            let timestamp = if include_timestamps {
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            } else {
                String::new()
            };

            let source_location = if include_source_location {
                format!(
                    " [{}:{}]",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0)
                )
            } else {
                String::new()
            };

            if json_format {
                let line = json!({
                    "timestamp": timestamp,
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "location": source_location.trim(),
                    "message": record.args().to_string(),
                });

                writeln!(buf, "{}", line)
            } else {
                if include_timestamps {
                    write!(buf, "{} ", timestamp)?;
                }

                writeln!(
                    buf,
                    "[{}{}] {}",
                    record.level(),
                    source_location,
                    record.args()
                )
            }
        });

        if let Some(file_path) = &log_file {
            match OpenOptions::new().create(true).append(true).open(file_path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => {
                    result = Err(format!("Failed to open log file {}: {}", file_path, e));
                    return;
                }
            }
        }

        // Another logger may already be installed by the host
        if let Err(e) = builder.try_init() {
            debug!("Logger already initialized: {}", e);
        }
    });

    result
}

/// Update the log level dynamically
pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.into());
}

/// Truncate an identifier for logging
///
/// Keeps the first and last four characters of anything longer than eight.
pub fn sanitize_for_logging(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "*****".to_string();
    }

    let first: String = chars[..4].iter().collect();
    let last: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", first, last)
}

/// Render a structured log line for `context`
pub fn format_event(
    context: LogContext,
    message: &str,
    params: Option<&serde_json::Value>,
) -> String {
    match params {
        Some(params) => format!("[{:?}] {} {}", context, message, params),
        None => format!("[{:?}] {}", context, message),
    }
}

/// Whether records at `level` would reach the installed logger
///
/// Callers check this before building event params.
pub fn enabled(level: LogLevel) -> bool {
    log::log_enabled!(log::Level::from(level))
}

fn log_event(
    level: LogLevel,
    context: LogContext,
    message: &str,
    params: Option<serde_json::Value>,
) {
    if !enabled(level) {
        return;
    }

    let level: log::Level = level.into();
    log::log!(level, "{}", format_event(context, message, params.as_ref()));
}

/// Log a coin selection event
pub fn log_selection(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_event(level, LogContext::Selection, message, params);
}

/// Log a configuration event
pub fn log_config(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_event(level, LogContext::Config, message, params);
}
