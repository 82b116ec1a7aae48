//! Internal logging system for the Lumen graphics core
//!
//! This module provides a small logging facility with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Process-wide logger swapped under a RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to route engine diagnostics elsewhere (file, in-game console, ...).
///
/// # Example
///
/// ```ignore
/// use lumen_graphics::lumen::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "lumen::RenderContext", "lumen::gl")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (with file:line details)
    Error,
}

/// Console logger used until `set_logger` installs another one
///
/// Lines read `[timestamp] [SEVERITY] [source] message`, with ` (file:line)`
/// appended when the call site is known. Warnings and errors go to stderr,
/// everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without colors (used for tests and file sinks)
    pub fn format_plain(entry: &LogEntry) -> String {
        render_line(entry, entry.severity.label().normal(), entry.source.normal())
    }
}

impl LogSeverity {
    /// Fixed-width label
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

fn render_line(entry: &LogEntry, severity: ColoredString, source: ColoredString) -> String {
    let stamp: DateTime<Local> = entry.timestamp.into();
    let mut line = format!(
        "[{}] [{}] [{}] {}",
        stamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        severity,
        source,
        entry.message
    );
    if let (Some(file), Some(at)) = (entry.file, entry.line) {
        line.push_str(&format!(" ({}:{})", file, at));
    }
    line
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = render_line(entry, entry.severity.colored_label(), entry.source.bright_blue());
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== GLOBAL LOGGER =====

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn global_logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Replace the active logger
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut guard) = global_logger().write() {
        *guard = Box::new(logger);
    }
}

/// Restore the default colored console logger
pub fn reset_logger() {
    set_logger(DefaultLogger);
}

/// Dispatch a message to the active logger
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: None,
        line: None,
    });
}

/// Dispatch a message with its call site
pub fn log_detailed(
    severity: LogSeverity,
    source: &str,
    message: String,
    file: &'static str,
    line: u32,
) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: Some(file),
        line: Some(line),
    });
}

fn dispatch(entry: LogEntry) {
    if let Ok(guard) = global_logger().read() {
        guard.log(&entry);
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```ignore
/// engine_trace!("lumen::RenderContext", "Entering function foo()");
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log(
            $crate::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```ignore
/// engine_error!("lumen::TargetCache", "Failed to bind: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build the matching `Error`
///
/// Without a variant the error is `Error::BackendError`; `@Variant` selects
/// another string-carrying variant.
///
/// ```ignore
/// let err = engine_err!("lumen::gl", "glGetString returned null");
/// let err = engine_err!(@Unsupported, "lumen::RenderContext", "min/max blending");
/// ```
#[macro_export]
macro_rules! engine_err {
    (@ $variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::error::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_err!(@BackendError, $source, $($arg)*)
    };
}

/// Log a WARN and build the matching `Error`
#[macro_export]
macro_rules! engine_warn_err {
    (@ $variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log(
            $crate::log::LogSeverity::Warn,
            $source,
            message.clone()
        );
        $crate::error::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_warn_err!(@BackendError, $source, $($arg)*)
    };
}

/// Log an ERROR and return early with the matching `Error`
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

/// Log a WARN and return early with the matching `Error`
#[macro_export]
macro_rules! engine_bail_warn {
    ($($arg:tt)*) => {
        return Err($crate::engine_warn_err!($($arg)*))
    };
}

// ===== TEST SUPPORT =====

#[cfg(test)]
pub(crate) const CAPTURE_SOURCE: &str = "lumen::test";

/// Logger that keeps entries logged under `CAPTURE_SOURCE` in memory
///
/// Other tests log concurrently through the global logger; their entries are dropped.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CaptureLogger {
    pub entries: std::sync::Arc<std::sync::Mutex<Vec<LogEntry>>>,
}

#[cfg(test)]
impl CaptureLogger {
    pub fn messages(&self, severity: LogSeverity) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }
}

#[cfg(test)]
impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source != CAPTURE_SOURCE {
            return;
        }
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
