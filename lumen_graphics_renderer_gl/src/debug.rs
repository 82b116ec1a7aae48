/// KHR_debug message callback - driver messages with colored output
///
/// Installs a `glDebugMessageCallback` handler that filters by severity and
/// category, prints colored messages with repeat counts to the console
/// and/or a log file, and optionally panics or aborts on errors.

use colored::*;
use lumen_graphics::lumen::{DebugConfig, DebugMessageFilter, DebugOutput, DebugSeverity, ValidationStats};
use rustc_hash::FxHashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Global debug configuration (shared across callbacks)
static DEBUG_CONFIG: Mutex<Option<Config>> = Mutex::new(None);

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Debug, Clone)]
pub struct Config {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    pub break_on_error: bool,
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl From<&DebugConfig> for Config {
    fn from(config: &DebugConfig) -> Self {
        Self {
            severity: config.severity,
            output: config.output.clone(),
            message_filter: config.message_filter,
            break_on_error: config.break_on_error,
            panic_on_error: config.panic_on_error,
            enable_stats: config.enable_stats,
        }
    }
}

/// Message severity as reported by `GL_DEBUG_SEVERITY_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Error,
    Warning,
    Info,
    Verbose,
}

impl MessageSeverity {
    pub fn from_gl(severity: u32) -> Self {
        match severity {
            glow::DEBUG_SEVERITY_HIGH => MessageSeverity::Error,
            glow::DEBUG_SEVERITY_MEDIUM => MessageSeverity::Warning,
            glow::DEBUG_SEVERITY_LOW => MessageSeverity::Info,
            _ => MessageSeverity::Verbose,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MessageSeverity::Error => "ERROR",
            MessageSeverity::Warning => "WARNING",
            MessageSeverity::Info => "INFO",
            MessageSeverity::Verbose => "VERBOSE",
        }
    }

    fn colored_label(self) -> ColoredString {
        match self {
            MessageSeverity::Error => self.label().red().bold(),
            MessageSeverity::Warning => self.label().yellow().bold(),
            MessageSeverity::Info => self.label().cyan(),
            MessageSeverity::Verbose => self.label().bright_black(),
        }
    }
}

/// Message category derived from `GL_DEBUG_TYPE_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    General,
    Validation,
    Performance,
}

impl MessageCategory {
    pub fn from_gl(message_type: u32) -> Self {
        match message_type {
            glow::DEBUG_TYPE_ERROR
            | glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR
            | glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR
            | glow::DEBUG_TYPE_PORTABILITY => MessageCategory::Validation,
            glow::DEBUG_TYPE_PERFORMANCE => MessageCategory::Performance,
            _ => MessageCategory::General,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MessageCategory::General => "General",
            MessageCategory::Validation => "Validation",
            MessageCategory::Performance => "Performance",
        }
    }
}

fn source_label(source: u32) -> &'static str {
    match source {
        glow::DEBUG_SOURCE_API => "API",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "Window System",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        glow::DEBUG_SOURCE_THIRD_PARTY => "Third Party",
        glow::DEBUG_SOURCE_APPLICATION => "Application",
        _ => "Other",
    }
}

/// Whether a message passes the configured severity and category filters
pub fn should_display(config: &Config, severity: MessageSeverity, category: MessageCategory) -> bool {
    let severity_ok = match config.severity {
        DebugSeverity::ErrorsOnly => severity == MessageSeverity::Error,
        DebugSeverity::ErrorsAndWarnings => {
            matches!(severity, MessageSeverity::Error | MessageSeverity::Warning)
        }
        DebugSeverity::All => true,
    };

    severity_ok
        && match category {
            MessageCategory::Validation => config.message_filter.show_validation,
            MessageCategory::Performance => config.message_filter.show_performance,
            MessageCategory::General => config.message_filter.show_general,
        }
}

/// Thread-safe validation statistics tracker
struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn increment(&self, severity: MessageSeverity) {
        let counter = match severity {
            MessageSeverity::Error => &self.errors,
            MessageSeverity::Warning => &self.warnings,
            MessageSeverity::Info => &self.info,
            MessageSeverity::Verbose => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Message tracker for grouping identical messages
#[derive(Default)]
struct MessageTracker {
    messages: FxHashMap<String, u32>,
}

impl MessageTracker {
    fn track_message(&mut self, message: &str) -> u32 {
        let count = self.messages.entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// Initialize debug configuration
pub fn init_debug_config(config: Config) {
    // Reset statistics when initializing
    VALIDATION_STATS.reset();

    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker::default());
    }
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = Some(config);
    }
}

/// Stop reporting messages (the context is going away)
pub fn cleanup_debug_config() {
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = None;
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "✓ No driver debug messages".green().bold());
        return;
    }

    println!("\n{}", "=== Driver Debug Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(tracker) = MESSAGE_TRACKER.lock() {
        if let Some(tracker) = tracker.as_ref() {
            let duplicate_count = tracker.messages.values().filter(|&&count| count > 1).count();
            if duplicate_count > 0 {
                println!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), duplicate_count);
            }
        }
    }

    println!("{}\n", "======================================".bright_blue().bold());
}

/// Uncolored report line, as written to the log file
pub fn format_file_message(
    severity: MessageSeverity,
    category: MessageCategory,
    source: u32,
    id: u32,
    occurrences: u32,
    message: &str,
) -> String {
    format!(
        "[GL {}] [{}]{}\n  ├─ Source: {} (id {})\n  └─ {}\n",
        severity.label(),
        category.label(),
        repeat_indicator(occurrences),
        source_label(source),
        id,
        message
    )
}

fn repeat_indicator(occurrences: u32) -> String {
    if occurrences > 1 {
        format!(" [×{}]", occurrences)
    } else {
        String::new()
    }
}

/// KHR_debug message handler
///
/// Receives (source, type, id, severity, message) from the driver.
pub fn gl_debug_callback(source: u32, message_type: u32, id: u32, severity: u32, message: &str) {
    let config = match DEBUG_CONFIG.lock() {
        Ok(guard) => match guard.as_ref() {
            Some(config) => config.clone(),
            None => return,
        },
        Err(_) => return,
    };

    let severity = MessageSeverity::from_gl(severity);
    let category = MessageCategory::from_gl(message_type);

    if !should_display(&config, severity, category) {
        return;
    }

    let occurrences = if config.enable_stats {
        VALIDATION_STATS.increment(severity);
        match MESSAGE_TRACKER.lock() {
            Ok(mut tracker) => tracker.get_or_insert_with(MessageTracker::default).track_message(message),
            Err(_) => 1,
        }
    } else {
        1
    };

    let console_output = format!(
        "{} {} [{}]{}\n  ├─ {}: {} (id {})\n  └─ {}\n",
        "[GL".bright_blue().bold(),
        format!("{}]", severity.colored_label()).bright_blue().bold(),
        category.label().bright_black(),
        repeat_indicator(occurrences).yellow(),
        "Source".bright_black(),
        source_label(source).white(),
        id,
        message.white()
    );
    let file_output = format_file_message(severity, category, source, id, occurrences, message);

    match &config.output {
        DebugOutput::Console => eprint!("{}", console_output),
        DebugOutput::File(path) => write_to_file(path, &file_output),
        DebugOutput::Both(path) => {
            eprint!("{}", console_output);
            write_to_file(path, &file_output);
        }
    }

    if severity != MessageSeverity::Error {
        return;
    }

    // Panic on any error if strict mode enabled
    if config.panic_on_error {
        panic!(
            "\n⚠️  PANIC ON ERROR (Strict Mode)\n\
            Source: {}\n\
            Type: {}\n\
            Message: {}\n",
            source_label(source), category.label(), message
        );
    }

    // Break on error if configured (for debugger attachment)
    if config.break_on_error {
        eprintln!(
            "\n{}\n  Context: {} [{}]\n  Message: {}\n",
            "⚠️  BREAK ON DRIVER ERROR - Aborting execution".red().bold(),
            source_label(source).yellow(),
            category.label().cyan(),
            message.white()
        );
        std::process::abort();
    }
}

/// Write message to log file
fn write_to_file(path: &str, message: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", message);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
