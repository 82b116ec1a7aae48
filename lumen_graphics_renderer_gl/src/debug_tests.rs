//! Unit tests for the KHR_debug message handler
//!
//! The handler is driven directly with GL constants; no context required.
//! Tests touching the global configuration run serially.

use super::*;
use serial_test::serial;

fn config(severity: DebugSeverity) -> Config {
    Config {
        severity,
        output: DebugOutput::Console,
        message_filter: DebugMessageFilter::default(),
        break_on_error: false,
        panic_on_error: false,
        enable_stats: true,
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_severity_from_gl() {
    assert_eq!(MessageSeverity::from_gl(glow::DEBUG_SEVERITY_HIGH), MessageSeverity::Error);
    assert_eq!(MessageSeverity::from_gl(glow::DEBUG_SEVERITY_MEDIUM), MessageSeverity::Warning);
    assert_eq!(MessageSeverity::from_gl(glow::DEBUG_SEVERITY_LOW), MessageSeverity::Info);
    assert_eq!(MessageSeverity::from_gl(glow::DEBUG_SEVERITY_NOTIFICATION), MessageSeverity::Verbose);
}

#[test]
fn test_category_from_gl() {
    assert_eq!(MessageCategory::from_gl(glow::DEBUG_TYPE_ERROR), MessageCategory::Validation);
    assert_eq!(MessageCategory::from_gl(glow::DEBUG_TYPE_PORTABILITY), MessageCategory::Validation);
    assert_eq!(MessageCategory::from_gl(glow::DEBUG_TYPE_PERFORMANCE), MessageCategory::Performance);
    assert_eq!(MessageCategory::from_gl(glow::DEBUG_TYPE_MARKER), MessageCategory::General);
}

// ============================================================================
// FILTERING
// ============================================================================

#[test]
fn test_errors_only_filter() {
    let config = config(DebugSeverity::ErrorsOnly);
    assert!(should_display(&config, MessageSeverity::Error, MessageCategory::Validation));
    assert!(!should_display(&config, MessageSeverity::Warning, MessageCategory::Validation));
}

#[test]
fn test_errors_and_warnings_filter() {
    let config = config(DebugSeverity::ErrorsAndWarnings);
    assert!(should_display(&config, MessageSeverity::Warning, MessageCategory::General));
    assert!(!should_display(&config, MessageSeverity::Info, MessageCategory::General));
}

#[test]
fn test_performance_hidden_by_default_filter() {
    let config = config(DebugSeverity::All);
    assert!(!should_display(&config, MessageSeverity::Warning, MessageCategory::Performance));
    assert!(should_display(&config, MessageSeverity::Verbose, MessageCategory::General));
}

// ============================================================================
// FORMATTING
// ============================================================================

#[test]
fn test_file_message_format() {
    let text = format_file_message(
        MessageSeverity::Error,
        MessageCategory::Validation,
        glow::DEBUG_SOURCE_API,
        1282,
        1,
        "GL_INVALID_OPERATION in glDrawElements",
    );
    assert_eq!(
        text,
        "[GL ERROR] [Validation]\n  ├─ Source: API (id 1282)\n  └─ GL_INVALID_OPERATION in glDrawElements\n"
    );
}

#[test]
fn test_file_message_repeat_indicator() {
    let text = format_file_message(
        MessageSeverity::Warning,
        MessageCategory::General,
        glow::DEBUG_SOURCE_SHADER_COMPILER,
        7,
        3,
        "implicit cast",
    );
    assert!(text.starts_with("[GL WARNING] [General] [×3]\n"));
    assert!(text.contains("Source: Shader Compiler (id 7)"));
}

// ============================================================================
// CALLBACK + STATISTICS
// ============================================================================

#[test]
#[serial]
fn test_callback_counts_displayed_messages() {
    init_debug_config(config(DebugSeverity::ErrorsAndWarnings));

    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_ERROR, 1, glow::DEBUG_SEVERITY_HIGH, "bad enum");
    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_OTHER, 2, glow::DEBUG_SEVERITY_MEDIUM, "slow path");
    // Filtered out by severity
    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_OTHER, 3, glow::DEBUG_SEVERITY_NOTIFICATION, "buffer info");

    let stats = get_validation_stats();
    assert_eq!(stats, ValidationStats { errors: 1, warnings: 1, info: 0, verbose: 0 });

    cleanup_debug_config();
}

#[test]
#[serial]
fn test_callback_ignored_without_config() {
    init_debug_config(config(DebugSeverity::All));
    cleanup_debug_config();

    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_ERROR, 1, glow::DEBUG_SEVERITY_HIGH, "late message");

    assert_eq!(get_validation_stats().total(), 0);
}

#[test]
#[serial]
fn test_init_resets_statistics() {
    init_debug_config(config(DebugSeverity::All));
    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_OTHER, 1, glow::DEBUG_SEVERITY_LOW, "info");
    assert_eq!(get_validation_stats().info, 1);

    init_debug_config(config(DebugSeverity::All));
    assert_eq!(get_validation_stats().total(), 0);

    cleanup_debug_config();
}

#[test]
#[serial]
fn test_callback_writes_file_output() {
    let path = std::env::temp_dir().join(format!("lumen_gl_debug_{}.log", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let mut cfg = config(DebugSeverity::All);
    cfg.output = DebugOutput::File(path.to_string_lossy().into_owned());
    init_debug_config(cfg);

    gl_debug_callback(glow::DEBUG_SOURCE_APPLICATION, glow::DEBUG_TYPE_OTHER, 9, glow::DEBUG_SEVERITY_LOW, "marker");
    gl_debug_callback(glow::DEBUG_SOURCE_APPLICATION, glow::DEBUG_TYPE_OTHER, 9, glow::DEBUG_SEVERITY_LOW, "marker");

    cleanup_debug_config();
    let contents = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert!(contents.contains("[GL INFO] [General]\n"));
    assert!(contents.contains("[GL INFO] [General] [×2]\n"));
}

#[test]
#[serial]
#[should_panic(expected = "PANIC ON ERROR")]
fn test_panic_on_error() {
    let mut cfg = config(DebugSeverity::All);
    cfg.panic_on_error = true;
    init_debug_config(cfg);

    gl_debug_callback(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_ERROR, 1, glow::DEBUG_SEVERITY_HIGH, "fatal");
}

#[test]
fn test_config_from_debug_config() {
    let debug = DebugConfig {
        enabled: true,
        severity: DebugSeverity::All,
        panic_on_error: true,
        ..DebugConfig::default()
    };
    let config = Config::from(&debug);
    assert_eq!(config.severity, DebugSeverity::All);
    assert!(config.panic_on_error);
    assert!(config.enable_stats);
}
