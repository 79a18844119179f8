//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger, and the
//! global sink plumbing used by the render_* macros.

use crate::log::{log, log_detailed, reset_logger, set_logger, LogEntry, LogSeverity, Logger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_equality() {
    assert_eq!(LogSeverity::Info, LogSeverity::Info);
    assert_ne!(LogSeverity::Trace, LogSeverity::Error);
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_construction() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "nova::swapchain".to_string(),
        message: "resize ignored".to_string(),
        file: None,
        line: None,
    };

    assert_eq!(entry.severity, LogSeverity::Warn);
    assert_eq!(entry.source, "nova::swapchain");
    assert!(entry.file.is_none());
    assert!(entry.line.is_none());
}

#[test]
fn test_log_entry_clone() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "nova::vulkan".to_string(),
        message: "boom".to_string(),
        file: Some("vulkan_frame.rs"),
        line: Some(42),
    };
    let cloned = entry.clone();
    assert_eq!(cloned.message, "boom");
    assert_eq!(cloned.line, Some(42));
}

// ============================================================================
// GLOBAL SINK TESTS
// ============================================================================

/// Logger that captures entries into a shared vector
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
fn test_custom_logger_receives_entries() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    log(LogSeverity::Info, "nova::test", "hello".to_string());
    log_detailed(
        LogSeverity::Error,
        "nova::test",
        "bad".to_string(),
        "log_tests.rs",
        1,
    );
    crate::render_warn!("nova::test", "resize to {}x{} ignored", 0, 600);

    reset_logger();

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "hello");
    assert_eq!(captured[1].severity, LogSeverity::Error);
    assert_eq!(captured[1].file, Some("log_tests.rs"));
    assert_eq!(captured[2].severity, LogSeverity::Warn);
    assert_eq!(captured[2].message, "resize to 0x600 ignored");
}
