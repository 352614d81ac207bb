use super::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Logger that captures entries for inspection
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(Box::new(CaptureLogger {
        entries: entries.clone(),
    }));
    entries
}

// Other tests in this binary log through the global logger concurrently, so
// assertions only look at entries from this file's unique source string.

#[test]
#[serial]
fn test_macros_route_through_global_logger() {
    let entries = install_capture();

    crate::engine_info!("particle_view::log_tests", "hello {}", 42);
    crate::engine_warn!("particle_view::log_tests", "watch out");

    let captured = entries.lock().unwrap();
    let mine: Vec<_> = captured
        .iter()
        .filter(|e| e.source == "particle_view::log_tests")
        .collect();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].severity, LogSeverity::Info);
    assert_eq!(mine[0].message, "hello 42");
    assert_eq!(mine[1].severity, LogSeverity::Warn);
    drop(captured);

    set_logger(Box::new(DefaultLogger));
}

#[test]
#[serial]
fn test_error_macro_carries_file_and_line() {
    let entries = install_capture();

    crate::engine_error!("particle_view::log_tests", "bad thing: {}", "details");

    let captured = entries.lock().unwrap();
    let mine: Vec<_> = captured
        .iter()
        .filter(|e| e.source == "particle_view::log_tests")
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].severity, LogSeverity::Error);
    assert!(mine[0].file.is_some());
    assert!(mine[0].line.is_some());
    assert_eq!(mine[0].message, "bad thing: details");
    drop(captured);

    set_logger(Box::new(DefaultLogger));
}

#[test]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}
