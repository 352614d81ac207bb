//! Logging integration tests - exercise the public logging surface the way
//! an embedding application uses it.

use particle_view_engine::log::{set_logger, DefaultLogger, LogEntry, LogSeverity, Logger};
use particle_view_engine::{engine_info, engine_warn};
use serial_test::serial;
use std::sync::{Arc, Mutex};

struct VecLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, String)>>>,
}

impl Logger for VecLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((
            entry.severity,
            entry.source.clone(),
            entry.message.clone(),
        ));
    }
}

#[test]
#[serial]
fn test_custom_logger_receives_macro_output() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(Box::new(VecLogger {
        entries: entries.clone(),
    }));

    engine_info!("app::frontend", "simulation started with {} particles", 4096);
    engine_warn!("app::frontend", "frame budget exceeded");

    let captured = entries.lock().unwrap();
    let mine: Vec<_> = captured.iter().filter(|e| e.1 == "app::frontend").collect();
    assert_eq!(mine.len(), 2);
    assert_eq!(
        *mine[0],
        (
            LogSeverity::Info,
            "app::frontend".to_string(),
            "simulation started with 4096 particles".to_string()
        )
    );
    assert_eq!(mine[1].0, LogSeverity::Warn);
    drop(captured);

    set_logger(Box::new(DefaultLogger));
}

#[test]
#[serial]
fn test_default_logger_does_not_panic() {
    set_logger(Box::new(DefaultLogger));
    engine_info!("app::frontend", "plain console output");
}
