//! Progress observers: consumers of the run's event stream.
//!
//! Observers see events in execution order and cannot influence outcomes.
//! Write errors are swallowed; a broken terminal never fails a run.

use gatekeeper_core::{ProgressEvent, ProgressPhase};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Receives progress events while a run is underway.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that ignores every event.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

type BoxedWriter = Box<dyn Write + Send>;

struct ConsoleState<W> {
    writer: W,
    current_category: Option<String>,
}

/// Human-readable progress lines, with a header whenever the category changes.
pub struct ConsoleObserver<W: Write + Send = BoxedWriter> {
    state: Mutex<ConsoleState<W>>,
}

impl ConsoleObserver<BoxedWriter> {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Progress on stderr, leaving stdout to a machine-readable report.
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                writer,
                current_category: None,
            }),
        }
    }

    /// Consume the observer and return its writer.
    pub fn into_inner(self) -> W {
        match self.state.into_inner() {
            Ok(state) => state.writer,
            Err(poisoned) => poisoned.into_inner().writer,
        }
    }
}

/// Render one event as a console line.
pub fn render_event(event: &ProgressEvent) -> String {
    let timing = event
        .duration_ms
        .map(|ms| format!(" ({:.1}s)", ms as f64 / 1000.0))
        .unwrap_or_default();
    let detail = event.detail.as_deref().unwrap_or_default();

    match event.phase {
        ProgressPhase::Start => format!("  → Running {}...", event.check_name),
        ProgressPhase::Success => format!("  ✓ {}: PASSED{}", event.check_name, timing),
        ProgressPhase::Failure if detail.is_empty() => {
            format!("  ✗ {}: FAILED{}", event.check_name, timing)
        }
        ProgressPhase::Failure => format!("  ✗ {}: FAILED{}\n      {}", event.check_name, timing, detail),
        ProgressPhase::Timeout => format!("  ✗ {}: TIMEOUT{}", event.check_name, timing),
        ProgressPhase::Skip => format!("  - {}: skipped ({})", event.check_name, detail),
    }
}

impl<W: Write + Send> ProgressObserver for ConsoleObserver<W> {
    fn on_event(&self, event: &ProgressEvent) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        if state.current_category.as_deref() != Some(event.category.as_str()) {
            state.current_category = Some(event.category.clone());
            let _ = writeln!(state.writer, "\n[{}]", event.category);
        }
        let line = render_event(event);
        let _ = writeln!(state.writer, "{line}");
        let _ = state.writer.flush();
    }
}

/// One JSON object per line per event.
pub struct JsonLinesObserver<W: Write + Send = BoxedWriter> {
    writer: Mutex<W>,
}

impl JsonLinesObserver<BoxedWriter> {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl<W: Write + Send> JsonLinesObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressObserver for JsonLinesObserver<W> {
    fn on_event(&self, event: &ProgressEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "Failed to serialize progress event");
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Phases seen for one check, in order.
    pub fn phases_for(&self, check_name: &str) -> Vec<ProgressPhase> {
        self.events()
            .into_iter()
            .filter(|e| e.check_name == check_name)
            .map(|e| e.phase)
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Forwards each event to several observers, in order.
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProgressObserver for FanoutObserver {
    fn on_event(&self, event: &ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(seq: u64, phase: ProgressPhase, name: &str, category: &str) -> ProgressEvent {
        ProgressEvent::new(seq, phase, name, category)
    }

    #[test]
    fn test_render_event_lines() {
        let ok = event(2, ProgressPhase::Success, "Lint Check", "Code Quality").with_duration(1500);
        assert_eq!(render_event(&ok), "  ✓ Lint Check: PASSED (1.5s)");

        let skip = event(3, ProgressPhase::Skip, "Test Runner", "Testing").with_detail("no test declared");
        assert_eq!(render_event(&skip), "  - Test Runner: skipped (no test declared)");

        let timeout = event(4, ProgressPhase::Timeout, "Build Check", "Build").with_duration(3000);
        assert_eq!(render_event(&timeout), "  ✗ Build Check: TIMEOUT (3.0s)");
    }

    #[test]
    fn test_console_prints_category_header_once() {
        let observer = ConsoleObserver::new(Vec::new());
        observer.on_event(&event(1, ProgressPhase::Start, "Lint Check", "Code Quality"));
        observer.on_event(&event(2, ProgressPhase::Success, "Lint Check", "Code Quality"));
        observer.on_event(&event(3, ProgressPhase::Start, "TypeScript Check", "Code Quality"));
        observer.on_event(&event(4, ProgressPhase::Skip, "Build Check", "Build"));

        let out = String::from_utf8(observer.into_inner()).unwrap();
        assert_eq!(out.matches("[Code Quality]").count(), 1);
        assert_eq!(out.matches("[Build]").count(), 1);
        assert!(out.contains("→ Running TypeScript Check..."));
    }

    #[test]
    fn test_json_lines_one_object_per_event() {
        let observer = JsonLinesObserver::new(Vec::new());
        observer.on_event(&event(1, ProgressPhase::Start, "Lint Check", "Code Quality"));
        observer.on_event(&event(2, ProgressPhase::Failure, "Lint Check", "Code Quality").with_detail("boom"));

        let out = String::from_utf8(observer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["phase"], "start");
        assert_eq!(lines[1]["phase"], "failure");
        assert_eq!(lines[1]["detail"], "boom");
    }

    #[test]
    fn test_fanout_reaches_every_observer() {
        let a = Arc::new(RecordingObserver::new());
        let b = Arc::new(RecordingObserver::new());
        let fanout = FanoutObserver::new().with(a.clone()).with(b.clone());

        fanout.on_event(&event(1, ProgressPhase::Start, "Lint Check", "Code Quality"));
        fanout.on_event(&event(2, ProgressPhase::Success, "Lint Check", "Code Quality"));

        assert_eq!(a.events().len(), 2);
        assert_eq!(
            b.phases_for("Lint Check"),
            vec![ProgressPhase::Start, ProgressPhase::Success]
        );
    }
}
