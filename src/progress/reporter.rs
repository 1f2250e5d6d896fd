//! Line formatting and fan-out.

use super::sink::LogSink;
use crate::download::{ProgressEvent, ProgressStatus};

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Formats progress events and publishes them to registered sinks.
#[derive(Default)]
pub struct Reporter {
    sinks: Mutex<Vec<Arc<dyn LogSink>>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("sinks", &self.sink_count())
            .finish()
    }
}

impl Reporter {
    /// Creates a reporter without any sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink, builder style.
    pub fn with_sink(self, sink: Arc<dyn LogSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Registers a sink. It receives every line published from now on.
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// Number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Formats `event` and appends the line to every sink.
    pub fn publish(&self, event: &ProgressEvent) {
        self.publish_line(&format_event(event));
    }

    /// Appends a preformatted line to every sink.
    ///
    /// The lock is held while sinks are written so that all of them see
    /// concurrent publishers in the same order.
    pub fn publish_line(&self, line: &str) {
        let sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter() {
            sink.append_line(line);
        }
    }
}

/// Formats one event as a report line.
pub fn format_event(event: &ProgressEvent) -> String {
    let name = display_name(&event.filename);
    match &event.status {
        ProgressStatus::Downloading => match event.percent() {
            Some(percent) => format!("Downloading \"{}\": {:.1}%", name, percent),
            None => format!("Downloading \"{}\": {} bytes", name, event.bytes_done),
        },
        ProgressStatus::Converting => format!("Converting \"{}\" ...", name),
        ProgressStatus::Error(detail) => format!("Error downloading \"{}\": {}", name, detail),
    }
}

/// File names are shown without their directory. URLs, which have no
/// usable final component once a query string is involved, are kept whole.
fn display_name(filename: &str) -> &str {
    if filename.contains("://") {
        return filename;
    }
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemorySink;

    fn event(status: ProgressStatus, done: u64, total: u64, filename: &str) -> ProgressEvent {
        ProgressEvent {
            job: 0,
            status,
            bytes_done: done,
            bytes_total: total,
            filename: filename.into(),
        }
    }

    #[test]
    fn test_downloading_line() {
        let line = format_event(&event(ProgressStatus::Downloading, 50, 200, "song.webm"));
        assert_eq!(line, "Downloading \"song.webm\": 25.0%");
    }

    #[test]
    fn test_percent_has_one_decimal() {
        let line = format_event(&event(ProgressStatus::Downloading, 1, 3, "a.webm"));
        assert_eq!(line, "Downloading \"a.webm\": 33.3%");
    }

    #[test]
    fn test_unknown_total_omits_percent() {
        let line = format_event(&event(ProgressStatus::Downloading, 512, 0, "a.webm"));
        assert_eq!(line, "Downloading \"a.webm\": 512 bytes");
        assert!(!line.contains('%'));
    }

    #[test]
    fn test_converting_line() {
        let line = format_event(&event(ProgressStatus::Converting, 10, 10, "/music/a.webm"));
        assert_eq!(line, "Converting \"a.webm\" ...");
    }

    #[test]
    fn test_error_line_keeps_url() {
        let line = format_event(&event(
            ProgressStatus::Error("Unsupported URL".into()),
            0,
            0,
            "https://example.com/watch?v=1",
        ));
        assert_eq!(
            line,
            "Error downloading \"https://example.com/watch?v=1\": Unsupported URL"
        );
    }

    #[test]
    fn test_publish_reaches_every_sink() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let reporter = Reporter::new()
            .with_sink(first.clone())
            .with_sink(second.clone());

        reporter.publish(&event(ProgressStatus::Converting, 0, 0, "a.webm"));
        reporter.publish_line("done");

        assert_eq!(reporter.sink_count(), 2);
        assert_eq!(first.lines(), ["Converting \"a.webm\" ...", "done"]);
        assert_eq!(first.lines(), second.lines());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(MemorySink::new());
        let forward = seen.clone();
        let reporter = Reporter::new().with_sink(Arc::new(move |line: &str| {
            forward.append_line(&line.to_uppercase())
        }));

        reporter.publish_line("hello");
        assert_eq!(seen.lines(), ["HELLO"]);
    }
}
