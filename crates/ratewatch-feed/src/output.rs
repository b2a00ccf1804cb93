//! Output sinks for aggregated snapshot lines.

use parking_lot::Mutex;

/// Sink accepting one formatted line per aggregation cycle.
pub trait OutputSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Sink printing each line to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit(&self, line: &str) {
        println!("{line}");
    }
}

/// Sink capturing lines in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
