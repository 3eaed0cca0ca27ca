//! Run log mirrored into a buffer
//!
//! Operator-facing milestones are logged through `tracing` and kept in a
//! buffer with elapsed-seconds prefixes; the buffer travels with the final
//! result so a run is explainable after the fact.

use std::time::Instant;

use parking_lot::Mutex;
use tracing::info;

/// Timestamped, in-memory run log
#[derive(Debug)]
pub struct RunLog {
    started: Instant,
    lines: Mutex<Vec<String>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Record a milestone
    pub fn note(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let elapsed = self.started.elapsed().as_secs_f64();
        info!("{message}");
        self.lines.lock().push(format!("[{elapsed:9.5}] {message}"));
    }

    /// All recorded lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_elapsed_prefixes_in_order() {
        let log = RunLog::new();
        log.note("# initialize");
        log.note("# benchmark");

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("# initialize"));
        assert!(lines[1].contains("# benchmark"));
        assert!(lines[0].starts_with('['));
    }
}
