//! Progress reporting for indexing runs.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted while indexing.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// "load", "chunk", "embed" or "index"
    pub phase: &'static str,

    pub current: u64,
    pub total: Option<u64>,
    pub message: String,
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    /// Percentage complete, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    fn emit(&self, phase: &'static str, current: u64, total: Option<u64>, message: String) {
        let event = ProgressEvent {
            phase,
            current,
            total,
            message,
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = event.elapsed_secs,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn load(&self, transcripts: u64, skipped: u64) {
        self.emit(
            "load",
            transcripts,
            None,
            format!("{} transcripts loaded, {} skipped", transcripts, skipped),
        );
    }

    pub fn episode(&self, current: u64, total: u64, source: &str) {
        self.emit("chunk", current, Some(total), format!("reading {}", source));
    }

    pub fn embed(&self, current: u64, total: u64, chunks: usize, model: &str) {
        self.emit(
            "embed",
            current,
            Some(total),
            format!("{} chunks, model={}", chunks, model),
        );
    }

    pub fn done(&self, episodes: u64, chunks: u64) {
        self.emit(
            "index",
            episodes,
            Some(episodes),
            format!("{} chunks written", chunks),
        );
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
