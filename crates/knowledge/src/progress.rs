//! Structured progress reporting for batch jobs.
//!
//! The embedding job reports every chunk it finishes so a caller can render a
//! progress line without parsing logs.

use crate::types::ChunkId;
use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during a batch job.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the job: "fetch", "embed", "skip"
    pub phase: String,

    /// Chunks handled so far, successful or not
    pub current: u64,

    /// Total chunks in the run
    pub total: u64,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: f64,

    /// Chunk the event refers to, if any
    pub chunk_id: Option<ChunkId>,

    /// Human-readable message
    pub message: String,

    /// Elapsed time since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: u64,
        chunk_id: Option<ChunkId>,
        message: impl Into<String>,
    ) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            chunk_id,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let chunk = match self.chunk_id {
            Some(id) => format!(" chunk {}", id),
            None => String::new(),
        };

        format!(
            "[{}] {}/{} ({:.0}%){} - {}",
            self.phase, self.current, self.total, self.percentage, chunk, self.message
        )
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let event = event.with_elapsed(elapsed);

            tracing::debug!(
                phase = %event.phase,
                current = event.current,
                total = event.total,
                chunk_id = ?event.chunk_id,
                message = %event.message,
                elapsed_secs = elapsed,
                "Progress event"
            );

            callback(event);
        }
    }

    /// A batch of chunk records is about to be fetched.
    pub fn fetch(&self, current: u64, total: u64, batch_len: usize) {
        self.emit(ProgressEvent::new(
            "fetch",
            current,
            total,
            None,
            format!("fetching {} chunks", batch_len),
        ));
    }

    /// A chunk was embedded and stored.
    pub fn embed(&self, current: u64, total: u64, chunk_id: ChunkId, model: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            current,
            total,
            Some(chunk_id),
            format!("model={}", model),
        ));
    }

    /// A chunk failed and was skipped.
    pub fn skip(&self, current: u64, total: u64, chunk_id: ChunkId, reason: &str) {
        self.emit(ProgressEvent::new(
            "skip",
            current,
            total,
            Some(chunk_id),
            reason,
        ));
    }
}
