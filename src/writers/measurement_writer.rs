use crate::error::{GeneratorError, Result};
use crate::pipeline::buffer_pool::BufferPool;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::queue::QueueReader;
use crate::utils::constants::PROGRESS_STEPS;
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterReport {
    pub lines: u64,
    pub bytes: u64,
    pub buffers: u64,
}

/// The single consumer: drains the queue into the sink in arrival order and
/// recycles every buffer it finishes with.
pub struct MeasurementWriter<'a, W: Write> {
    sink: W,
    pool: &'a BufferPool,
    expected_lines: u64,
    progress: Option<&'a ProgressReporter>,
    cancel: Option<CancellationToken>,
}

impl<'a, W: Write> MeasurementWriter<'a, W> {
    pub fn new(sink: W, pool: &'a BufferPool, expected_lines: u64) -> Self {
        Self {
            sink,
            pool,
            expected_lines,
            progress: None,
            cancel: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Write until the queue is closed and empty, then flush and hand back
    /// the sink.
    ///
    /// Returning for any reason drops `reader`, which releases producers
    /// blocked on a full queue.
    pub fn run(mut self, reader: QueueReader) -> Result<(W, WriterReport)> {
        let _span = tracing::debug_span!("writer").entered();
        let mut report = WriterReport::default();
        let step = (self.expected_lines / PROGRESS_STEPS).max(1);
        let mut next_milestone = step;

        while let Some(item) = reader.recv() {
            if self.is_cancelled() {
                tracing::debug!("Cancelled with {} items still queued", reader.len());
                return Err(GeneratorError::Cancelled);
            }

            self.sink.write_all(item.as_bytes())?;
            report.lines += item.lines;
            report.bytes += item.valid_len() as u64;
            report.buffers += 1;

            if let Some(progress) = self.progress {
                progress.increment(item.lines);
            }
            self.pool.release(item.into_buffer());

            while report.lines >= next_milestone && next_milestone <= self.expected_lines {
                tracing::info!(
                    "{}% written ({} of {} lines)",
                    next_milestone * 100 / self.expected_lines.max(1),
                    report.lines,
                    self.expected_lines
                );
                next_milestone += step;
            }
        }

        self.sink.flush()?;
        tracing::debug!(
            "Drained {} buffers, {} lines, {} bytes",
            report.buffers,
            report.lines,
            report.bytes
        );

        Ok((self.sink, report))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}
