use crate::error::{GeneratorError, Result};
use crate::models::{StationTable, WorkItem, WorkloadAssignment};
use crate::pipeline::buffer_pool::{Buffer, BufferPool};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::queue::QueueWriter;
use crate::utils::constants::{TEMPERATURE_JITTER, TEMPERATURE_SCRATCH_LEN};
use crate::utils::format_temperature;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProducerReport {
    pub worker_index: usize,
    pub lines: u64,
    pub buffers_submitted: u64,
}

/// Generator state for one worker.
///
/// With a seed, worker `i` starts `i` jumps (2^128 steps each) into the
/// seeded stream, so workers never overlap and each worker's output is
/// reproducible.
pub fn worker_rng(seed: Option<u64>, worker_index: usize) -> Xoshiro256PlusPlus {
    match seed {
        Some(seed) => {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            for _ in 0..worker_index {
                rng.jump();
            }
            rng
        }
        None => Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
    }
}

/// Packs lines into pooled buffers, submitting a buffer as soon as the next
/// line would not fit. Lines never straddle two buffers.
struct LineBatcher<'a> {
    origin: String,
    pool: &'a BufferPool,
    queue: &'a QueueWriter,
    buffer: Buffer,
    lines_in_buffer: u64,
    lines: u64,
    buffers_submitted: u64,
}

impl<'a> LineBatcher<'a> {
    fn new(origin: String, pool: &'a BufferPool, queue: &'a QueueWriter) -> Self {
        Self {
            origin,
            pool,
            queue,
            buffer: pool.acquire(),
            lines_in_buffer: 0,
            lines: 0,
            buffers_submitted: 0,
        }
    }

    fn push(&mut self, name: &str, temperature: f64) -> Result<()> {
        let mut scratch = [0u8; TEMPERATURE_SCRATCH_LEN];
        let value_len = format_temperature(temperature, &mut scratch)?;
        let name = name.as_bytes();
        let value = &scratch[..value_len];

        let line_len = name.len() + value_len + 2;
        if line_len > self.pool.buffer_capacity() {
            return Err(GeneratorError::LineTooLong {
                line_len,
                capacity: self.pool.buffer_capacity(),
            });
        }

        if !self.buffer.append_line(name, value) {
            self.submit_current()?;
            self.buffer = self.pool.acquire();
            // A fresh buffer always holds one line that passed the check above
            let appended = self.buffer.append_line(name, value);
            debug_assert!(appended);
        }

        self.lines_in_buffer += 1;
        self.lines += 1;
        Ok(())
    }

    fn submit_current(&mut self) -> Result<()> {
        let full = std::mem::replace(&mut self.buffer, Buffer::with_capacity(0));
        let lines = std::mem::take(&mut self.lines_in_buffer);

        tracing::trace!(
            "{} submitting {} lines ({} bytes)",
            self.origin,
            lines,
            full.len()
        );

        if let Err(item) = self.queue.submit(WorkItem::new(full, lines)) {
            self.pool.release(item.into_buffer());
            return Err(GeneratorError::QueueClosed(self.origin.clone()));
        }

        self.buffers_submitted += 1;
        Ok(())
    }

    /// Submit the trailing partial buffer, or hand an unused one straight back
    fn finish(mut self) -> Result<(u64, u64)> {
        if self.buffer.is_empty() {
            let unused = std::mem::replace(&mut self.buffer, Buffer::with_capacity(0));
            self.pool.release(unused);
        } else {
            self.submit_current()?;
        }
        Ok((self.lines, self.buffers_submitted))
    }
}

/// One of the N generating workers
pub struct ProducerWorker<'a> {
    assignment: WorkloadAssignment,
    stations: &'a StationTable,
    pool: &'a BufferPool,
    queue: &'a QueueWriter,
    cancel: &'a CancellationToken,
    rng: Xoshiro256PlusPlus,
}

impl<'a> ProducerWorker<'a> {
    pub fn new(
        assignment: WorkloadAssignment,
        stations: &'a StationTable,
        pool: &'a BufferPool,
        queue: &'a QueueWriter,
        cancel: &'a CancellationToken,
        seed: Option<u64>,
    ) -> Self {
        Self {
            assignment,
            stations,
            pool,
            queue,
            cancel,
            rng: worker_rng(seed, assignment.worker_index),
        }
    }

    /// Generate exactly `assignment.line_count` lines and submit them
    pub fn run(mut self) -> Result<ProducerReport> {
        let worker_index = self.assignment.worker_index;
        let _span = tracing::debug_span!("producer", worker = worker_index).entered();

        let stations = self.stations.as_slice();
        if stations.is_empty() && self.assignment.line_count > 0 {
            return Err(GeneratorError::EmptyStationTable);
        }

        tracing::debug!("Generating {} lines", self.assignment.line_count);

        let mut batcher =
            LineBatcher::new(format!("worker {}", worker_index), self.pool, self.queue);

        for _ in 0..self.assignment.line_count {
            if self.cancel.is_cancelled() {
                return Err(GeneratorError::Cancelled);
            }

            let station = &stations[self.rng.random_range(0..stations.len())];
            let jitter = self
                .rng
                .random_range(-TEMPERATURE_JITTER..TEMPERATURE_JITTER);

            batcher.push(&station.name, station.base_temperature + jitter)?;
        }

        let (lines, buffers_submitted) = batcher.finish()?;
        tracing::debug!("Finished: {} lines in {} buffers", lines, buffers_submitted);

        Ok(ProducerReport {
            worker_index,
            lines,
            buffers_submitted,
        })
    }
}

/// Write every station once at its base temperature
pub fn seed_station_lines(
    stations: &StationTable,
    pool: &BufferPool,
    queue: &QueueWriter,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut batcher = LineBatcher::new("station seeding".to_string(), pool, queue);
    for station in stations {
        if cancel.is_cancelled() {
            return Err(GeneratorError::Cancelled);
        }
        batcher.push(&station.name, station.base_temperature)?;
    }
    let (lines, buffers) = batcher.finish()?;
    tracing::debug!("Seeded {} stations in {} buffers", lines, buffers);
    Ok(lines)
}
