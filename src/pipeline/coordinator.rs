use crate::error::{GeneratorError, Result};
use crate::models::{partition_workload, GeneratorConfig, StationTable};
use crate::pipeline::buffer_pool::BufferPool;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::producer::{seed_station_lines, ProducerReport, ProducerWorker};
use crate::pipeline::queue::{self, QueueStats};
use crate::readers::StationReader;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
#[cfg(unix)]
use crate::utils::constants::OUTPUT_FILE_MODE;
use crate::utils::progress::ProgressReporter;
use crate::writers::{MeasurementWriter, WriterReport};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub buffers_written: u64,
    pub buffers_allocated: usize,
    pub producer_stalls: u64,
    pub seeded_lines: u64,
    pub workers: Vec<ProducerReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_written as f64 / secs
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Lines: {}\nBytes: {}\nBuffers written: {} ({} allocated)\nProducer stalls: {}\nWorkers: {}\nElapsed: {:.2?} ({:.0} lines/s)",
            self.lines_written,
            self.bytes_written,
            self.buffers_written,
            self.buffers_allocated,
            self.producer_stalls,
            self.workers.len(),
            self.elapsed,
            self.lines_per_second()
        )
    }
}

/// Everything the pipeline threads hand back before it is consolidated
struct PipelineOutcome<W> {
    seeded: Result<u64>,
    producers: Vec<Result<ProducerReport>>,
    queue: QueueStats,
    writer: Result<(W, WriterReport)>,
}

/// Runs N producers and one writer over a shared pool and bounded queue.
///
/// The topology is fixed per run: producers execute on a dedicated rayon pool,
/// the writer on its own thread. Once every producer has returned, the queue
/// is closed and the writer drains what is left.
pub struct Generator {
    config: GeneratorConfig,
    cancel: CancellationToken,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Share an externally owned token; cancelling it stops any run in progress
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load the station file, then generate into `output`
    pub fn generate(
        &self,
        stations_path: &Path,
        output: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let stations = StationReader::new(self.config.unique_stations).read_stations(stations_path)?;
        self.generate_file(&stations, output, progress)
    }

    /// Generate into a temporary file next to `output` and move it into place
    /// only when the run succeeds. A failed run leaves nothing at `output`.
    pub fn generate_file(
        &self,
        stations: &StationTable,
        output: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        // Temp files are created owner-only; the published file must not be
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(OUTPUT_FILE_MODE))?;
        }
        let sink = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp.as_file_mut());
        let (sink, summary) = self.generate_into(stations, sink, progress)?;
        sink.into_inner().map_err(|e| e.into_error())?;

        temp.persist(output)?;
        tracing::info!("Wrote {}", output.display());
        Ok(summary)
    }

    /// Run the pipeline into any sink
    pub fn generate_into<W: Write + Send>(
        &self,
        stations: &StationTable,
        sink: W,
        progress: Option<&ProgressReporter>,
    ) -> Result<(W, RunSummary)> {
        let start = Instant::now();
        let config = &self.config;

        if stations.is_empty() {
            return Err(GeneratorError::EmptyStationTable);
        }
        let random_lines = config.random_lines(stations.len())?;
        let assignments = partition_workload(random_lines, config.workers);

        tracing::info!(
            "Generating {} lines from {} stations with {} workers (buffer {} bytes, queue {})",
            config.total_lines,
            stations.len(),
            config.workers,
            config.buffer_capacity,
            config.queue_capacity
        );

        let pool = BufferPool::new(config.buffer_capacity);
        let (queue_writer, queue_reader) = queue::bounded(config.queue_capacity);
        let producer_threads = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("producer-{}", i))
            .build()
            .map_err(|e| GeneratorError::Config(e.to_string()))?;

        // Failures cancel this run only, never the caller's token
        let run_cancel = self.cancel.child_token();
        let writer = MeasurementWriter::new(sink, &pool, config.total_lines)
            .with_progress(progress)
            .with_cancellation(run_cancel.clone());

        let outcome = thread::scope(|scope| -> Result<PipelineOutcome<W>> {
            let writer_handle = thread::Builder::new()
                .name("measurement-writer".to_string())
                .spawn_scoped(scope, move || writer.run(queue_reader))?;

            let seeded = if config.seed_stations {
                seed_station_lines(stations, &pool, &queue_writer, &run_cancel)
            } else {
                Ok(0)
            };

            let producers: Vec<Result<ProducerReport>> = if seeded.is_ok() {
                producer_threads.install(|| {
                    assignments
                        .par_iter()
                        .map(|&assignment| {
                            let worker = ProducerWorker::new(
                                assignment,
                                stations,
                                &pool,
                                &queue_writer,
                                &run_cancel,
                                config.seed,
                            );
                            let result = panic::catch_unwind(AssertUnwindSafe(|| worker.run()))
                                .unwrap_or_else(|payload| {
                                    Err(GeneratorError::WorkerPanicked(panic_message(payload)))
                                });
                            if let Err(ref e) = result {
                                if !e.is_secondary() {
                                    tracing::error!(
                                        "Worker {} failed: {}",
                                        assignment.worker_index,
                                        e
                                    );
                                    run_cancel.cancel();
                                }
                            }
                            result
                        })
                        .collect()
                })
            } else {
                Vec::new()
            };

            // All producers have returned: nothing else will be submitted
            let queue = queue_writer.close();

            let writer = writer_handle.join().unwrap_or_else(|payload| {
                Err(GeneratorError::WorkerPanicked(panic_message(payload)))
            });

            Ok(PipelineOutcome {
                seeded,
                producers,
                queue,
                writer,
            })
        })?;

        let (sink, writer_report, workers, seeded_lines) =
            consolidate(outcome.seeded, outcome.producers, outcome.writer)?;

        if writer_report.lines != config.total_lines {
            return Err(GeneratorError::LineCountMismatch {
                expected: config.total_lines,
                actual: writer_report.lines,
            });
        }

        let summary = RunSummary {
            lines_written: writer_report.lines,
            bytes_written: writer_report.bytes,
            buffers_written: writer_report.buffers,
            buffers_allocated: pool.allocated(),
            producer_stalls: outcome.queue.stalls,
            seeded_lines,
            workers,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Generated {} lines in {:.2?} ({} buffers allocated, {} producer stalls)",
            summary.lines_written,
            summary.elapsed,
            summary.buffers_allocated,
            summary.producer_stalls
        );

        Ok((sink, summary))
    }
}

type Consolidated<W> = (W, WriterReport, Vec<ProducerReport>, u64);

/// Reduce every participant's result to one outcome.
///
/// A root cause wins over cancellation, and cancellation over a closed
/// queue, since the latter two are usually consequences of the first.
fn consolidate<W>(
    seeded: Result<u64>,
    producers: Vec<Result<ProducerReport>>,
    writer: Result<(W, WriterReport)>,
) -> Result<Consolidated<W>> {
    let mut errors = Vec::new();

    let seeded_lines = seeded.unwrap_or_else(|e| {
        errors.push(e);
        0
    });

    let mut reports = Vec::with_capacity(producers.len());
    for result in producers {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => errors.push(e),
        }
    }

    let written = match writer {
        Ok(written) => Some(written),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    if let Some(primary) = errors
        .into_iter()
        .min_by_key(GeneratorError::consolidation_rank)
    {
        return Err(primary);
    }

    match written {
        Some((sink, report)) => Ok((sink, report, reports, seeded_lines)),
        None => Err(GeneratorError::Cancelled),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
