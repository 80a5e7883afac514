//! The generation pipeline: N producers fill pooled buffers and hand them to
//! one writer through a bounded queue.
//!
//! ```text
//! StationTable ──┐
//!                ├─> ProducerWorker × N ──submit──> BoundedQueue ──> MeasurementWriter ──> file
//! BufferPool <───┴──────────────────── release <─────────────────────────┘
//! ```

pub mod buffer_pool;
pub mod cancel;
pub mod coordinator;
pub mod producer;
pub mod queue;

pub use buffer_pool::{Buffer, BufferPool};
pub use cancel::CancellationToken;
pub use coordinator::{Generator, RunSummary};
pub use producer::{seed_station_lines, worker_rng, ProducerReport, ProducerWorker};
pub use queue::{bounded, QueueReader, QueueStats, QueueWriter};
