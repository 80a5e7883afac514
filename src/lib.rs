pub mod cli;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use error::{GeneratorError, Result};
pub use models::{GeneratorConfig, Station, StationTable};
pub use pipeline::{CancellationToken, Generator, RunSummary};
