use crate::error::{GeneratorError, Result};
use crate::utils::constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_TOTAL_LINES, DEFAULT_UNIQUE_STATIONS, DEFAULT_WORKERS,
    DEFAULT_WRITE_BUFFER_CAPACITY, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Parameters of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Distinct stations to load from the station file
    #[validate(range(min = 1))]
    pub unique_stations: usize,

    /// Lines in the output file
    pub total_lines: u64,

    /// Producer threads
    #[validate(range(min = 1))]
    pub workers: usize,

    /// Bytes per write buffer
    #[validate(range(min = 16))]
    pub buffer_capacity: usize,

    /// Filled buffers allowed in flight between producers and the writer
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Base seed for per-worker generators; `None` seeds from OS entropy
    pub seed: Option<u64>,

    /// Write every station once with its base temperature before the random lines
    pub seed_stations: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            unique_stations: DEFAULT_UNIQUE_STATIONS,
            total_lines: DEFAULT_TOTAL_LINES,
            workers: DEFAULT_WORKERS,
            buffer_capacity: DEFAULT_WRITE_BUFFER_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            seed: None,
            seed_stations: false,
        }
    }
}

impl GeneratorConfig {
    /// Layer defaults, an optional config file and `STATION_DATAGEN_*`
    /// environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: GeneratorConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn with_unique_stations(mut self, unique_stations: usize) -> Self {
        self.unique_stations = unique_stations;
        self
    }

    pub fn with_total_lines(mut self, total_lines: u64) -> Self {
        self.total_lines = total_lines;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_seed_stations(mut self, seed_stations: bool) -> Self {
        self.seed_stations = seed_stations;
        self
    }

    /// Lines left for the random producers once seed lines are accounted for
    pub fn random_lines(&self, station_count: usize) -> Result<u64> {
        if !self.seed_stations {
            return Ok(self.total_lines);
        }
        self.total_lines
            .checked_sub(station_count as u64)
            .ok_or_else(|| {
                GeneratorError::Config(format!(
                    "total_lines ({}) is smaller than the {} seeded stations",
                    self.total_lines, station_count
                ))
            })
    }
}
