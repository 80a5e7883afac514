use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Station file contains no usable stations")]
    EmptyStationTable,

    #[error("Temperature {value} does not fit the {capacity}-byte formatting buffer")]
    Format { value: f64, capacity: usize },

    #[error("Line of {line_len} bytes exceeds buffer capacity of {capacity} bytes")]
    LineTooLong { line_len: usize, capacity: usize },

    #[error("Queue closed while {0} was submitting")]
    QueueClosed(String),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error("Expected {expected} lines but wrote {actual}")]
    LineCountMismatch { expected: u64, actual: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Output file could not be published: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Integrity check found {violations} violations in {lines} lines")]
    IntegrityFailed { violations: u64, lines: u64 },

    #[error("Generation cancelled")]
    Cancelled,
}

impl GeneratorError {
    /// Precedence when several participants of a run fail: lower wins.
    ///
    /// A closed queue is usually caused by a cancellation, and a cancellation
    /// by some other failure, so root causes rank first.
    pub fn consolidation_rank(&self) -> u8 {
        match self {
            GeneratorError::QueueClosed(_) => 2,
            GeneratorError::Cancelled => 1,
            _ => 0,
        }
    }

    /// Errors that are a consequence of another failure rather than a cause.
    pub fn is_secondary(&self) -> bool {
        self.consolidation_rank() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_causes_rank_before_secondary_errors() {
        let panicked = GeneratorError::WorkerPanicked("boom".to_string());
        let cancelled = GeneratorError::Cancelled;
        let closed = GeneratorError::QueueClosed("worker 0".to_string());

        assert!(!panicked.is_secondary());
        assert!(cancelled.is_secondary());
        assert!(closed.is_secondary());
        assert!(panicked.consolidation_rank() < cancelled.consolidation_rank());
        assert!(cancelled.consolidation_rank() < closed.consolidation_rank());
    }
}
