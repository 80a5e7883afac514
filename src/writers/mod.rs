pub mod measurement_writer;

pub use measurement_writer::{MeasurementWriter, WriterReport};
