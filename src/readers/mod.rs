pub mod measurement_reader;
pub mod station_reader;

pub use measurement_reader::{parse_measurement, Measurement, MeasurementReader};
pub use station_reader::StationReader;
