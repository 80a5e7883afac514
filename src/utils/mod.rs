pub mod constants;
pub mod progress;
pub mod temperature;

pub use constants::*;
pub use progress::ProgressReporter;
pub use temperature::{format_temperature, parse_temperature};
