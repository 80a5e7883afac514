/// File names
pub const STATIONS_FILE: &str = "weather_stations.csv";
pub const MEASUREMENTS_FILE: &str = "measurements.txt";

/// Line framing
pub const FIELD_SEPARATOR: u8 = b';';
pub const LINE_TERMINATOR: u8 = b'\n';
pub const COMMENT_PREFIX: char = '#';

/// Jitter applied around a station's base temperature, drawn from [-JITTER, +JITTER)
pub const TEMPERATURE_JITTER: f64 = 10.0;
/// Slack for one-decimal rounding when checking generated values
pub const TEMP_TOLERANCE: f64 = 0.05;

/// Generation defaults
pub const DEFAULT_UNIQUE_STATIONS: usize = 10_000;
pub const DEFAULT_TOTAL_LINES: u64 = 1_000_000;
pub const DEFAULT_WORKERS: usize = 7;
pub const DEFAULT_WRITE_BUFFER_CAPACITY: usize = 8192;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Scratch space for a rendered temperature
pub const TEMPERATURE_SCRATCH_LEN: usize = 16;

/// Mode of a published measurements file, as `File::create` gives under a 022 umask
#[cfg(unix)]
pub const OUTPUT_FILE_MODE: u32 = 0o644;

/// I/O defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Progress is logged at every tenth of the requested lines
pub const PROGRESS_STEPS: u64 = 10;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "STATION_DATAGEN";
