use crate::utils::constants::{DEFAULT_UNIQUE_STATIONS, MEASUREMENTS_FILE, STATIONS_FILE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "station-datagen")]
#[command(about = "Concurrent generator of synthetic weather-station measurement files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a measurements file from a station table
    Generate {
        #[arg(short, long, default_value = STATIONS_FILE, help = "Station file ('name;base_temperature' per line)")]
        stations: PathBuf,

        #[arg(short, long, default_value = MEASUREMENTS_FILE)]
        output: PathBuf,

        #[arg(short, long, help = "Configuration file (TOML, YAML or JSON)")]
        config: Option<PathBuf>,

        #[arg(short, long, help = "Distinct stations to load [default: 10000]")]
        unique_stations: Option<usize>,

        #[arg(short = 'n', long, help = "Lines to generate [default: 1000000]")]
        lines: Option<u64>,

        #[arg(short, long, help = "Producer threads [default: 7]")]
        workers: Option<usize>,

        #[arg(long, help = "Bytes per write buffer [default: 8192]")]
        buffer_capacity: Option<usize>,

        #[arg(long, help = "Filled buffers allowed in flight [default: 1000]")]
        queue_capacity: Option<usize>,

        #[arg(long, help = "Seed for reproducible output")]
        seed: Option<u64>,

        #[arg(long, help = "Write every station once before the random lines")]
        seed_stations: bool,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,

        #[arg(long, help = "Print the run summary as JSON")]
        json: bool,
    },

    /// Check a generated file against its station table
    Verify {
        #[arg(short, long, default_value = STATIONS_FILE)]
        stations: PathBuf,

        #[arg(short, long, default_value = MEASUREMENTS_FILE)]
        input: PathBuf,

        #[arg(short, long, default_value_t = DEFAULT_UNIQUE_STATIONS)]
        unique_stations: usize,

        #[arg(short, long, help = "Fail unless the file has exactly this many lines")]
        expected_lines: Option<u64>,

        #[arg(long, help = "Read the file through a memory map")]
        mmap: bool,

        #[arg(long, default_value = "100", help = "Violations kept in the report")]
        max_reported: usize,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["station-datagen", "generate"]).unwrap();
        match cli.command {
            Commands::Generate {
                stations,
                output,
                lines,
                quiet,
                ..
            } => {
                assert_eq!(stations, PathBuf::from(STATIONS_FILE));
                assert_eq!(output, PathBuf::from(MEASUREMENTS_FILE));
                assert_eq!(lines, None);
                assert!(!quiet);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_overrides() {
        let cli = Cli::try_parse_from([
            "station-datagen",
            "--verbose",
            "generate",
            "-n",
            "500",
            "--workers",
            "3",
            "--seed",
            "42",
            "--seed-stations",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate {
                lines,
                workers,
                seed,
                seed_stations,
                ..
            } => {
                assert_eq!(lines, Some(500));
                assert_eq!(workers, Some(3));
                assert_eq!(seed, Some(42));
                assert!(seed_stations);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_verify_defaults() {
        let cli = Cli::try_parse_from(["station-datagen", "verify"]).unwrap();
        match cli.command {
            Commands::Verify {
                unique_stations,
                expected_lines,
                mmap,
                ..
            } => {
                assert_eq!(unique_stations, DEFAULT_UNIQUE_STATIONS);
                assert_eq!(expected_lines, None);
                assert!(!mmap);
            }
            _ => panic!("expected verify"),
        }
    }
}
