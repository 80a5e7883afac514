use crate::cli::args::{Cli, Commands};
use crate::error::{GeneratorError, Result};
use crate::models::GeneratorConfig;
use crate::pipeline::Generator;
use crate::processors::IntegrityChecker;
use crate::readers::StationReader;
use crate::utils::progress::ProgressReporter;
use std::path::PathBuf;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            stations,
            output,
            config,
            unique_stations,
            lines,
            workers,
            buffer_capacity,
            queue_capacity,
            seed,
            seed_stations,
            quiet,
            json,
        } => {
            let mut settings = GeneratorConfig::load(config.as_deref())?;
            if let Some(n) = unique_stations {
                settings = settings.with_unique_stations(n);
            }
            if let Some(n) = lines {
                settings = settings.with_total_lines(n);
            }
            if let Some(n) = workers {
                settings = settings.with_workers(n);
            }
            if let Some(n) = buffer_capacity {
                settings = settings.with_buffer_capacity(n);
            }
            if let Some(n) = queue_capacity {
                settings = settings.with_queue_capacity(n);
            }
            if seed.is_some() {
                settings = settings.with_seed(seed);
            }
            if seed_stations {
                settings = settings.with_seed_stations(true);
            }

            run_generate(settings, stations, output, quiet, json)
        }

        Commands::Verify {
            stations,
            input,
            unique_stations,
            expected_lines,
            mmap,
            max_reported,
            json,
        } => {
            let table = StationReader::new(unique_stations).read_stations(&stations)?;
            let checker = IntegrityChecker::new(&table)
                .with_mmap(mmap)
                .with_max_reported(max_reported);

            println!("Verifying {}...", input.display());
            let report = checker.check_file(&input, expected_lines)?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                println!("\n{}", checker.generate_summary(&report));
            }

            if report.is_clean() {
                println!("✅ All lines passed integrity checks");
                Ok(())
            } else {
                println!("⚠️  Found {} integrity issues", report.violation_count);
                Err(GeneratorError::IntegrityFailed {
                    violations: report.violation_count,
                    lines: report.total_lines,
                })
            }
        }
    }
}

fn run_generate(
    settings: GeneratorConfig,
    stations: PathBuf,
    output: PathBuf,
    quiet: bool,
    json: bool,
) -> Result<()> {
    tracing::debug!("Effective configuration: {:?}", settings);
    let cpus = num_cpus::get();
    if settings.workers > cpus {
        tracing::warn!(
            "{} producer workers requested on {} logical CPUs",
            settings.workers,
            cpus
        );
    }
    let generator = Generator::new(settings)?;
    let total = generator.config().total_lines;

    if !quiet {
        println!("Generating {} lines...", total);
        println!("Stations: {}", stations.display());
        println!("Output file: {}", output.display());
    }

    let progress = ProgressReporter::new(total, "Generating measurements...", quiet);
    match generator.generate(&stations, &output, Some(&progress)) {
        Ok(summary) => {
            progress.finish_with_message(&format!("Wrote {} lines", summary.lines_written));
            if json {
                println!("{}", to_json(&summary)?);
            } else if !quiet {
                println!("\n{}", summary.summary());
            }
            Ok(())
        }
        Err(e) => {
            progress.abandon_with_message("Generation failed");
            Err(e)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| GeneratorError::InvalidFormat(e.to_string()))
}
