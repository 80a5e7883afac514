use pretty_assertions::assert_eq;
use regex::Regex;
use station_datagen::models::{partition_workload, GeneratorConfig, Station, StationTable};
use station_datagen::pipeline::{CancellationToken, Generator};
use station_datagen::processors::IntegrityChecker;
use station_datagen::readers::StationReader;
use station_datagen::utils::ProgressReporter;
use station_datagen::{GeneratorError, Result};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn abc_table() -> StationTable {
    vec![
        Station::new("A", 10.0),
        Station::new("B", 20.0),
        Station::new("C", 30.0),
    ]
    .into_iter()
    .collect()
}

fn abc_config(total_lines: u64, workers: usize) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_unique_stations(3)
        .with_total_lines(total_lines)
        .with_workers(workers)
}

#[test]
fn test_three_stations_seven_lines() -> Result<()> {
    let stations = abc_table();
    let generator = Generator::new(abc_config(7, 2))?;
    let (sink, summary) = generator.generate_into(&stations, Vec::new(), None)?;

    let text = String::from_utf8(sink).unwrap();
    let pattern = Regex::new(r"^(A|B|C);-?\d+\.\d$").unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    for line in &lines {
        assert!(pattern.is_match(line), "unexpected line {:?}", line);
    }
    assert!(text.ends_with('\n'));
    assert_eq!(summary.lines_written, 7);

    let report = IntegrityChecker::new(&stations).check_str(&text, Some(7));
    assert!(report.is_clean());
    Ok(())
}

#[test]
fn test_small_buffers_keep_lines_whole() -> Result<()> {
    let stations = abc_table();
    let generator = Generator::new(abc_config(1_000, 3).with_buffer_capacity(32))?;
    let (sink, summary) = generator.generate_into(&stations, Vec::new(), None)?;

    let text = String::from_utf8(sink).unwrap();
    let report = IntegrityChecker::new(&stations).check_str(&text, Some(1_000));
    assert!(report.is_clean(), "{:?}", report.violations);
    assert!(summary.buffers_written >= 1_000 / 5);
    assert_eq!(summary.bytes_written, text.len() as u64);
    Ok(())
}

/// Sink that sleeps on every write so the queue fills up
struct SlowSink {
    inner: Vec<u8>,
    delay: Duration,
}

impl Write for SlowSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        thread::sleep(self.delay);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_slow_writer_applies_backpressure() -> Result<()> {
    let stations = abc_table();
    let generator = Generator::new(
        abc_config(400, 4)
            .with_buffer_capacity(32)
            .with_queue_capacity(1),
    )?;
    let sink = SlowSink {
        inner: Vec::new(),
        delay: Duration::from_millis(1),
    };
    let (sink, summary) = generator.generate_into(&stations, sink, None)?;

    assert!(summary.producer_stalls > 0);
    assert_eq!(summary.lines_written, 400);
    let text = String::from_utf8(sink.inner).unwrap();
    assert_eq!(text.lines().count(), 400);
    // Pool growth is bounded by what can be in flight, not by the line count
    assert!(summary.buffers_allocated < summary.buffers_written as usize);
    Ok(())
}

#[test]
fn test_station_file_to_verified_output() -> Result<()> {
    let dir = TempDir::new()?;
    let stations_path = dir.path().join("weather_stations.csv");
    std::fs::write(
        &stations_path,
        "# Station;Mean temperature\nHamburg;12.0\nBulawayo;8.9\nPalembang;38.8\nHamburg;99.0\n\nSt. John's;15.2\n",
    )?;
    let output = dir.path().join("out").join("measurements.txt");

    let config = GeneratorConfig::default()
        .with_unique_stations(10)
        .with_total_lines(5_000)
        .with_workers(4)
        .with_seed(Some(7))
        .with_seed_stations(true);
    let generator = Generator::new(config)?;
    let progress = ProgressReporter::silent();
    let summary = generator.generate(&stations_path, &output, Some(&progress))?;
    assert_eq!(summary.lines_written, 5_000);
    assert_eq!(summary.seeded_lines, 4);

    let stations = StationReader::new(10).read_stations(&stations_path)?;
    assert_eq!(stations.len(), 4);
    assert_eq!(stations.lookup("Hamburg").unwrap().base_temperature, 12.0);

    for use_mmap in [false, true] {
        let report = IntegrityChecker::new(&stations)
            .with_mmap(use_mmap)
            .check_file(&output, Some(5_000))?;
        assert!(report.is_clean(), "{:?}", report.violations);
        assert_eq!(report.station_statistics.len(), 4);
    }

    let text = std::fs::read_to_string(&output)?;
    assert!(text.starts_with("Hamburg;12.0\nBulawayo;8.9\nPalembang;38.8\nSt. John's;15.2\n"));
    Ok(())
}

#[test]
fn test_missing_station_file() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(abc_config(10, 1)).unwrap();
    let output = dir.path().join("measurements.txt");
    let result = generator.generate(&dir.path().join("missing.csv"), &output, None);
    assert!(matches!(result, Err(GeneratorError::Io(_))));
    assert!(!output.exists());
}

#[test]
fn test_external_cancellation() {
    let token = CancellationToken::new();
    let generator = Generator::new(
        abc_config(1_000_000, 2)
            .with_buffer_capacity(64)
            .with_queue_capacity(1),
    )
    .unwrap()
    .with_cancellation(token.clone());
    let sink = SlowSink {
        inner: Vec::new(),
        delay: Duration::from_millis(1),
    };

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        token.cancel();
    });
    let result = generator.generate_into(&abc_table(), sink, None);
    canceller.join().unwrap();

    assert!(matches!(result, Err(GeneratorError::Cancelled)));
}

#[test]
fn test_partition_covers_total() {
    for (total, workers) in [(0u64, 1usize), (7, 2), (1_000_000, 7), (5, 8), (13, 13)] {
        let parts = partition_workload(total, workers);
        assert_eq!(parts.len(), workers);
        assert_eq!(parts.iter().map(|p| p.line_count).sum::<u64>(), total);

        let base = total / workers as u64;
        assert_eq!(parts[0].line_count, base + total % workers as u64);
        for part in &parts[1..] {
            assert_eq!(part.line_count, base);
        }
    }
}
