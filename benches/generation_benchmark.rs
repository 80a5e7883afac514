use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use station_datagen::models::{partition_workload, GeneratorConfig, Station, StationTable};
use station_datagen::pipeline::Generator;
use station_datagen::processors::IntegrityChecker;
use station_datagen::utils::format_temperature;
use std::io;

// Create a synthetic station table for benchmarking
fn create_test_stations(count: usize) -> StationTable {
    (0..count)
        .map(|i| Station::new(format!("Station {}", i), -20.0 + (i % 60) as f64))
        .collect()
}

fn benchmark_format_temperature(c: &mut Criterion) {
    let values = [-99.9, -45.3, -0.04, 0.0, 7.25, 15.0, 38.8, 99.9];

    c.bench_function("format_temperature", |b| {
        let mut scratch = [0u8; 16];
        b.iter(|| {
            let mut total = 0;
            for &value in &values {
                total += format_temperature(black_box(value), &mut scratch).unwrap_or(0);
            }
            black_box(total)
        })
    });
}

fn benchmark_partition(c: &mut Criterion) {
    c.bench_function("partition_workload", |b| {
        b.iter(|| black_box(partition_workload(black_box(1_000_000_000), black_box(7))))
    });
}

fn benchmark_generate_by_workers(c: &mut Criterion) {
    let stations = create_test_stations(1_000);
    let mut group = c.benchmark_group("generate_100k_lines");
    group.sample_size(10);

    for &workers in &[1, 2, 4, 7] {
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &workers,
            |b, &workers| {
                let config = GeneratorConfig::default()
                    .with_unique_stations(1_000)
                    .with_total_lines(100_000)
                    .with_workers(workers)
                    .with_seed(Some(1));
                let generator = Generator::new(config).unwrap();
                b.iter(|| {
                    let (_, summary) = generator.generate_into(&stations, io::sink(), None).unwrap();
                    black_box(summary.lines_written)
                })
            },
        );
    }

    group.finish();
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let stations = create_test_stations(100);
    let config = GeneratorConfig::default()
        .with_unique_stations(100)
        .with_total_lines(20_000)
        .with_workers(2)
        .with_seed(Some(3));
    let (content, _) = Generator::new(config)
        .unwrap()
        .generate_into(&stations, Vec::new(), None)
        .unwrap();
    let content = String::from_utf8(content).unwrap();

    c.bench_function("integrity_checker", |b| {
        b.iter(|| {
            let checker = IntegrityChecker::new(&stations);
            black_box(checker.check_str(&content, None).valid_lines)
        })
    });
}

criterion_group!(
    benches,
    benchmark_format_temperature,
    benchmark_partition,
    benchmark_generate_by_workers,
    benchmark_integrity_checker
);
criterion_main!(benches);
