//! Line-protocol serialization and datagram chunking benchmarks.
//!
//! Measures the cost of rendering a batch of points and of splitting the
//! rendered payload for the UDP transport. No server is needed.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark
//! cargo bench --bench chunk_benchmark -- chunking
//! ```

use adbc_influx::chunker::chunks;
use adbc_influx::line_protocol::{Batch, Point, Precision};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Benchmark configuration constants.
const SMALL_POINTS: usize = 100;
const MEDIUM_POINTS: usize = 10_000;
const LARGE_POINTS: usize = 100_000;

fn make_batch(points: usize) -> Batch {
    let mut batch = Batch::new();
    batch.add_points((0..points).map(|i| {
        let host = format!("server{:03}", i % 100);
        Point::new(
            "cpu",
            [("host", host.as_str()), ("region", "eu-west")],
            [("usage_user", (i % 97) as f64 * 0.5), ("usage_system", 1.25)],
            Some(1_500_000_000_000_000_000 + i as i64),
        )
        .expect("valid point")
    }));
    batch
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    for size in [SMALL_POINTS, MEDIUM_POINTS, LARGE_POINTS] {
        let batch = make_batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| black_box(batch.to_bytes(Precision::Nanosecond)))
        });
    }
    group.finish();
}

fn benchmark_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    let payload = make_batch(MEDIUM_POINTS).to_bytes(Precision::Nanosecond);
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for max_size in [512usize, 1400, 65_000] {
        group.bench_with_input(BenchmarkId::from_parameter(max_size), &max_size, |b, &max_size| {
            b.iter(|| chunks(black_box(&payload), max_size).count())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_serialization, benchmark_chunking);
criterion_main!(benches);
