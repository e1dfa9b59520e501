//! Benchmarks for the separable Gaussian filter.
//!
//! Run with: cargo bench --package grid-processor --bench gaussian_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_processor::{gaussian_filter, GaussianFilter};
use test_utils::generators::create_height_grid;

fn bench_gaussian_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian_filter");

    // RAP 500 hPa subset, HRRR CONUS surface subset
    let sizes = [(151, 113, "rap_subset"), (1799, 1059, "hrrr_conus")];

    for (width, height, name) in sizes {
        let data = create_height_grid(width, height);
        let filter = GaussianFilter::default();
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(BenchmarkId::new("sigma2", name), &data, |b, data| {
            b.iter(|| gaussian_filter(black_box(data), width, height, &filter));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gaussian_filter);
criterion_main!(benches);
