//! Performance benchmarks for marker-cluster-lib
//!
//! Run with: cargo bench --package marker-cluster-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use marker_cluster_lib::{
    ClusteringAlgorithm, Config, LatLngBounds, MapItem, QuadTree, TileClusterAlgorithm,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// The Netherlands, roughly
const AREA: LatLngBounds = LatLngBounds::new(53.35917, 3.57361, 50.77083, 7.10833);

/// Generate items uniformly spread over `area`
fn generate_items(count: usize, area: &LatLngBounds, seed: u64) -> Vec<Arc<MapItem>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let latitude = rng.random_range(area.south..area.north);
            let longitude = rng.random_range(area.west..area.east);
            Arc::new(MapItem::new(latitude, longitude))
        })
        .collect()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    for count in [1_000, 20_000, 100_000] {
        let items = generate_items(count, &AREA, 42);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &items, |b, items| {
            b.iter(|| {
                let mut tree = QuadTree::new();
                tree.build(items.iter().cloned());
                tree
            });
        });
    }

    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");

    let items = generate_items(20_000, &AREA, 42);
    let mut algorithm = TileClusterAlgorithm::new(Config::default()).unwrap();
    algorithm.set_items(&items);

    // Overview, country and city level
    for zoom in [3.0, 7.0, 12.0] {
        group.bench_with_input(BenchmarkId::new("area_20k", zoom), &zoom, |b, &zoom| {
            b.iter(|| algorithm.get_clusters(&AREA, zoom).unwrap());
        });
    }

    let city = LatLngBounds::new(52.40, 4.80, 52.30, 5.00);
    group.bench_function("city_viewport_20k_zoom_12", |b| {
        b.iter(|| algorithm.get_clusters(&city, 12.0).unwrap());
    });

    group.finish();
}

fn bench_range_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_query");

    let items = generate_items(100_000, &AREA, 7);
    let mut tree = QuadTree::new();
    tree.build(items);

    let small = LatLngBounds::new(52.01, 5.00, 52.00, 5.01);
    group.bench_function("small_100k", |b| {
        b.iter(|| tree.query_range(&small));
    });

    group.bench_function("large_100k", |b| {
        b.iter(|| tree.query_range(&AREA));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_build, bench_clustering, bench_range_query);

criterion_main!(benches);
