//! Routing benchmarks.
//!
//! Run with: `cargo bench -p waypoint-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use waypoint_router::RouteTable;

fn build_table(num_routes: usize) -> RouteTable<String> {
    let mut table = RouteTable::new();

    for i in 0..num_routes / 3 {
        let _ = table.insert(&format!("/api/v1/resource{i}"), &Method::GET, format!("list{i}"));
    }
    for i in 0..num_routes / 3 {
        let _ = table.insert(&format!("/api/v1/resource{i}/:id"), &Method::GET, format!("get{i}"));
    }
    for i in 0..num_routes / 3 {
        let _ = table.insert(
            &format!("/api/v1/org/:orgId/resource{i}/:id"),
            &Method::GET,
            format!("org{i}"),
        );
    }

    table
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for size in [30, 150, 600] {
        let table = build_table(size);
        group.bench_with_input(BenchmarkId::new("static", size), &table, |b, table| {
            b.iter(|| table.find(black_box("/api/v1/resource5")));
        });
        group.bench_with_input(BenchmarkId::new("param", size), &table, |b, table| {
            b.iter(|| table.find(black_box("/api/v1/resource5/123")));
        });
        group.bench_with_input(BenchmarkId::new("miss", size), &table, |b, table| {
            b.iter(|| table.find(black_box("/nothing/here")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find);
criterion_main!(benches);
