//! Benchmarks for blocklist domain lookup.
//!
//! Blocking is a substring scan, so lookups grow with the list size.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};

use pns::filter::Blocklist;

fn build_blocklist(size: usize) -> Blocklist {
    let mut domains: Vec<String> = (0..size).map(|i| format!("tracker{i}.ads.net")).collect();
    domains.push("doubleclick".to_string());
    Blocklist::new(domains)
}

fn bench_is_blocked(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocklist");
    group.throughput(Throughput::Elements(1));

    for size in [10usize, 1_000] {
        let blocklist = build_blocklist(size);

        group.bench_function(BenchmarkId::new("substring_hit", size), |b| {
            b.iter(|| blocklist.is_blocked(black_box("stats.g.doubleclick.net")))
        });

        group.bench_function(BenchmarkId::new("mixed_case_hit", size), |b| {
            b.iter(|| blocklist.is_blocked(black_box("Tracker5.ADS.net")))
        });

        group.bench_function(BenchmarkId::new("miss", size), |b| {
            b.iter(|| blocklist.is_blocked(black_box("www.google.com")))
        });
    }

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    bench_is_blocked(&mut criterion);
    criterion.final_summary();
}
