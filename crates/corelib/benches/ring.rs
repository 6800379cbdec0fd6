use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use corelib::{HashRing, RingConfig};

fn populated(hosts: usize, replicas: usize) -> HashRing {
    let ring = HashRing::new(RingConfig::default().with_replicas(replicas));
    for i in 0..hosts {
        ring.register_host(&format!("10.0.{}.{}:8080", i / 256, i % 256))
            .expect("unique host");
    }
    ring
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    for hosts in [3usize, 32, 256] {
        let ring = populated(hosts, 10);
        group.bench_with_input(BenchmarkId::new("get_host", hosts), &ring, |b, ring| {
            let mut i = 0u64;
            b.iter(|| {
                i = i.wrapping_add(1);
                black_box(ring.get_host(i.to_le_bytes()).ok())
            })
        });
        group.bench_with_input(
            BenchmarkId::new("get_host_capacious", hosts),
            &ring,
            |b, ring| {
                let mut i = 0u64;
                b.iter(|| {
                    i = i.wrapping_add(1);
                    black_box(ring.get_host_capacious(i.to_le_bytes()).ok())
                })
            },
        );
    }
    group.finish();
}

fn bench_reserve(c: &mut Criterion) {
    let ring = populated(32, 10);
    c.bench_function("reserve_release", |b| {
        b.iter(|| {
            let r = ring.reserve(black_box("hot-key")).expect("non-empty ring");
            black_box(r.host().len())
        })
    });
}

fn bench_register(c: &mut Criterion) {
    c.bench_function("register_unregister_100_replicas", |b| {
        let ring = populated(64, 100);
        b.iter(|| {
            ring.register_host("bench-host").expect("not registered");
            ring.unregister_host("bench-host").expect("registered");
        })
    });
}

criterion_group!(benches, bench_lookup, bench_reserve, bench_register);
criterion_main!(benches);
