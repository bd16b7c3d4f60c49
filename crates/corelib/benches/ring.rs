use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hashring_core::{HashRing, PartitionerKind, RingConfig};

fn ring_with(nodes: usize, vnodes: u16, partitioner: PartitionerKind) -> HashRing {
    let config = RingConfig::new(2)
        .with_vnodes(vnodes)
        .with_partitioner(partitioner);
    let ring = HashRing::from_config(&config).unwrap();
    for i in 0..nodes {
        ring.add_node(format!("node{i}.hostname")).unwrap();
    }
    ring
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for vnodes in [1u16, 16, 256] {
        let ring = ring_with(64, vnodes, PartitionerKind::Xxh3);
        group.bench_with_input(BenchmarkId::from_parameter(vnodes), &ring, |b, ring| {
            let mut i = 0u64;
            b.iter(|| {
                i = i.wrapping_add(1);
                black_box(ring.resolve(i.to_le_bytes()).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_partitioners(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    for kind in PartitionerKind::ALL {
        let ring = ring_with(16, 16, kind);
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| black_box(ring.position_of_key(b"user:1234567890")))
        });
    }
    group.finish();
}

fn bench_replicas(c: &mut Criterion) {
    let ring = ring_with(64, 64, PartitionerKind::Xxh3);
    c.bench_function("replicas/64x64/rf2", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = i.wrapping_add(1);
            black_box(ring.replicas(i.to_le_bytes()).unwrap())
        })
    });
}

fn bench_membership(c: &mut Criterion) {
    let ring = ring_with(64, 64, PartitionerKind::Xxh3);
    c.bench_function("add_remove/64x64", |b| {
        b.iter(|| {
            ring.add_node("joiner.hostname").unwrap();
            ring.remove_node("joiner.hostname").unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_partitioners,
    bench_replicas,
    bench_membership
);
criterion_main!(benches);
