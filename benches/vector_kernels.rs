// SPDX-License-Identifier: Apache-2.0

//! Int8 and bit-plane kernels on every tier the running CPU supports.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hwkit::constants::QUERY_BIT_PLANES;
use hwkit::{available_tiers, KernelSet};
use std::hint::black_box;

fn bytes(mut state: u64, len: usize) -> Vec<u8> {
    state |= 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

fn tiers() -> Vec<KernelSet> {
    available_tiers()
        .into_iter()
        .filter_map(|t| KernelSet::for_tier(t).ok())
        .collect()
}

fn benchmark_int8(c: &mut Criterion) {
    let mut group = c.benchmark_group("int8");

    for set in tiers() {
        let s = set.stride();
        // On and just past the block width, plus typical embedding sizes.
        for dims in [s, s + 1, 4 * s, 4 * s + s / 2 + 1, 384, 1024, 1536] {
            let a: Vec<i8> = bytes(1, dims).into_iter().map(|b| b as i8).collect();
            let b: Vec<i8> = bytes(2, dims).into_iter().map(|b| b as i8).collect();
            let label = format!("{:?}", set.tier());

            group.throughput(Throughput::Bytes(2 * dims as u64));
            group.bench_with_input(BenchmarkId::new(format!("dot8s/{}", label), dims), &dims, |bench, _| {
                bench.iter(|| set.dot8s(black_box(&a), black_box(&b)).unwrap())
            });
            group.bench_with_input(BenchmarkId::new(format!("sqr8s/{}", label), dims), &dims, |bench, _| {
                bench.iter(|| set.sqr8s(black_box(&a), black_box(&b)).unwrap())
            });
        }
    }

    group.finish();
}

fn benchmark_bit4_bulk(c: &mut Criterion) {
    let mut group = c.benchmark_group("int1_int4_bulk");
    let count = 1000;

    for set in tiers() {
        let label = format!("{:?}", set.tier());
        // 384, 1024 and 1536 bit vectors.
        for length in [48usize, 128, 192] {
            let arena = bytes(3, length * count);
            let query = bytes(4, QUERY_BIT_PLANES * length);
            let mut results = vec![0.0f32; count];
            group.throughput(Throughput::Elements(count as u64));

            group.bench_with_input(BenchmarkId::new(format!("bulk/{}", label), length), &length, |bench, &length| {
                bench.iter(|| {
                    set.dot_int1_int4_bulk(black_box(&arena), &query, length, &mut results)
                        .unwrap();
                    black_box(results[count - 1])
                })
            });

            // Scattered gather over the same arena.
            let offsets: Vec<i32> = (0..count).map(|i| ((i * 7919) % count) as i32).collect();
            group.bench_with_input(BenchmarkId::new(format!("bulk_offsets/{}", label), length), &length, |bench, &length| {
                bench.iter(|| {
                    set.dot_int1_int4_bulk_offsets(
                        black_box(&arena),
                        &query,
                        length,
                        length,
                        &offsets,
                        &mut results,
                    )
                    .unwrap();
                    black_box(results[count - 1])
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_int8, benchmark_bit4_bulk);
criterion_main!(benches);
