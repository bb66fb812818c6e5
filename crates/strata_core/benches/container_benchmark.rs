//! # Container Benchmark
//!
//! Hot-path costs of the substrate containers:
//! 1. Sequence push, heap vs arena
//! 2. Hash table insert / lookup at a realistic vertex-table size
//! 3. Hotel churn (place + clear) and occupied iteration

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::{Arena, HashTable, Hotel, RandomEngine, Sequence};

const ELEMENT_COUNT: u32 = 100_000;

fn bench_sequence_push(c: &mut Criterion) {
    c.bench_function("sequence_push_heap_100k", |b| {
        b.iter(|| {
            let mut seq: Sequence<'_, u32> = Sequence::new(16);
            for i in 0..ELEMENT_COUNT {
                seq.push(i);
            }
            black_box(seq.len())
        });
    });

    let mut arena = Arena::new(16 * 1024 * 1024);
    c.bench_function("sequence_push_arena_100k", |b| {
        b.iter(|| {
            let frame = arena.frame();
            let mut seq: Sequence<'_, u32> = Sequence::new_in(16, &frame);
            for i in 0..ELEMENT_COUNT {
                seq.push(i);
            }
            black_box(seq.len())
        });
    });
}

fn bench_hash_table(c: &mut Criterion) {
    c.bench_function("hash_insert_vertex_triples_100k", |b| {
        b.iter(|| {
            let mut table: HashTable<'_, [u32; 3], u32> = HashTable::new(64);
            for i in 0..ELEMENT_COUNT {
                table.insert([i, i ^ 0x55, i >> 3], i);
            }
            black_box(table.len())
        });
    });

    let mut table: HashTable<'_, u32, u32> = HashTable::new(64);
    for i in 0..ELEMENT_COUNT {
        table.insert(i, i);
    }
    let mut engine = RandomEngine::new(7);
    let probes: Vec<u32> = (0..10_000).map(|_| engine.range_i32(0, 2 * ELEMENT_COUNT as i32) as u32).collect();

    c.bench_function("hash_get_random_10k", |b| {
        b.iter(|| {
            let hits = probes.iter().filter(|key| table.get(key).is_some()).count();
            black_box(hits)
        });
    });
}

fn bench_hotel(c: &mut Criterion) {
    let mut hotel: Hotel<[f32; 4]> = Hotel::new(1024);
    let keys: Vec<_> = (0..ELEMENT_COUNT).map(|i| hotel.place([i as f32; 4])).collect();

    c.bench_function("hotel_churn_10k", |b| {
        b.iter(|| {
            for key in keys.iter().step_by(10) {
                if hotel.clear(*key) {
                    black_box(hotel.place([0.0; 4]));
                }
            }
        });
    });

    c.bench_function("hotel_iterate_100k", |b| {
        b.iter(|| {
            let sum: f32 = hotel.iter().map(|(_, v)| v[0]).sum();
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_sequence_push, bench_hash_table, bench_hotel);
criterion_main!(benches);
