//! Benchmarks for LZSS matching and the DEFLATE block codec.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flatgz_deflate::{DeflateConfig, LzssEncoder, deflate, inflate};
use std::hint::black_box;

fn generate_random(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed = 12345u32;
    for _ in 0..size {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((seed >> 16) as u8);
    }
    data
}

fn generate_repeated(size: usize) -> Vec<u8> {
    let pattern = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn generate_text_like(size: usize) -> Vec<u8> {
    let words: [&[u8]; 8] = [
        b"the ", b"quick ", b"brown ", b"fox ", b"jumps ", b"over ", b"lazy ", b"dog ",
    ];
    let mut data = Vec::with_capacity(size);
    let mut seed = 67890u32;
    while data.len() < size {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.extend_from_slice(words[(seed >> 16) as usize % words.len()]);
    }
    data.truncate(size);
    data
}

fn inputs() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("random", generate_random(64 * 1024)),
        ("repeated", generate_repeated(64 * 1024)),
        ("text", generate_text_like(64 * 1024)),
    ]
}

fn bench_lzss(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzss");

    for (name, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for chain in [1usize, 10, 64] {
            group.bench_with_input(
                BenchmarkId::new(name, format!("chain{}", chain)),
                &data,
                |b, data| {
                    b.iter(|| {
                        let mut encoder = LzssEncoder::with_chain_length(chain);
                        encoder.encode(black_box(data)).len()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_deflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate");

    for (name, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for config in [DeflateConfig::STORED, DeflateConfig::FIXED, DeflateConfig::DYNAMIC] {
            group.bench_with_input(
                BenchmarkId::new(name, config.block_type),
                &data,
                |b, data| b.iter(|| deflate(black_box(data), &config)),
            );
        }
    }

    group.finish();
}

fn bench_inflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate");

    for (name, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for config in [DeflateConfig::FIXED, DeflateConfig::DYNAMIC] {
            let Ok(compressed) = deflate(&data, &config) else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(name, config.block_type),
                &compressed,
                |b, compressed| b.iter(|| inflate(black_box(compressed))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_lzss, bench_deflate, bench_inflate);
criterion_main!(benches);
