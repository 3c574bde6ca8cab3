use bytepair_rs::{decode, encode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate repetitive text data
fn generate_repetitive_text(size: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog ";
    pattern
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect()
}

/// Generate source code-like data
fn generate_source_code(size: usize) -> Vec<u8> {
    let patterns: [&[u8]; 7] = [
        b"fn main() {\n",
        b"    let x = 42;\n",
        b"    println!(\"Hello, world!\");\n",
        b"    if x > 0 {\n",
        b"        return x;\n",
        b"    }\n",
        b"}\n",
    ];

    let mut result = Vec::new();
    let mut i = 0;
    while result.len() < size {
        result.extend_from_slice(patterns[i % patterns.len()]);
        i += 1;
    }
    result.truncate(size);
    result
}

/// Generate low-repetition data (simulating base64)
fn generate_low_repetition(size: usize) -> Vec<u8> {
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = Vec::with_capacity(size);
    let mut seed = 12345u64;

    for _ in 0..size {
        // Simple LCG random
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        result.push(chars[(seed % chars.len() as u64) as usize]);
    }
    result
}

fn bench_encode(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000];
    let mut group = c.benchmark_group("encode");

    for size in sizes.iter() {
        for (name, data) in [
            ("repetitive", generate_repetitive_text(*size)),
            ("source_code", generate_source_code(*size)),
            ("low_repetition", generate_low_repetition(*size)),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &data,
                |b, data| {
                    b.iter(|| {
                        let mut encoded = Vec::new();
                        encode(black_box(data), &mut encoded).unwrap();
                        black_box(encoded)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000];
    let mut group = c.benchmark_group("decode");

    for size in sizes.iter() {
        for (name, data) in [
            ("repetitive", generate_repetitive_text(*size)),
            ("source_code", generate_source_code(*size)),
        ] {
            let mut encoded = Vec::new();
            encode(&data, &mut encoded).unwrap();

            group.bench_with_input(
                BenchmarkId::new(name, size),
                &encoded,
                |b, encoded| {
                    b.iter(|| {
                        let decoded = decode(black_box(encoded.as_slice())).unwrap();
                        black_box(decoded)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_compression_ratio(c: &mut Criterion) {
    // Single-iteration group to keep ratio reporting alongside throughput.
    let mut group = c.benchmark_group("ratio");
    let data = generate_source_code(100_000);

    group.bench_function("source_code_100k", |b| {
        b.iter(|| {
            let mut encoded = Vec::new();
            encode(black_box(&data), &mut encoded).unwrap();
            black_box(encoded.len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_compression_ratio);
criterion_main!(benches);
