//! Cipher benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quire_bench::random_data;
use quire_storage::{decipher, encipher, CipherEngine, CipherKey};

/// Benchmark engine setup from a key.
fn bench_key_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher_key_schedule");

    for len in [8, 16, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, &len| {
            let key = random_data(len);
            b.iter(|| {
                let engine = CipherEngine::new(black_box(&key));
                black_box(engine);
            });
        });
    }

    group.finish();
}

/// Benchmark deciphering buffers of verse-like sizes.
fn bench_decipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("decipher");
    let key = CipherKey::from("0123456789abcdef");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut data = random_data(size);
            encipher(&key, &mut data);

            b.iter(|| {
                let mut buf = data.clone();
                decipher(&key, black_box(&mut buf));
                black_box(buf);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_key_schedule, bench_decipher);
criterion_main!(benches);
