use umac::{Umac128, Umac64};

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

pub fn bench_umac64(c: &mut Criterion) {
    let mut mac = Umac64::new(b"abcdefghijklmnop");
    let short = [0u8; 32];
    let long = [0u8; 1024];

    c.bench_function("umac64 32 bytes", |b| {
        b.iter(|| {
            mac.write(black_box(&short));
            let tag = mac.sum(b"abcdefgh");
            mac.reset();
            tag
        })
    });

    let mut mac = Umac64::new(b"abcdefghijklmnop");
    c.bench_function("umac64 1024 bytes", |b| {
        b.iter(|| {
            mac.write(black_box(&long));
            let tag = mac.sum(b"abcdefgh");
            mac.reset();
            tag
        })
    });
}

pub fn bench_umac128(c: &mut Criterion) {
    let mut mac = Umac128::new(b"abcdefghijklmnop");
    let short = [0u8; 32];
    let long = [0u8; 1024];

    c.bench_function("umac128 32 bytes", |b| {
        b.iter(|| {
            mac.write(black_box(&short));
            let tag = mac.sum(b"abcdefgh");
            mac.reset();
            tag
        })
    });

    let mut mac = Umac128::new(b"abcdefghijklmnop");
    c.bench_function("umac128 1024 bytes", |b| {
        b.iter(|| {
            mac.write(black_box(&long));
            let tag = mac.sum(b"abcdefgh");
            mac.reset();
            tag
        })
    });
}

criterion_group!(benches, bench_umac64, bench_umac128);
criterion_main!(benches);
