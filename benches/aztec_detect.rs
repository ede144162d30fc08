use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_aztec::{detect, BitMatrix};

/// Build a synthetic image with a compact-looking concentric ring structure
/// at its center, large enough to exercise the labeler and ray-tracing
/// stages even though it won't pass full mode-message decoding.
fn synthetic_rings(size: usize) -> BitMatrix {
    let mut matrix = BitMatrix::new(size, size);
    let cx = size as i32 / 2;
    let cy = size as i32 / 2;

    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let dx = (x - cx).abs();
            let dy = (y - cy).abs();
            let ring = dx.max(dy) / 3;
            matrix.set(x as usize, y as usize, ring % 2 == 0);
        }
    }
    matrix
}

fn bench_detect(c: &mut Criterion) {
    let small = synthetic_rings(64);
    let large = synthetic_rings(512);

    c.bench_function("detect_64x64", |b| {
        b.iter(|| {
            let _ = detect(black_box(&small));
        })
    });

    c.bench_function("detect_512x512", |b| {
        b.iter(|| {
            let _ = detect(black_box(&large));
        })
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
