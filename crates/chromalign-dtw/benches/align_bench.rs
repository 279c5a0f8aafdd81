//! Criterion benchmarks for chromalign-dtw: banded vs. full-band alignment
//! and precomputed vs. lazy cost evaluation.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use chromalign_dtw::{
    Anchor, AlignmentConfig, BandWidth, Frame, Recording, RecordingId,
};

fn make_recording(id: &str, n: usize, offset: f64) -> Recording {
    let frames: Vec<Frame> = (0..n)
        .map(|i| Frame::Scalar((i as f64 * 0.1 + offset).sin() * 100.0 + 200.0))
        .collect();
    Recording::new(RecordingId::new(id.to_string()).unwrap(), frames).unwrap()
}

fn bench_band_widths(c: &mut Criterion) {
    let lengths = [128usize, 512, 2048];
    let bands: &[(BandWidth, &str)] = &[
        (BandWidth::Fraction(1.0), "full"),
        (BandWidth::Scans(32), "scans32"),
        (BandWidth::Scans(8), "scans8"),
    ];

    let mut group = c.benchmark_group("align_band_width");
    for &len in &lengths {
        let a = make_recording("ref", len, 0.0);
        let b = make_recording("query", len, 0.4);
        for &(band, label) in bands {
            let config = AlignmentConfig::new().with_band_width(band);
            let id = BenchmarkId::new(format!("len{len}"), label);
            group.bench_with_input(id, &config, |bencher, config| {
                bencher.iter(|| config.align(&a, &b, &[]).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_cost_modes(c: &mut Criterion) {
    let a = make_recording("ref", 1024, 0.0);
    let b = make_recording("query", 1024, 0.4);

    let mut group = c.benchmark_group("align_cost_mode");
    for (precompute, label) in [(true, "precomputed"), (false, "lazy")] {
        let config = AlignmentConfig::new()
            .with_band_width(BandWidth::Scans(32))
            .with_precompute_costs(precompute);
        group.bench_function(label, |bencher| {
            bencher.iter(|| config.align(&a, &b, &[]).unwrap());
        });
    }
    group.finish();
}

fn bench_anchored(c: &mut Criterion) {
    let a = make_recording("ref", 2048, 0.0);
    let b = make_recording("query", 2048, 0.4);
    let anchors: Vec<Anchor> = (1..8).map(|k| Anchor::new(k * 256, k * 256)).collect();
    let config = AlignmentConfig::new()
        .with_band_width(BandWidth::Scans(16))
        .with_anchor_radius(16)
        .with_min_scan_distance(32);

    c.bench_function("align_anchored_2048_r16", |bencher| {
        bencher.iter(|| config.align(&a, &b, &anchors).unwrap());
    });
}

criterion_group!(benches, bench_band_widths, bench_cost_modes, bench_anchored);
criterion_main!(benches);
