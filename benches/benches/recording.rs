// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use peniko::Color;
use understory_picture::{
    BBoxIndex, BlurStyle, Canvas, CanvasExt, MaskFilter, Paint, Picture, RecordingCanvas,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1_u64 << 53) as f64)
    }
}

/// `n` small rectangles scattered over a 2000×2000 world.
fn scattered_rects(n: usize, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    (0..n)
        .map(|_| {
            let x = rng.next_f64() * 2000.0;
            let y = rng.next_f64() * 2000.0;
            Rect::new(x, y, x + 8.0 + rng.next_f64() * 24.0, y + 8.0 + rng.next_f64() * 24.0)
        })
        .collect()
}

/// Record `rects` the way a widget tree would: nested saves, a transform per
/// group, and the occasional blurred shadow.
fn record(canvas: &mut RecordingCanvas, rects: &[Rect]) {
    let fill = Paint::fill(Color::from_rgb8(0x30, 0x60, 0x90));
    let blurred = fill.clone().with_mask_filter(MaskFilter::blur(BlurStyle::Normal, 2.0));
    for (group, chunk) in rects.chunks(16).enumerate() {
        canvas.save();
        canvas.translate(0.5, 0.5);
        for (i, rect) in chunk.iter().enumerate() {
            let paint = if (group + i) % 7 == 0 { &blurred } else { &fill };
            canvas.draw_rect(*rect, paint);
        }
        canvas.restore();
    }
}

fn recorded(n: usize) -> Picture {
    let rects = scattered_rects(n, 0x5EED_0000_0000_0001);
    let mut canvas = RecordingCanvas::default();
    record(&mut canvas, &rects);
    canvas.end_recording().unwrap()
}

fn bench_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_picture/record");
    for &n in &[256_usize, 4_096] {
        let rects = scattered_rects(n, 0x5EED_0000_0000_0001);
        let mut canvas = RecordingCanvas::default();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &rects, |b, rects| {
            b.iter(|| {
                record(&mut canvas, rects);
                black_box(canvas.end_recording().unwrap())
            });
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_picture/replay");
    let picture = recorded(4_096);
    let mut target = RecordingCanvas::default();

    group.bench_function("full", |b| {
        b.iter(|| {
            picture.replay(&mut target);
            target.reset();
        });
    });
    for &side in &[100.0_f64, 500.0] {
        let cull = Rect::new(800.0, 800.0, 800.0 + side, 800.0 + side);
        group.bench_with_input(BenchmarkId::new("culled", side), &cull, |b, cull| {
            b.iter(|| {
                picture.replay_culled(&mut target, *cull);
                target.reset();
            });
        });
    }
    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_picture/bbox_index");
    let rects = scattered_rects(16_384, 0xC1A5_7E55_9999_ABCD);
    group.bench_function("insert_16k", |b| {
        b.iter(|| {
            let mut index = BBoxIndex::new();
            for (i, rect) in rects.iter().enumerate() {
                index.insert(*rect, i as u32);
            }
            black_box(index)
        });
    });

    let mut index = BBoxIndex::new();
    for (i, rect) in rects.iter().enumerate() {
        index.insert(*rect, i as u32);
    }
    let viewport = Rect::new(600.0, 600.0, 1400.0, 1200.0);
    group.bench_function("query_viewport", |b| {
        b.iter(|| black_box(index.query(black_box(viewport))));
    });
    group.finish();
}

criterion_group!(benches, bench_recording, bench_replay, bench_index);
criterion_main!(benches);
