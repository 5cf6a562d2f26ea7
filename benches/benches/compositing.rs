// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Affine, Rect, Size, Vec2};
use peniko::Color;
use understory_compositor::{
    ClipRectLayer, CompositorContext, ContainerLayer, LayerTree, OpacityLayer, PictureLayer,
    PictureRasterizer, RasterCacheConfig, TransformLayer,
};
use understory_picture::{CanvasExt, Image, Paint, Picture, RecordingCanvas};

#[derive(Debug)]
struct NullRasterizer;

impl PictureRasterizer for NullRasterizer {
    fn rasterize(
        &mut self,
        _picture: &Picture,
        _matrix: Affine,
        device_rect: Rect,
        _anti_aliasing: u32,
    ) -> Option<Image> {
        Some(Image::new(
            device_rect.width() as u32,
            device_rect.height() as u32,
        ))
    }
}

fn tile_picture(ops: usize) -> Picture {
    let mut canvas = RecordingCanvas::default();
    let paint = Paint::fill(Color::from_rgb8(0x44, 0x88, 0xcc));
    for i in 0..ops {
        let inset = (i % 8) as f64;
        canvas.draw_rect(Rect::new(inset, inset, 64.0 - inset, 64.0 - inset), &paint);
    }
    canvas.end_recording().unwrap()
}

/// A grid of `side`×`side` tiles, each a picture under a clip and a
/// translation, with every fourth tile faded.
fn tile_tree(side: usize, picture: &Picture) -> LayerTree {
    let mut root = ContainerLayer::new();
    for y in 0..side {
        for x in 0..side {
            let origin = Vec2::new(x as f64 * 72.0, y as f64 * 72.0);
            let tile = PictureLayer::new(picture.clone(), Vec2::ZERO);
            let clipped =
                ClipRectLayer::new(Rect::new(0.0, 0.0, 64.0, 64.0)).with_child(Box::new(tile));
            let placed = TransformLayer::new(Affine::translate(origin));
            if (x + y) % 4 == 0 {
                let faded = OpacityLayer::new(160, Vec2::ZERO).with_child(Box::new(clipped));
                root.add(Box::new(placed.with_child(Box::new(faded))));
            } else {
                root.add(Box::new(placed.with_child(Box::new(clipped))));
            }
        }
    }
    LayerTree::new(Box::new(root), Size::new(1920.0, 1080.0), 1.0)
}

fn frame(context: &mut CompositorContext, tree: &mut LayerTree, ignore_cache: bool) -> Picture {
    let mut canvas = RecordingCanvas::default();
    {
        let mut frame = context.acquire_frame(&mut canvas);
        tree.preroll(&mut frame, ignore_cache);
        tree.paint(&mut frame, ignore_cache);
    }
    canvas.end_recording().unwrap()
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_compositor/frame");
    let picture = tile_picture(32);
    for &side in &[8_usize, 24] {
        let mut tree = tile_tree(side, &picture);

        let mut context = CompositorContext::new(RasterCacheConfig::default());
        group.bench_function(BenchmarkId::new("replay", side * side), |b| {
            b.iter(|| black_box(frame(&mut context, &mut tree, true)));
        });

        let mut cached = CompositorContext::new(RasterCacheConfig::default());
        cached.on_gr_context_created(Some(Box::new(NullRasterizer)));
        // Warm the cache past its access threshold.
        for _ in 0..cached.raster_cache().config().access_threshold {
            frame(&mut cached, &mut tree, false);
        }
        group.bench_function(BenchmarkId::new("cached", side * side), |b| {
            b.iter(|| black_box(frame(&mut cached, &mut tree, false)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
