// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_compositor --heading-base-level=0

//! Understory Compositor: per-frame layer trees over recorded pictures.
//!
//! Widget code records [`Picture`](understory_picture::Picture)s and arranges
//! them in a tree of [`Layer`]s. Each frame, a [`Rasterizer`] walks that
//! [`LayerTree`] in two passes:
//!
//! - **Preroll** computes every layer's paint bounds, culls layers outside
//!   the visible area, and asks the [`RasterCache`] for bitmaps of pictures
//!   that are expensive to replay.
//! - **Paint** issues draw calls for the layers that have something to show,
//!   blitting cached bitmaps where available.
//!
//! The painted frame is flattened into a picture, replayed onto a frame of
//! the installed [`Surface`] and submitted. When the surface is not ready the
//! frame is skipped and the previous one stays on screen.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Affine, Rect, Size, Vec2};
//! use peniko::Color;
//! use understory_compositor::{
//!     ContainerLayer, CompositorContext, Layer, LayerTree, PictureLayer, TransformLayer,
//! };
//! use understory_picture::{CanvasExt, Paint, RecordingCanvas};
//!
//! let mut canvas = RecordingCanvas::default();
//! canvas.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::fill(Color::WHITE));
//! let picture = canvas.end_recording().unwrap();
//!
//! let root = ContainerLayer::new().with_child(Box::new(
//!     TransformLayer::new(Affine::scale(2.0))
//!         .with_child(Box::new(PictureLayer::new(picture, Vec2::new(5.0, 0.0)))),
//! ));
//! let mut tree = LayerTree::new(Box::new(root), Size::new(100.0, 100.0), 1.0);
//!
//! let mut context = CompositorContext::default();
//! let mut target = RecordingCanvas::default();
//! let mut frame = context.acquire_frame(&mut target);
//! tree.preroll(&mut frame, false);
//! assert_eq!(tree.root().paint_bounds(), Rect::new(10.0, 0.0, 30.0, 20.0));
//! tree.paint(&mut frame, false);
//! ```

mod backdrop;
mod clip;
mod compositor_context;
mod container;
mod error;
mod layer;
mod layer_tree;
mod opacity;
mod performance_overlay;
mod picture_layer;
mod raster_cache;
mod rasterizer;
mod stopwatch;
mod surface;
mod texture;
mod transform;

pub use backdrop::BackdropFilterLayer;
pub use clip::{ClipPathLayer, ClipRRectLayer, ClipRectLayer};
pub use compositor_context::{CompositorContext, ScopedFrame};
pub use container::ContainerLayer;
pub use error::RasterError;
pub use layer::{
    CullGuard, Layer, LayerBase, LayerId, LayerPhase, PaintContext, PrerollContext, paint_layer,
    preroll_layer,
};
pub use layer_tree::LayerTree;
pub use opacity::OpacityLayer;
pub use performance_overlay::{PerformanceOverlayLayer, PerformanceOverlayOptions};
pub use picture_layer::PictureLayer;
pub use raster_cache::{
    PictureRasterizer, RasterCache, RasterCacheConfig, RasterCacheResult, RasterCacheStats,
};
pub use rasterizer::{RasterStatus, Rasterizer};
pub use stopwatch::{FRAME_BUDGET, SAMPLE_COUNT, Stopwatch};
pub use surface::{Surface, SurfaceFrame};
pub use texture::{ExternalTexture, TextureLayer};
pub use transform::TransformLayer;
