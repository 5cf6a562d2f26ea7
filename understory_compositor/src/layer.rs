// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer contract: a two-phase (preroll, paint) tree node.
//!
//! ## Phases
//!
//! Each frame, every layer moves through [`LayerPhase::Unrolled`] →
//! [`LayerPhase::Prerolled`] → [`LayerPhase::Painted`]:
//!
//! - **Preroll** computes the layer's paint bounds in its parent's coordinate
//!   space and may consult the raster cache. Layers may narrow the ambient
//!   cull rectangle for their descendants through [`PrerollContext::narrow_cull_rect`],
//!   which hands back a guard that restores the previous rectangle when it is
//!   dropped, so siblings never observe a narrowed rectangle.
//! - **Paint** issues draw calls against the frame canvas. Only layers that
//!   were prerolled this frame and have non-empty bounds are painted.
//!
//! Phase transitions are driven by [`preroll_layer`] and [`paint_layer`];
//! containers and the layer tree always go through these rather than calling
//! [`Layer::preroll`] and [`Layer::paint`] directly.

use core::ops::{Deref, DerefMut};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Affine, Rect};
use understory_picture::Canvas;
use understory_picture::geometry::{LARGEST_RECT, intersect_or_empty, is_empty_rect};

use crate::raster_cache::RasterCache;
use crate::stopwatch::Stopwatch;

/// Process-unique identity of a layer.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl LayerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a layer is in its per-frame lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LayerPhase {
    /// Not yet prerolled this frame.
    #[default]
    Unrolled,
    /// Bounds are computed; the layer may be painted.
    Prerolled,
    /// Painted; the layer is done for this frame.
    Painted,
}

/// State shared by every layer.
#[derive(Clone, Debug)]
pub struct LayerBase {
    id: LayerId,
    parent: Option<LayerId>,
    paint_bounds: Rect,
    phase: LayerPhase,
}

impl Default for LayerBase {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerBase {
    /// Fresh state with a new id, no parent, and empty bounds.
    pub fn new() -> Self {
        Self {
            id: LayerId::next(),
            parent: None,
            paint_bounds: Rect::ZERO,
            phase: LayerPhase::Unrolled,
        }
    }

    /// Identity of the layer.
    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Id of the container holding this layer, if any.
    ///
    /// This is a navigation hint only; containers own their children.
    #[inline]
    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<LayerId>) {
        self.parent = parent;
    }

    /// Bounds computed by the last preroll, in the parent's coordinates.
    #[inline]
    pub fn paint_bounds(&self) -> Rect {
        self.paint_bounds
    }

    /// Set the bounds; called by layers from their preroll.
    #[inline]
    pub fn set_paint_bounds(&mut self, bounds: Rect) {
        self.paint_bounds = bounds;
    }

    /// Current lifecycle phase.
    #[inline]
    pub fn phase(&self) -> LayerPhase {
        self.phase
    }
}

/// A node of the per-frame compositing tree.
pub trait Layer: fmt::Debug {
    /// Shared layer state.
    fn base(&self) -> &LayerBase;

    /// Mutable shared layer state.
    fn base_mut(&mut self) -> &mut LayerBase;

    /// Compute paint bounds under `matrix` (parent space to device space).
    ///
    /// Implementations must record their bounds with
    /// [`LayerBase::set_paint_bounds`]. Any narrowing of the cull rectangle
    /// must be scoped to this call.
    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine);

    /// Issue draw calls for this layer.
    fn paint(&mut self, context: &mut PaintContext<'_>);

    /// Child layers, for navigation. Leaves have none.
    fn children(&self) -> &[Box<dyn Layer>] {
        &[]
    }

    /// Bounds computed by the last preroll.
    fn paint_bounds(&self) -> Rect {
        self.base().paint_bounds()
    }

    /// Whether paint should be called this frame.
    fn needs_painting(&self) -> bool {
        !is_empty_rect(self.paint_bounds())
    }
}

/// Preroll `layer` and mark it prerolled.
pub fn preroll_layer(layer: &mut dyn Layer, context: &mut PrerollContext<'_>, matrix: Affine) {
    layer.preroll(context, matrix);
    layer.base_mut().phase = LayerPhase::Prerolled;
}

/// Paint `layer` if it was prerolled and needs painting, and mark it painted.
pub fn paint_layer(layer: &mut dyn Layer, context: &mut PaintContext<'_>) {
    let phase = layer.base().phase();
    debug_assert!(
        phase == LayerPhase::Prerolled,
        "layer {:?} painted in phase {phase:?}",
        layer.base().id()
    );
    debug_assert!(
        layer.needs_painting(),
        "layer {:?} painted with empty bounds",
        layer.base().id()
    );
    if phase != LayerPhase::Prerolled || !layer.needs_painting() {
        return;
    }
    layer.paint(context);
    layer.base_mut().phase = LayerPhase::Painted;
}

/// Ambient state for the preroll walk.
#[derive(Debug)]
pub struct PrerollContext<'a> {
    /// Raster cache to consult, unless caching is bypassed this frame.
    pub raster_cache: Option<&'a mut RasterCache>,
    /// Device pixels per logical pixel.
    pub device_pixel_ratio: f64,
    /// Anti-aliasing sample count of the target surface.
    pub anti_aliasing: u32,
    /// Timing of recent rasterized frames.
    pub raster_time: &'a Stopwatch,
    cull_rect: Rect,
}

impl<'a> PrerollContext<'a> {
    /// A context with an unbounded cull rectangle.
    pub fn new(
        raster_cache: Option<&'a mut RasterCache>,
        device_pixel_ratio: f64,
        anti_aliasing: u32,
        raster_time: &'a Stopwatch,
    ) -> Self {
        Self {
            raster_cache,
            device_pixel_ratio,
            anti_aliasing,
            raster_time,
            cull_rect: LARGEST_RECT,
        }
    }

    /// Cull rectangle in the current layer's local coordinates.
    #[inline]
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Intersect the cull rectangle with `rect` until the guard drops.
    pub fn narrow_cull_rect(&mut self, rect: Rect) -> CullGuard<'_, 'a> {
        let next = intersect_or_empty(self.cull_rect, rect);
        self.replace_cull_rect(next)
    }

    /// Replace the cull rectangle until the guard drops.
    ///
    /// Used when descending into a different coordinate space.
    pub fn replace_cull_rect(&mut self, rect: Rect) -> CullGuard<'_, 'a> {
        let saved = core::mem::replace(&mut self.cull_rect, rect);
        CullGuard {
            context: self,
            saved,
        }
    }
}

/// Restores the previous cull rectangle when dropped.
#[derive(Debug)]
pub struct CullGuard<'g, 'a> {
    context: &'g mut PrerollContext<'a>,
    saved: Rect,
}

impl<'a> Deref for CullGuard<'_, 'a> {
    type Target = PrerollContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for CullGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for CullGuard<'_, '_> {
    fn drop(&mut self) {
        self.context.cull_rect = self.saved;
    }
}

/// Ambient state for the paint walk.
pub struct PaintContext<'a> {
    /// Canvas receiving the frame's draw calls.
    pub canvas: &'a mut dyn Canvas,
    /// Raster cache whose prerolled results may be drawn, unless bypassed.
    pub raster_cache: Option<&'a RasterCache>,
    /// Timing of recent rasterized frames.
    pub raster_time: &'a Stopwatch,
    /// Timing of recent engine (layout and recording) frames.
    pub engine_time: &'a Stopwatch,
}

impl fmt::Debug for PaintContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintContext")
            .field("raster_cache", &self.raster_cache.is_some())
            .field("raster_time", &self.raster_time)
            .field("engine_time", &self.engine_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cull_guard_restores_on_drop() {
        let time = Stopwatch::new();
        let mut ctx = PrerollContext::new(None, 1.0, 0, &time);
        {
            let mut narrowed = ctx.narrow_cull_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
            assert_eq!(narrowed.cull_rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
            {
                let inner = narrowed.narrow_cull_rect(Rect::new(20.0, 20.0, 30.0, 30.0));
                assert!(is_empty_rect(inner.cull_rect()));
            }
            assert_eq!(narrowed.cull_rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
        }
        assert_eq!(ctx.cull_rect(), LARGEST_RECT);
    }

    #[test]
    fn base_ids_are_unique() {
        let a = LayerBase::new();
        let b = LayerBase::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.phase(), LayerPhase::Unrolled);
        assert_eq!(a.parent(), None);
    }
}
