// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use kurbo::{Affine, Rect, Vec2};
use understory_picture::Picture;
use understory_picture::geometry::{
    intersect_or_empty, is_empty_rect, pixel_aligned, shift_rect,
};

use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};
use crate::raster_cache::RasterCacheResult;

/// Draws a recorded picture, through the raster cache when worthwhile.
#[derive(Debug)]
pub struct PictureLayer {
    base: LayerBase,
    picture: Picture,
    offset: Vec2,
    is_complex: bool,
    will_change: bool,
    cached: Option<Arc<RasterCacheResult>>,
}

impl PictureLayer {
    /// Create a layer drawing `picture` at `offset`.
    pub fn new(picture: Picture, offset: Vec2) -> Self {
        Self {
            base: LayerBase::new(),
            picture,
            offset,
            is_complex: false,
            will_change: false,
            cached: None,
        }
    }

    /// Hint that the picture is stable and expensive, so worth caching early.
    pub fn with_complex(mut self, is_complex: bool) -> Self {
        self.is_complex = is_complex;
        self
    }

    /// Hint that the picture changes every frame, so never worth caching.
    pub fn with_will_change(mut self, will_change: bool) -> Self {
        self.will_change = will_change;
        self
    }

    /// The drawn picture.
    #[inline]
    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    /// Offset of the picture in the parent's coordinates.
    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Cache result obtained by the last preroll, if any.
    #[inline]
    pub fn cached(&self) -> Option<&Arc<RasterCacheResult>> {
        self.cached.as_ref()
    }
}

impl Layer for PictureLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        self.cached = None;
        let bounds = shift_rect(self.picture.paint_bounds(), self.offset);
        if is_empty_rect(intersect_or_empty(bounds, context.cull_rect())) {
            tracing::trace!(layer = ?self.base.id(), "picture culled");
            self.base.set_paint_bounds(Rect::ZERO);
            return;
        }

        if let Some(cache) = context.raster_cache.as_deref_mut() {
            let ctm = pixel_aligned(matrix * Affine::translate(self.offset));
            self.cached = cache.get_prerolled_image(
                &self.picture,
                ctm,
                context.device_pixel_ratio,
                context.anti_aliasing,
                self.is_complex,
                self.will_change,
            );
        }
        self.base.set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        let canvas = &mut *context.canvas;
        canvas.save();
        canvas.translate(self.offset.x, self.offset.y);
        let aligned = pixel_aligned(canvas.total_matrix());
        canvas.set_matrix(aligned);

        match (&self.cached, context.raster_cache) {
            (Some(result), Some(_)) if result.matches(aligned) => result.draw(canvas),
            _ => canvas.draw_picture(&self.picture),
        }
        canvas.restore();
    }
}
