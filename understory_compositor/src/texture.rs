// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::sync::Arc;

use kurbo::{Affine, Rect, Size, Vec2};
use understory_picture::geometry::{intersect_or_empty, is_empty_rect};
use understory_picture::{Image, Paint};

use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};

/// A texture produced outside the compositor (video, camera, platform view).
pub trait ExternalTexture: fmt::Debug {
    /// The most recently published frame, or `None` if nothing has been
    /// published yet.
    fn latest_image(&self) -> Option<Image>;
}

/// Draws the current frame of an [`ExternalTexture`].
#[derive(Debug)]
pub struct TextureLayer {
    base: LayerBase,
    offset: Vec2,
    size: Size,
    texture: Arc<dyn ExternalTexture>,
}

impl TextureLayer {
    /// Create a layer drawing `texture` into the rectangle at `offset` of `size`.
    pub fn new(texture: Arc<dyn ExternalTexture>, offset: Vec2, size: Size) -> Self {
        Self {
            base: LayerBase::new(),
            offset,
            size,
            texture,
        }
    }

    fn rect(&self) -> Rect {
        Rect::from_origin_size(self.offset.to_point(), self.size)
    }
}

impl Layer for TextureLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, _matrix: Affine) {
        let rect = self.rect();
        let visible = !is_empty_rect(intersect_or_empty(rect, context.cull_rect()));
        self.base
            .set_paint_bounds(if visible { rect } else { Rect::ZERO });
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        let Some(image) = self.texture.latest_image() else {
            tracing::trace!(layer = ?self.base.id(), "texture has no frame yet");
            return;
        };
        context
            .canvas
            .draw_image_rect(&image, None, self.rect(), &Paint::default());
    }
}
