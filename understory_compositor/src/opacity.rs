// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Vec2};
use peniko::Color;
use understory_picture::Paint;
use understory_picture::geometry::{pixel_aligned, shift_rect};

use crate::container::{ContainerLayer, delegate_container};
use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};

/// Composites its children as a group at a uniform alpha.
///
/// Children are drawn opaquely into an offscreen layer first, so overlapping
/// children blend with each other normally and only the group is faded.
#[derive(Debug)]
pub struct OpacityLayer {
    container: ContainerLayer,
    alpha: u8,
    offset: Vec2,
}

impl OpacityLayer {
    /// Create an opacity layer drawing its children at `offset`.
    pub fn new(alpha: u8, offset: Vec2) -> Self {
        Self {
            container: ContainerLayer::new(),
            alpha,
            offset,
        }
    }

    /// Group alpha, `255` being opaque.
    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Unscaled offset applied before the children.
    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

delegate_container!(OpacityLayer);

impl Layer for OpacityLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let child_matrix = matrix * Affine::translate(self.offset);
        let child_cull = shift_rect(context.cull_rect(), -self.offset);
        let mut local = context.replace_cull_rect(child_cull);
        let child_bounds = self.container.preroll_children(&mut local, child_matrix);
        drop(local);
        self.container
            .base_mut()
            .set_paint_bounds(shift_rect(child_bounds, self.offset));
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        let layer_bounds = shift_rect(self.paint_bounds(), -self.offset).expand();
        let tint = Paint::fill(Color::from_rgba8(255, 255, 255, self.alpha));

        context.canvas.save();
        context.canvas.translate(self.offset.x, self.offset.y);
        let aligned = pixel_aligned(context.canvas.total_matrix());
        context.canvas.set_matrix(aligned);
        context.canvas.save_layer(layer_bounds, &tint);
        self.container.paint_children(context);
        context.canvas.restore();
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}
