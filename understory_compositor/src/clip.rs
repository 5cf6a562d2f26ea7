// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip layers.
//!
//! All three clip layers cull using the clip shape's bounding rectangle.
//! Paint-time clipping is exact for the shape.

use kurbo::{Affine, Rect, RoundedRect};
use understory_picture::Path;
use understory_picture::geometry::{intersect_or_empty, is_empty_rect};

use crate::container::{ContainerLayer, delegate_container};
use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};

/// Shared preroll for clip layers: narrow culling to `clip_bounds` and
/// intersect the children's bounds with it.
fn preroll_clipped(
    container: &mut ContainerLayer,
    context: &mut PrerollContext<'_>,
    matrix: Affine,
    clip_bounds: Rect,
) -> Rect {
    let mut narrowed = context.narrow_cull_rect(clip_bounds);
    if is_empty_rect(narrowed.cull_rect()) {
        tracing::trace!(layer = ?container.base().id(), "clip culled all children");
        return Rect::ZERO;
    }
    let child_bounds = container.preroll_children(&mut narrowed, matrix);
    intersect_or_empty(child_bounds, clip_bounds)
}

/// Clips its children to a rectangle.
#[derive(Debug)]
pub struct ClipRectLayer {
    container: ContainerLayer,
    clip: Rect,
}

impl ClipRectLayer {
    /// Create a clip layer with no children.
    pub fn new(clip: Rect) -> Self {
        Self {
            container: ContainerLayer::new(),
            clip,
        }
    }

    /// The clip rectangle in local coordinates.
    #[inline]
    pub fn clip(&self) -> Rect {
        self.clip
    }
}

delegate_container!(ClipRectLayer);

impl Layer for ClipRectLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let bounds = preroll_clipped(&mut self.container, context, matrix, self.clip);
        self.container.base_mut().set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        context.canvas.save();
        context.canvas.clip_rect(self.clip);
        self.container.paint_children(context);
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}

/// Clips its children to a rounded rectangle.
#[derive(Debug)]
pub struct ClipRRectLayer {
    container: ContainerLayer,
    clip: RoundedRect,
}

impl ClipRRectLayer {
    /// Create a clip layer with no children.
    pub fn new(clip: RoundedRect) -> Self {
        Self {
            container: ContainerLayer::new(),
            clip,
        }
    }

    /// The clip shape in local coordinates.
    #[inline]
    pub fn clip(&self) -> RoundedRect {
        self.clip
    }
}

delegate_container!(ClipRRectLayer);

impl Layer for ClipRRectLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let bounds = preroll_clipped(&mut self.container, context, matrix, self.clip.rect());
        self.container.base_mut().set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        context.canvas.save();
        context.canvas.clip_rrect(self.clip);
        self.container.paint_children(context);
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}

/// Clips its children to an arbitrary path.
#[derive(Debug)]
pub struct ClipPathLayer {
    container: ContainerLayer,
    clip: Path,
}

impl ClipPathLayer {
    /// Create a clip layer with no children.
    pub fn new(clip: Path) -> Self {
        Self {
            container: ContainerLayer::new(),
            clip,
        }
    }

    /// The clip path in local coordinates.
    #[inline]
    pub fn clip(&self) -> &Path {
        &self.clip
    }
}

delegate_container!(ClipPathLayer);

impl Layer for ClipPathLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let clip_bounds = self.clip.bounds();
        let bounds = preroll_clipped(&mut self.container, context, matrix, clip_bounds);
        self.container.base_mut().set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        context.canvas.save();
        context.canvas.clip_path(&self.clip);
        self.container.paint_children(context);
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}
