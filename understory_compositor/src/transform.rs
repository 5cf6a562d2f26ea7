// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;
use understory_picture::geometry::{LARGEST_RECT, map_rect};

use crate::container::{ContainerLayer, delegate_container};
use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};

/// Applies a transform to its children.
#[derive(Debug)]
pub struct TransformLayer {
    container: ContainerLayer,
    transform: Affine,
}

impl TransformLayer {
    /// Create a transform layer with no children.
    pub fn new(transform: Affine) -> Self {
        Self {
            container: ContainerLayer::new(),
            transform,
        }
    }

    /// The transform from child space to this layer's parent space.
    #[inline]
    pub fn transform(&self) -> Affine {
        self.transform
    }
}

delegate_container!(TransformLayer);

impl Layer for TransformLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let child_matrix = matrix * self.transform;
        let det = self.transform.determinant();
        let child_cull = if det.abs() > f64::EPSILON && det.is_finite() {
            map_rect(self.transform.inverse(), context.cull_rect())
        } else {
            LARGEST_RECT
        };
        let mut local = context.replace_cull_rect(child_cull);
        let child_bounds = self.container.preroll_children(&mut local, child_matrix);
        drop(local);
        self.container
            .base_mut()
            .set_paint_bounds(map_rect(self.transform, child_bounds));
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        context.canvas.save();
        context.canvas.concat(self.transform);
        self.container.paint_children(context);
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}
