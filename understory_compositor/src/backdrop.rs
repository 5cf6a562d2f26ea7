// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;
use understory_picture::{ImageFilter, Paint};

use crate::container::{ContainerLayer, delegate_container};
use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};

/// Filters the content already drawn beneath it, then draws its children on
/// top (a frosted-glass effect, for example).
///
/// Bounds are the children's bounds: the filter samples outward from the
/// painted area but does not extend it.
#[derive(Debug)]
pub struct BackdropFilterLayer {
    container: ContainerLayer,
    filter: ImageFilter,
}

impl BackdropFilterLayer {
    /// Create a backdrop filter layer with no children.
    pub fn new(filter: ImageFilter) -> Self {
        Self {
            container: ContainerLayer::new(),
            filter,
        }
    }

    /// The filter applied to the backdrop.
    #[inline]
    pub fn filter(&self) -> ImageFilter {
        self.filter
    }
}

delegate_container!(BackdropFilterLayer);

impl Layer for BackdropFilterLayer {
    fn base(&self) -> &LayerBase {
        self.container.base()
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        self.container.base_mut()
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let bounds = self.container.preroll_children(context, matrix);
        self.container.base_mut().set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        let paint = Paint::default().with_backdrop(self.filter);
        context.canvas.save_layer(self.paint_bounds(), &paint);
        self.container.paint_children(context);
        context.canvas.restore();
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        self.container.layers()
    }
}
