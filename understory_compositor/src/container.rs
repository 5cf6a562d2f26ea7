// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect};
use understory_picture::geometry::union_non_empty;

use crate::layer::{
    Layer, LayerBase, PaintContext, PrerollContext, paint_layer, preroll_layer,
};

/// A layer that owns an ordered list of children.
///
/// Other container layers (clips, opacity, transforms, backdrop filters)
/// embed a `ContainerLayer` and wrap its child walk with their own effect.
#[derive(Debug, Default)]
pub struct ContainerLayer {
    base: LayerBase,
    children: Vec<Box<dyn Layer>>,
}

impl ContainerLayer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child, recording this container as its parent.
    pub fn add(&mut self, mut child: Box<dyn Layer>) {
        child.base_mut().set_parent(Some(self.base.id()));
        self.children.push(child);
    }

    /// Builder form of [`add`](Self::add).
    pub fn with_child(mut self, child: Box<dyn Layer>) -> Self {
        self.add(child);
        self
    }

    /// Preroll every child under the same `matrix` and return the union of
    /// their bounds.
    ///
    /// Empty child bounds never contribute: the first non-empty bound seeds
    /// the union.
    pub fn preroll_children(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) -> Rect {
        let mut bounds = Rect::ZERO;
        for child in &mut self.children {
            preroll_layer(child.as_mut(), context, matrix);
            bounds = union_non_empty(bounds, child.paint_bounds());
        }
        bounds
    }

    /// Paint, in order, the children that need painting.
    pub fn paint_children(&mut self, context: &mut PaintContext<'_>) {
        for child in &mut self.children {
            if child.needs_painting() {
                paint_layer(child.as_mut(), context);
            }
        }
    }

    /// Child layers.
    #[inline]
    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.children
    }
}

impl Layer for ContainerLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn preroll(&mut self, context: &mut PrerollContext<'_>, matrix: Affine) {
        let bounds = self.preroll_children(context, matrix);
        self.base.set_paint_bounds(bounds);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        self.paint_children(context);
    }

    fn children(&self) -> &[Box<dyn Layer>] {
        &self.children
    }
}

/// Forward the [`Layer`] plumbing of a type that embeds a `ContainerLayer`
/// in a field named `container`.
macro_rules! delegate_container {
    ($ty:ty) => {
        impl $ty {
            /// Append a child layer.
            pub fn add(&mut self, child: Box<dyn $crate::Layer>) {
                self.container.add(child);
            }

            /// Builder form of `add`.
            pub fn with_child(mut self, child: Box<dyn $crate::Layer>) -> Self {
                self.container.add(child);
                self
            }
        }
    };
}

pub(crate) use delegate_container;
