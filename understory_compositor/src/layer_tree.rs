// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Size};

use crate::compositor_context::ScopedFrame;
use crate::layer::{Layer, LayerId, PaintContext, PrerollContext, paint_layer, preroll_layer};

/// A frame's layer hierarchy plus the metadata needed to present it.
///
/// Trees are built fresh for every frame and handed to a
/// [`Rasterizer`](crate::Rasterizer) as a unit.
#[derive(Debug)]
pub struct LayerTree {
    root: Box<dyn Layer>,
    frame_size: Size,
    device_pixel_ratio: f64,
    anti_aliasing: u32,
}

impl LayerTree {
    /// Create a tree presenting `root` on a `frame_size` surface.
    pub fn new(root: Box<dyn Layer>, frame_size: Size, device_pixel_ratio: f64) -> Self {
        Self {
            root,
            frame_size,
            device_pixel_ratio,
            anti_aliasing: 0,
        }
    }

    /// Set the anti-aliasing sample count requested from the surface.
    pub fn with_anti_aliasing(mut self, samples: u32) -> Self {
        self.anti_aliasing = samples;
        self
    }

    /// The root layer.
    #[inline]
    pub fn root(&self) -> &dyn Layer {
        &*self.root
    }

    /// Size of the surface frame, in device pixels.
    #[inline]
    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    /// Device pixels per logical pixel.
    #[inline]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Anti-aliasing sample count.
    #[inline]
    pub fn anti_aliasing(&self) -> u32 {
        self.anti_aliasing
    }

    /// Compute bounds for every layer, consulting the frame's raster cache
    /// unless `ignore_raster_cache` is set.
    pub fn preroll(&mut self, frame: &mut ScopedFrame<'_>, ignore_raster_cache: bool) {
        let (raster_cache, raster_time) = frame.preroll_parts(ignore_raster_cache);
        let mut context = PrerollContext::new(
            raster_cache,
            self.device_pixel_ratio,
            self.anti_aliasing,
            raster_time,
        );
        preroll_layer(&mut *self.root, &mut context, Affine::IDENTITY);
    }

    /// Paint the tree into the frame canvas if the root has anything to draw.
    pub fn paint(&mut self, frame: &mut ScopedFrame<'_>, ignore_raster_cache: bool) {
        if !self.root.needs_painting() {
            tracing::trace!(root = ?self.root.base().id(), "layer tree has nothing to paint");
            return;
        }
        let (canvas, raster_cache, raster_time, engine_time) =
            frame.paint_parts(ignore_raster_cache);
        let mut context = PaintContext {
            canvas,
            raster_cache,
            raster_time,
            engine_time,
        };
        paint_layer(&mut *self.root, &mut context);
    }

    /// Find the layer with `id`.
    pub fn find(&self, id: LayerId) -> Option<&dyn Layer> {
        find_in(&*self.root, id)
    }

    /// Find the container holding the layer with `id`.
    pub fn parent_of(&self, id: LayerId) -> Option<&dyn Layer> {
        let parent = self.find(id)?.base().parent()?;
        self.find(parent)
    }
}

fn find_in(layer: &dyn Layer, id: LayerId) -> Option<&dyn Layer> {
    if layer.base().id() == id {
        return Some(layer);
    }
    layer
        .children()
        .iter()
        .find_map(|child| find_in(&**child, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerLayer;
    use crate::transform::TransformLayer;

    #[test]
    fn navigation_by_id() {
        let inner = ContainerLayer::new();
        let inner_id = inner.base().id();
        let middle = TransformLayer::new(Affine::scale(2.0)).with_child(Box::new(inner));
        let middle_id = middle.base().id();
        let root = ContainerLayer::new().with_child(Box::new(middle));
        let root_id = root.base().id();
        let tree = LayerTree::new(Box::new(root), Size::new(100.0, 100.0), 1.0);

        assert_eq!(tree.find(inner_id).map(|l| l.base().id()), Some(inner_id));
        assert_eq!(
            tree.parent_of(inner_id).map(|l| l.base().id()),
            Some(middle_id)
        );
        assert_eq!(
            tree.parent_of(middle_id).map(|l| l.base().id()),
            Some(root_id)
        );
        assert!(tree.parent_of(root_id).is_none());
        assert!(tree.find(LayerId(u64::MAX)).is_none());
    }
}
