// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

use kurbo::Size;
use understory_picture::Canvas;

use crate::raster_cache::PictureRasterizer;

/// A render target that hands out one frame at a time.
pub trait Surface: fmt::Debug {
    /// Acquire a frame of `size` device pixels.
    ///
    /// Returns `None` while the surface is not ready (for example during a
    /// resize). The frame is released when it is submitted or dropped.
    fn acquire_frame(
        &mut self,
        size: Size,
        device_pixel_ratio: f64,
        anti_aliasing: u32,
    ) -> Option<Box<dyn SurfaceFrame + '_>>;

    /// A rasterizer for filling raster cache entries on this surface's GPU
    /// context, if it has one.
    fn create_picture_rasterizer(&mut self) -> Option<Box<dyn PictureRasterizer>> {
        None
    }
}

/// One acquired frame of a [`Surface`].
pub trait SurfaceFrame {
    /// Canvas targeting the frame.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Present the frame. Returns `false` if the surface rejected it.
    fn submit(self: Box<Self>) -> bool;
}
