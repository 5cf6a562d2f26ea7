// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-rasterizer compositing state and the per-frame scope over it.

use std::fmt;

use understory_picture::Canvas;

use crate::raster_cache::{PictureRasterizer, RasterCache, RasterCacheConfig};
use crate::stopwatch::Stopwatch;

/// State that outlives individual frames: the raster cache and frame timing.
///
/// Each rasterizer owns one context; contexts are never shared between
/// windows.
#[derive(Debug, Default)]
pub struct CompositorContext {
    raster_cache: RasterCache,
    raster_time: Stopwatch,
    engine_time: Stopwatch,
    frame_count: u64,
}

impl CompositorContext {
    /// Create a context whose raster cache uses `config`.
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            raster_cache: RasterCache::new(config),
            ..Self::default()
        }
    }

    /// Begin a frame drawing into `canvas`.
    ///
    /// Raster timing starts now and the frame is finalized when the returned
    /// scope is dropped, whichever way the caller leaves it.
    pub fn acquire_frame<'a>(&'a mut self, canvas: &'a mut dyn Canvas) -> ScopedFrame<'a> {
        self.raster_time.start();
        ScopedFrame {
            context: self,
            canvas,
        }
    }

    /// A GPU context became available; `rasterizer` fills cache entries on it.
    pub fn on_gr_context_created(&mut self, rasterizer: Option<Box<dyn PictureRasterizer>>) {
        tracing::debug!(
            rasterizer = rasterizer.is_some(),
            "compositor attached to GPU context"
        );
        self.raster_cache.set_rasterizer(rasterizer);
    }

    /// The GPU context was lost; every cached bitmap died with it.
    pub fn on_gr_context_destroyed(&mut self) {
        tracing::debug!(
            dropped = self.raster_cache.len(),
            "compositor detached from GPU context"
        );
        self.raster_cache.clear();
        self.raster_cache.set_rasterizer(None);
    }

    /// The raster cache.
    #[inline]
    pub fn raster_cache(&self) -> &RasterCache {
        &self.raster_cache
    }

    /// Mutable access to the raster cache.
    #[inline]
    pub fn raster_cache_mut(&mut self) -> &mut RasterCache {
        &mut self.raster_cache
    }

    /// Cost of recent rasterized frames, written by [`ScopedFrame`].
    #[inline]
    pub fn raster_time(&self) -> &Stopwatch {
        &self.raster_time
    }

    /// Cost of recent engine frames.
    #[inline]
    pub fn engine_time(&self) -> &Stopwatch {
        &self.engine_time
    }

    /// Engine timing, for the external frame driver to record laps into.
    #[inline]
    pub fn engine_time_mut(&mut self) -> &mut Stopwatch {
        &mut self.engine_time
    }

    /// Number of frames finished so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// One frame's binding of a canvas to the compositor state.
///
/// Dropping the scope records the raster lap, sweeps the raster cache and
/// counts the frame.
pub struct ScopedFrame<'a> {
    context: &'a mut CompositorContext,
    canvas: &'a mut dyn Canvas,
}

impl fmt::Debug for ScopedFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedFrame")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl ScopedFrame<'_> {
    /// The canvas this frame draws into.
    #[inline]
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        &mut *self.canvas
    }

    /// The compositor state.
    #[inline]
    pub fn context(&self) -> &CompositorContext {
        self.context
    }

    /// Borrows needed by a preroll walk.
    pub(crate) fn preroll_parts(
        &mut self,
        ignore_raster_cache: bool,
    ) -> (Option<&mut RasterCache>, &Stopwatch) {
        let context = &mut *self.context;
        let cache = (!ignore_raster_cache).then_some(&mut context.raster_cache);
        (cache, &context.raster_time)
    }

    /// Borrows needed by a paint walk.
    pub(crate) fn paint_parts(
        &mut self,
        ignore_raster_cache: bool,
    ) -> (&mut dyn Canvas, Option<&RasterCache>, &Stopwatch, &Stopwatch) {
        let context = &*self.context;
        let cache = (!ignore_raster_cache).then_some(&context.raster_cache);
        (
            &mut *self.canvas,
            cache,
            &context.raster_time,
            &context.engine_time,
        )
    }
}

impl Drop for ScopedFrame<'_> {
    fn drop(&mut self) {
        self.context.raster_time.stop();
        self.context.raster_cache.sweep_after_frame();
        self.context.frame_count += 1;
        tracing::trace!(frame = self.context.frame_count, "frame finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_picture::RecordingCanvas;

    #[test]
    fn dropping_a_frame_records_one_lap() {
        let mut context = CompositorContext::default();
        let mut canvas = RecordingCanvas::default();
        {
            let frame = context.acquire_frame(&mut canvas);
            assert!(frame.context().raster_time().is_running());
        }
        assert_eq!(context.frame_count(), 1);
        assert_eq!(context.raster_time().samples().len(), 1);
        assert!(!context.raster_time().is_running());
    }

    #[test]
    fn ignoring_the_cache_hides_it_from_both_walks() {
        let mut context = CompositorContext::default();
        let mut canvas = RecordingCanvas::default();
        let mut frame = context.acquire_frame(&mut canvas);
        assert!(frame.preroll_parts(true).0.is_none());
        assert!(frame.preroll_parts(false).0.is_some());
        assert!(frame.paint_parts(true).1.is_none());
    }
}
