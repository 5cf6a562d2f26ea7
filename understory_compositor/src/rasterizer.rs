// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presents layer trees on a [`Surface`].
//!
//! A draw flattens the tree (preroll, then paint) into a single frame
//! [`Picture`], replays that picture onto the surface frame and submits it.
//! The tree and its flattened picture are retained only when the submit
//! succeeds, so [`Rasterizer::draw_last_layer_tree`] can re-present the last
//! good frame without preroll or paint.

use understory_picture::{Picture, RecorderConfig, RecordingCanvas, RecordingError};

use crate::compositor_context::CompositorContext;
use crate::error::RasterError;
use crate::layer_tree::LayerTree;
use crate::raster_cache::RasterCacheConfig;
use crate::surface::{Surface, SurfaceFrame};

/// Outcome of a rasterizer draw, for diagnostics.
///
/// Callers that only care whether a new frame became current can compare
/// [`Rasterizer::last_layer_tree`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterStatus {
    /// A frame was submitted.
    Drawn,
    /// The surface was not ready, or there was nothing to re-present; the
    /// previous frame stays on screen.
    Skipped,
    /// The frame was abandoned.
    Failed(RasterError),
}

/// Owns a surface and turns layer trees into presented frames.
#[derive(Debug, Default)]
pub struct Rasterizer {
    surface: Option<Box<dyn Surface>>,
    compositor_context: CompositorContext,
    last_layer_tree: Option<LayerTree>,
    last_frame: Option<Picture>,
}

impl Rasterizer {
    /// Create a rasterizer with no surface.
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            compositor_context: CompositorContext::new(config),
            ..Self::default()
        }
    }

    /// Install `surface`, attaching its picture rasterizer to the raster cache.
    pub fn setup(&mut self, mut surface: Box<dyn Surface>) {
        let rasterizer = surface.create_picture_rasterizer();
        self.compositor_context.on_gr_context_created(rasterizer);
        self.surface = Some(surface);
    }

    /// Drop the surface and everything retained for it.
    pub fn teardown(&mut self) {
        self.compositor_context.on_gr_context_destroyed();
        self.surface = None;
        self.last_layer_tree = None;
        self.last_frame = None;
    }

    /// Returns `true` if a surface is installed.
    #[inline]
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Preroll, paint and present `tree`.
    ///
    /// If the surface cannot supply a frame, nothing is recorded and the
    /// previously presented tree stays current.
    pub fn draw(&mut self, mut tree: LayerTree) -> RasterStatus {
        let Some(surface) = self.surface.as_deref_mut() else {
            tracing::debug!("draw without a surface");
            return RasterStatus::Failed(RasterError::NoSurface);
        };
        let Some(frame) = surface.acquire_frame(
            tree.frame_size(),
            tree.device_pixel_ratio(),
            tree.anti_aliasing(),
        ) else {
            tracing::debug!(size = ?tree.frame_size(), "surface not ready, frame skipped");
            return RasterStatus::Skipped;
        };

        let picture = match flatten(&mut self.compositor_context, &mut tree) {
            Ok(picture) => picture,
            Err(err) => {
                tracing::warn!(%err, "layer tree recording is malformed, frame dropped");
                return RasterStatus::Failed(err.into());
            }
        };

        let status = present(frame, &picture);
        if status == RasterStatus::Drawn {
            self.last_layer_tree = Some(tree);
            self.last_frame = Some(picture);
        }
        status
    }

    /// Re-present the last successfully drawn tree without preroll or paint.
    pub fn draw_last_layer_tree(&mut self) -> RasterStatus {
        let (Some(tree), Some(picture)) = (&self.last_layer_tree, &self.last_frame) else {
            tracing::trace!("no previous frame to re-present");
            return RasterStatus::Skipped;
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return RasterStatus::Failed(RasterError::NoSurface);
        };
        let Some(frame) = surface.acquire_frame(
            tree.frame_size(),
            tree.device_pixel_ratio(),
            tree.anti_aliasing(),
        ) else {
            tracing::debug!(size = ?tree.frame_size(), "surface not ready, re-present skipped");
            return RasterStatus::Skipped;
        };
        present(frame, picture)
    }

    /// The tree of the last submitted frame.
    #[inline]
    pub fn last_layer_tree(&self) -> Option<&LayerTree> {
        self.last_layer_tree.as_ref()
    }

    /// The compositor state.
    #[inline]
    pub fn compositor_context(&self) -> &CompositorContext {
        &self.compositor_context
    }

    /// Mutable compositor state, e.g. for recording engine timing.
    #[inline]
    pub fn compositor_context_mut(&mut self) -> &mut CompositorContext {
        &mut self.compositor_context
    }
}

/// Record one preroll and paint of `tree` into a frame picture.
fn flatten(context: &mut CompositorContext, tree: &mut LayerTree) -> Result<Picture, RecordingError> {
    let config = RecorderConfig::default().with_device_pixel_ratio(tree.device_pixel_ratio());
    let mut recording = RecordingCanvas::new(config);
    {
        let mut frame = context.acquire_frame(&mut recording);
        tree.preroll(&mut frame, false);
        tree.paint(&mut frame, false);
    }
    recording.end_recording()
}

/// Replay `picture` onto `frame` and submit it.
fn present(mut frame: Box<dyn SurfaceFrame + '_>, picture: &Picture) -> RasterStatus {
    let canvas = frame.canvas();
    picture.replay(canvas);
    canvas.flush();
    if frame.submit() {
        RasterStatus::Drawn
    } else {
        tracing::warn!(picture = ?picture.id(), "surface rejected the frame");
        RasterStatus::Failed(RasterError::SubmitFailed)
    }
}
