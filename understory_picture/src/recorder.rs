// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The picture recorder: a state stack, incremental bounds, and indexing.
//!
//! ## Coordinate spaces
//!
//! Each stack entry tracks bounds in its own *state space*: device-like
//! coordinates after applying that entry's transform. For ordinary saves the
//! state space is shared with the parent. A save layer starts a fresh space
//! whose origin sits at the layer rectangle's top-left corner, with an
//! identity transform and a scissor equal to the layer rectangle.
//!
//! On restore, a save layer's bounds are shifted back by the layer offset and
//! mapped through the parent's transform before merging, so both isolated
//! coordinate changes are undone.
//!
//! Spatial-index entries are always stored in picture-root coordinates. Each
//! entry therefore also carries the transform from its state space to the
//! root.

use kurbo::{Affine, Rect, Vec2};

use crate::bbox_index::BBoxIndex;
use crate::command::DrawCommand;
use crate::error::RecordingError;
use crate::geometry::{
    intersect_or_empty, is_empty_rect, map_rect, max_scale, shift_rect, union_non_empty,
};
use crate::paint::Paint;
use crate::picture::Picture;
use crate::pool::{CommandHandle, CommandPool};

/// Options for a [`PictureRecorder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecorderConfig {
    /// Ratio of device pixels to logical pixels reported to canvases.
    pub device_pixel_ratio: f64,
    /// Slack added around every spatial-index entry, in picture units.
    pub index_inflation: f64,
    /// Device width of a zero-width stroke.
    pub hairline_width: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            index_inflation: 5.0,
            hairline_width: 1.0,
        }
    }
}

impl RecorderConfig {
    /// Set the device pixel ratio.
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Set the spatial-index slack.
    pub fn with_index_inflation(mut self, inflation: f64) -> Self {
        self.index_inflation = inflation;
        self
    }

    /// Set the hairline width.
    pub fn with_hairline_width(mut self, width: f64) -> Self {
        self.hairline_width = width;
        self
    }
}

/// The smaller of the two axis scale factors of `matrix`.
fn min_scale(matrix: Affine) -> f64 {
    let [a, b, c, d, _, _] = matrix.as_coeffs();
    a.hypot(b).min(c.hypot(d))
}

#[derive(Clone, Debug)]
struct CanvasState {
    xform: Affine,
    scissor: Option<Rect>,
    save_layer: bool,
    layer_offset: Vec2,
    /// Extra spread of the layer's own filter, in layer units.
    layer_outset: f64,
    /// Spread of every enclosing layer filter, in state units. Index entries
    /// grow by this much so culled replay keeps draws whose filtered output
    /// reaches the cull rect.
    index_outset: f64,
    /// State space to picture-root space.
    to_root: Affine,
    paint_bounds: Rect,
}

impl CanvasState {
    fn root() -> Self {
        Self {
            xform: Affine::IDENTITY,
            scissor: None,
            save_layer: false,
            layer_offset: Vec2::ZERO,
            layer_outset: 0.0,
            index_outset: 0.0,
            to_root: Affine::IDENTITY,
            paint_bounds: Rect::ZERO,
        }
    }

    /// The entry pushed by a plain save: same space, fresh bounds.
    fn child(&self) -> Self {
        Self {
            xform: self.xform,
            scissor: self.scissor,
            save_layer: false,
            layer_offset: Vec2::ZERO,
            layer_outset: 0.0,
            index_outset: self.index_outset,
            to_root: self.to_root,
            paint_bounds: Rect::ZERO,
        }
    }

    fn layer(&self, rect: Rect, paint: &Paint) -> Self {
        let offset = rect.origin().to_vec2();
        let layer_outset = paint.image_filter.map_or(0.0, |f| f.outset(1.0));
        let scale = min_scale(self.xform);
        let inherited = if scale > 0.0 {
            self.index_outset / scale
        } else {
            self.index_outset
        };
        Self {
            xform: Affine::IDENTITY,
            scissor: Some(shift_rect(rect, -offset)),
            save_layer: true,
            layer_offset: offset,
            layer_outset,
            index_outset: inherited + layer_outset,
            to_root: self.to_root * self.xform * Affine::translate(offset),
            paint_bounds: Rect::ZERO,
        }
    }

    fn clip(&mut self, local: Rect) {
        let device = map_rect(self.xform, local);
        self.scissor = Some(match self.scissor {
            Some(scissor) => intersect_or_empty(scissor, device),
            None => device,
        });
    }

    /// Clip `bounds` to the scissor and merge them. Returns the clipped rect.
    fn add_paint_bounds(&mut self, bounds: Rect) -> Rect {
        let clipped = match self.scissor {
            Some(scissor) => intersect_or_empty(bounds, scissor),
            None => bounds,
        };
        self.paint_bounds = union_non_empty(self.paint_bounds, clipped);
        clipped
    }
}

/// Accumulates [`DrawCommand`]s into a [`Picture`].
///
/// The recorder keeps a stack of canvas states (never empty), computes tight
/// paint bounds as commands arrive, and indexes every paint command so that
/// pictures can later be replayed against a cull rectangle.
///
/// Recording must be balanced: every `Save`/`SaveLayer` needs a matching
/// `Restore` before [`end_recording`](Self::end_recording). A restore with no
/// open scope poisons the recording; the error is reported when recording
/// ends.
#[derive(Debug)]
pub struct PictureRecorder {
    config: RecorderConfig,
    pool: CommandPool,
    handles: Vec<CommandHandle>,
    states: Vec<CanvasState>,
    index: BBoxIndex,
    state_update_indices: Vec<u32>,
    error: Option<RecordingError>,
}

impl Default for PictureRecorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl PictureRecorder {
    /// Create a recorder with the given configuration.
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            pool: CommandPool::new(),
            handles: Vec::new(),
            states: vec![CanvasState::root()],
            index: BBoxIndex::new(),
            state_update_indices: Vec::new(),
            error: None,
        }
    }

    /// Configuration this recorder was created with.
    #[inline]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The live transform of the current state.
    #[inline]
    pub fn total_matrix(&self) -> Affine {
        self.state().xform
    }

    /// Number of states on the stack; `1` when no scope is open.
    #[inline]
    pub fn save_count(&self) -> usize {
        self.states.len()
    }

    /// Number of commands recorded so far.
    #[inline]
    pub fn command_count(&self) -> usize {
        self.handles.len()
    }

    /// The recorded command at `index`, if any.
    pub fn command(&self, index: usize) -> Option<&DrawCommand> {
        self.pool.get(*self.handles.get(index)?)
    }

    /// Bounds accumulated so far in the current state's space.
    #[inline]
    pub fn current_paint_bounds(&self) -> Rect {
        self.state().paint_bounds
    }

    fn state(&self) -> &CanvasState {
        // The stack is never empty: restore refuses to pop the root.
        &self.states[self.states.len() - 1]
    }

    fn state_mut(&mut self) -> &mut CanvasState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// Append a command, updating the state stack, bounds and index.
    pub fn add_draw_cmd(&mut self, cmd: DrawCommand) {
        let index = u32::try_from(self.handles.len()).unwrap_or(u32::MAX);
        if cmd.is_state_update() {
            self.state_update_indices.push(index);
        }

        match &cmd {
            DrawCommand::Save => {
                let child = self.state().child();
                self.states.push(child);
            }
            DrawCommand::SaveLayer { rect, paint } => {
                let layer = self.state().layer(*rect, paint);
                self.states.push(layer);
            }
            DrawCommand::Restore => self.restore(),
            DrawCommand::Translate { .. }
            | DrawCommand::Scale { .. }
            | DrawCommand::Rotate { .. }
            | DrawCommand::Skew { .. }
            | DrawCommand::Concat(_)
            | DrawCommand::ResetMatrix
            | DrawCommand::SetMatrix(_) => {
                let state = self.state_mut();
                if let Some(xform) = cmd.apply_to_matrix(state.xform) {
                    state.xform = xform;
                }
            }
            DrawCommand::ClipRect(rect) => self.state_mut().clip(*rect),
            DrawCommand::ClipRRect(rrect) => self.state_mut().clip(rrect.rect()),
            DrawCommand::ClipPath(path) => self.state_mut().clip(path.bounds()),
            DrawCommand::DrawPath { path, paint } => {
                let scale = max_scale(self.state().xform);
                let hairline = if scale > 0.0 {
                    self.config.hairline_width / scale
                } else {
                    self.config.hairline_width
                };
                let outset = paint.stroke_outset(hairline);
                self.add_paint(index, path.bounds().inflate(outset, outset), paint);
            }
            DrawCommand::DrawImage {
                image,
                offset,
                paint,
            } => {
                self.add_paint(index, Rect::from_origin_size(*offset, image.size()), paint);
            }
            DrawCommand::DrawImageRect { dst, paint, .. }
            | DrawCommand::DrawImageNine { dst, paint, .. } => {
                self.add_paint(index, *dst, paint);
            }
            DrawCommand::DrawPicture(picture) => {
                self.add_device_bounds(index, map_rect(self.state().xform, picture.paint_bounds()));
            }
            DrawCommand::DrawTextBlob {
                blob,
                offset,
                paint,
            } => {
                self.add_paint(index, blob.shifted_bounds(*offset), paint);
            }
        }

        let handle = self.pool.acquire(cmd);
        self.handles.push(handle);
    }

    fn restore(&mut self) {
        if self.states.len() <= 1 {
            tracing::warn!("restore without a matching save");
            self.error.get_or_insert(RecordingError::RestoreUnderflow);
            return;
        }
        let Some(popped) = self.states.pop() else {
            return;
        };
        let bounds = if popped.save_layer {
            let shifted = shift_rect(popped.paint_bounds, popped.layer_offset);
            let spread = if is_empty_rect(shifted) {
                shifted
            } else {
                shifted.inflate(popped.layer_outset, popped.layer_outset)
            };
            map_rect(self.state().xform, spread)
        } else {
            popped.paint_bounds
        };
        self.state_mut().add_paint_bounds(bounds);
    }

    /// Bounds of a paint op given in local coordinates.
    fn add_paint(&mut self, index: u32, local: Rect, paint: &Paint) {
        let xform = self.state().xform;
        let mut device = map_rect(xform, local);
        if !is_empty_rect(device) {
            let scale = max_scale(xform);
            let spread = paint.mask_outset(scale)
                + paint.image_filter.map_or(0.0, |f| f.outset(scale));
            if spread > 0.0 {
                device = device.inflate(spread, spread);
            }
        }
        self.add_device_bounds(index, device);
    }

    fn add_device_bounds(&mut self, index: u32, device: Rect) {
        let inflation = self.config.index_inflation;
        let state = self.state_mut();
        let clipped = state.add_paint_bounds(device);
        if is_empty_rect(clipped) {
            tracing::trace!(command = index, "draw fully clipped; not indexed");
            return;
        }
        let slack = inflation + state.index_outset;
        let root = map_rect(state.to_root, clipped.inflate(slack, slack));
        self.index.insert(root, index);
    }

    /// Finish recording and produce an immutable [`Picture`].
    ///
    /// On success the recorder is reset and ready for a new recording. On
    /// failure nothing is consumed; call [`reset`](Self::reset) to discard the
    /// malformed recording.
    pub fn end_recording(&mut self) -> Result<Picture, RecordingError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.states.len() != 1 {
            return Err(RecordingError::UnbalancedSaveRestore {
                depth: self.states.len() - 1,
            });
        }

        let mut commands = Vec::with_capacity(self.handles.len());
        for handle in self.handles.drain(..) {
            if let Some(cmd) = self.pool.release(handle) {
                commands.push(cmd);
            }
        }
        let paint_bounds = self.state().paint_bounds;
        let index = core::mem::take(&mut self.index);
        let state_update_indices = core::mem::take(&mut self.state_update_indices);
        self.states.clear();
        self.states.push(CanvasState::root());

        let picture = Picture::from_parts(commands, paint_bounds, index, state_update_indices);
        tracing::trace!(
            picture = ?picture.id(),
            commands = picture.approximate_op_count(),
            "recording finished"
        );
        Ok(picture)
    }

    /// Discard everything recorded and return to a single root state.
    pub fn reset(&mut self) {
        for handle in self.handles.drain(..) {
            self.pool.release(handle);
        }
        self.states.clear();
        self.states.push(CanvasState::root());
        self.index.clear();
        self.state_update_indices.clear();
        self.error = None;
    }
}
