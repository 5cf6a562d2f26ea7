// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable recorded pictures and their replay.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::Rect;

use crate::bbox_index::BBoxIndex;
use crate::canvas::Canvas;
use crate::command::DrawCommand;

/// Identity of a recorded [`Picture`].
///
/// Every call to [`PictureRecorder::end_recording`](crate::PictureRecorder::end_recording)
/// yields a fresh identifier. Since pictures never change after recording,
/// the identifier alone is a sound cache key for anything derived from a
/// picture's content.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureId(pub u64);

impl PictureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct PictureInner {
    id: PictureId,
    commands: Box<[DrawCommand]>,
    paint_bounds: Rect,
    index: BBoxIndex,
    state_update_indices: Box<[u32]>,
}

/// An immutable, shareable recording.
///
/// Cloning a picture is cheap and yields the same identity. Two pictures
/// compare equal only if they are clones of one recording.
#[derive(Clone)]
pub struct Picture {
    inner: Arc<PictureInner>,
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("id", &self.inner.id)
            .field("commands", &self.inner.commands.len())
            .field("paint_bounds", &self.inner.paint_bounds)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Picture {}

impl Picture {
    pub(crate) fn from_parts(
        commands: Vec<DrawCommand>,
        paint_bounds: Rect,
        index: BBoxIndex,
        state_update_indices: Vec<u32>,
    ) -> Self {
        Self {
            inner: Arc::new(PictureInner {
                id: PictureId::next(),
                commands: commands.into_boxed_slice(),
                paint_bounds,
                index,
                state_update_indices: state_update_indices.into_boxed_slice(),
            }),
        }
    }

    /// Identity of this picture.
    #[inline]
    pub fn id(&self) -> PictureId {
        self.inner.id
    }

    /// Recorded commands, in order.
    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.inner.commands
    }

    /// Tight bounds of everything the picture paints, in recording space.
    #[inline]
    pub fn paint_bounds(&self) -> Rect {
        self.inner.paint_bounds
    }

    /// Spatial index of the paint commands.
    #[inline]
    pub fn index(&self) -> &BBoxIndex {
        &self.inner.index
    }

    /// Indices of commands that mutate canvas state.
    #[inline]
    pub fn state_update_indices(&self) -> &[u32] {
        &self.inner.state_update_indices
    }

    /// Number of recorded commands, as a rough replay cost.
    #[inline]
    pub fn approximate_op_count(&self) -> usize {
        self.inner.commands.len()
    }

    /// Re-issue every command onto `canvas`.
    ///
    /// `SetMatrix` and `ResetMatrix` are absolute: they replace the canvas
    /// matrix rather than composing with whatever transform the canvas had
    /// when replay started.
    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for cmd in self.commands() {
            apply(canvas, cmd);
        }
    }

    /// Re-issue state commands plus the paint commands visible in `cull`.
    ///
    /// `cull` is in the picture's recording space. Pixels inside `cull` are
    /// identical to those of a full [`replay`](Self::replay).
    pub fn replay_culled(&self, canvas: &mut dyn Canvas, cull: Rect) {
        let visible = self.inner.index.query(cull);
        let state = self.state_update_indices();
        let commands = self.commands();

        let (mut s, mut v) = (0, 0);
        let mut emitted = 0_usize;
        loop {
            let next = match (state.get(s), visible.get(v)) {
                (Some(&a), Some(&b)) if a == b => {
                    s += 1;
                    v += 1;
                    a
                }
                (Some(&a), Some(&b)) if a < b => {
                    s += 1;
                    a
                }
                (_, Some(&b)) => {
                    v += 1;
                    b
                }
                (Some(&a), None) => {
                    s += 1;
                    a
                }
                (None, None) => break,
            };
            if let Some(cmd) = commands.get(next as usize) {
                apply(canvas, cmd);
                emitted += 1;
            }
        }
        tracing::trace!(
            picture = ?self.id(),
            emitted,
            skipped = commands.len().saturating_sub(emitted),
            "culled replay"
        );
    }
}

fn apply(canvas: &mut dyn Canvas, cmd: &DrawCommand) {
    match cmd {
        DrawCommand::Save => canvas.save(),
        DrawCommand::SaveLayer { rect, paint } => canvas.save_layer(*rect, paint),
        DrawCommand::Restore => canvas.restore(),
        DrawCommand::Translate { dx, dy } => canvas.translate(*dx, *dy),
        DrawCommand::Scale { sx, sy } => canvas.scale(*sx, *sy),
        DrawCommand::Rotate { radians, pivot } => canvas.rotate(*radians, *pivot),
        DrawCommand::Skew { sx, sy } => canvas.skew(*sx, *sy),
        DrawCommand::Concat(m) => canvas.concat(*m),
        DrawCommand::ResetMatrix => canvas.reset_matrix(),
        DrawCommand::SetMatrix(m) => canvas.set_matrix(*m),
        DrawCommand::ClipRect(rect) => canvas.clip_rect(*rect),
        DrawCommand::ClipRRect(rrect) => canvas.clip_rrect(*rrect),
        DrawCommand::ClipPath(path) => canvas.clip_path(path),
        DrawCommand::DrawPath { path, paint } => canvas.draw_path(path, paint),
        DrawCommand::DrawImage {
            image,
            offset,
            paint,
        } => canvas.draw_image(image, *offset, paint),
        DrawCommand::DrawImageRect {
            image,
            src,
            dst,
            paint,
        } => canvas.draw_image_rect(image, *src, *dst, paint),
        DrawCommand::DrawImageNine {
            image,
            src,
            center,
            dst,
            paint,
        } => canvas.draw_image_nine(image, *src, *center, *dst, paint),
        DrawCommand::DrawPicture(picture) => canvas.draw_picture(picture),
        DrawCommand::DrawTextBlob {
            blob,
            offset,
            paint,
        } => canvas.draw_text_blob(blob, *offset, paint),
    }
}
