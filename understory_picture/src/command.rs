// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of recorded drawing commands.

use kurbo::{Affine, Point, Rect, RoundedRect, Vec2};

use crate::image::{Image, TextBlob};
use crate::paint::Paint;
use crate::path::Path;
use crate::picture::Picture;

/// A single recorded canvas operation.
///
/// Commands fall into two groups:
/// - **State commands** (save/restore, transforms, clips) mutate the
///   recording state and never produce pixels on their own.
/// - **Paint commands** produce pixels and contribute to a picture's bounds
///   and spatial index.
///
/// Every interpreter of this enum (the recorder, replay, inspection tools)
/// matches it exhaustively, so adding a variant is a compile error at each
/// site that needs to learn about it.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Push a copy of the current state.
    Save,
    /// Push an isolated offscreen layer covering `rect`.
    SaveLayer {
        /// Layer bounds in the current local coordinates.
        rect: Rect,
        /// Paint used when compositing the layer back (tint, filters).
        paint: Paint,
    },
    /// Pop the most recent save or save layer.
    Restore,
    /// Pre-translate the current matrix.
    Translate {
        /// Horizontal offset.
        dx: f64,
        /// Vertical offset.
        dy: f64,
    },
    /// Pre-scale the current matrix; `sy` defaults to `sx`.
    Scale {
        /// Horizontal scale.
        sx: f64,
        /// Optional vertical scale.
        sy: Option<f64>,
    },
    /// Pre-rotate the current matrix, optionally about a pivot.
    Rotate {
        /// Angle in radians.
        radians: f64,
        /// Optional pivot point in local coordinates.
        pivot: Option<Point>,
    },
    /// Pre-skew the current matrix.
    Skew {
        /// Horizontal skew factor.
        sx: f64,
        /// Vertical skew factor.
        sy: f64,
    },
    /// Pre-concatenate an arbitrary matrix.
    Concat(Affine),
    /// Replace the current matrix with identity.
    ResetMatrix,
    /// Replace the current matrix.
    SetMatrix(Affine),
    /// Intersect the clip with a rectangle.
    ClipRect(Rect),
    /// Intersect the clip with a rounded rectangle.
    ClipRRect(RoundedRect),
    /// Intersect the clip with a path.
    ClipPath(Path),
    /// Fill or stroke a path.
    DrawPath {
        /// Geometry to draw.
        path: Path,
        /// Paint used for the draw.
        paint: Paint,
    },
    /// Draw an image with its top-left corner at `offset`.
    DrawImage {
        /// Image to draw.
        image: Image,
        /// Top-left corner in local coordinates.
        offset: Point,
        /// Paint used for the draw.
        paint: Paint,
    },
    /// Draw an image (or a source sub-rect of it) scaled into `dst`.
    DrawImageRect {
        /// Image to draw.
        image: Image,
        /// Optional source rectangle in image pixels; `None` means the whole image.
        src: Option<Rect>,
        /// Destination rectangle in local coordinates.
        dst: Rect,
        /// Paint used for the draw.
        paint: Paint,
    },
    /// Draw an image as a nine-patch into `dst`.
    DrawImageNine {
        /// Image to draw.
        image: Image,
        /// Optional source rectangle in image pixels.
        src: Option<Rect>,
        /// Stretchable center region in image pixels.
        center: Rect,
        /// Destination rectangle in local coordinates.
        dst: Rect,
        /// Paint used for the draw.
        paint: Paint,
    },
    /// Draw a nested picture.
    DrawPicture(Picture),
    /// Draw shaped text with its origin at `offset`.
    DrawTextBlob {
        /// Shaped text.
        blob: TextBlob,
        /// Origin in local coordinates.
        offset: Vec2,
        /// Paint used for the draw.
        paint: Paint,
    },
}

impl DrawCommand {
    /// Returns `true` for commands that mutate recording state rather than
    /// producing pixels.
    pub fn is_state_update(&self) -> bool {
        match self {
            Self::Save
            | Self::SaveLayer { .. }
            | Self::Restore
            | Self::Translate { .. }
            | Self::Scale { .. }
            | Self::Rotate { .. }
            | Self::Skew { .. }
            | Self::Concat(_)
            | Self::ResetMatrix
            | Self::SetMatrix(_)
            | Self::ClipRect(_)
            | Self::ClipRRect(_)
            | Self::ClipPath(_) => true,
            Self::DrawPath { .. }
            | Self::DrawImage { .. }
            | Self::DrawImageRect { .. }
            | Self::DrawImageNine { .. }
            | Self::DrawPicture(_)
            | Self::DrawTextBlob { .. } => false,
        }
    }

    /// The matrix this command applies on top of `current`, for transform
    /// commands; `None` for every other command.
    pub fn apply_to_matrix(&self, current: Affine) -> Option<Affine> {
        match self {
            Self::Translate { dx, dy } => Some(current * Affine::translate((*dx, *dy))),
            Self::Scale { sx, sy } => {
                Some(current * Affine::scale_non_uniform(*sx, sy.unwrap_or(*sx)))
            }
            Self::Rotate { radians, pivot } => Some(match pivot {
                Some(p) => current * Affine::rotate_about(*radians, *p),
                None => current * Affine::rotate(*radians),
            }),
            Self::Skew { sx, sy } => Some(current * Affine::skew(*sx, *sy)),
            Self::Concat(m) => Some(current * *m),
            Self::ResetMatrix => Some(Affine::IDENTITY),
            Self::SetMatrix(m) => Some(*m),
            Self::Save
            | Self::SaveLayer { .. }
            | Self::Restore
            | Self::ClipRect(_)
            | Self::ClipRRect(_)
            | Self::ClipPath(_)
            | Self::DrawPath { .. }
            | Self::DrawImage { .. }
            | Self::DrawImageRect { .. }
            | Self::DrawImageNine { .. }
            | Self::DrawPicture(_)
            | Self::DrawTextBlob { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_commands_pre_multiply() {
        let base = Affine::scale(2.0);
        let translated = DrawCommand::Translate { dx: 5.0, dy: 0.0 }
            .apply_to_matrix(base)
            .unwrap();
        // Pre-translation happens in local space, so it is scaled.
        assert_eq!(translated * Point::ZERO, Point::new(10.0, 0.0));

        let scaled = DrawCommand::Scale { sx: 3.0, sy: None }
            .apply_to_matrix(Affine::IDENTITY)
            .unwrap();
        assert_eq!(scaled * Point::new(1.0, 1.0), Point::new(3.0, 3.0));
    }

    #[test]
    fn paint_commands_are_not_state_updates() {
        assert!(DrawCommand::Save.is_state_update());
        assert!(DrawCommand::ClipRect(Rect::ZERO).is_state_update());
        assert!(
            !DrawCommand::DrawPath {
                path: Path::rect(Rect::new(0.0, 0.0, 1.0, 1.0)),
                paint: Paint::default(),
            }
            .is_state_update()
        );
        assert_eq!(
            DrawCommand::ResetMatrix.apply_to_matrix(Affine::scale(4.0)),
            Some(Affine::IDENTITY)
        );
        assert_eq!(DrawCommand::Restore.apply_to_matrix(Affine::IDENTITY), None);
    }
}
