// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas drawing API and its recording implementation.

use kurbo::{Affine, Arc, BezPath, PathEl, Point, Rect, RoundedRect, Vec2};
use peniko::{Color, Fill};

use crate::command::DrawCommand;
use crate::error::RecordingError;
use crate::image::{Image, TextBlob};
use crate::paint::{BlurStyle, MaskFilter, Paint, PaintStyle};
use crate::path::{PATH_TOLERANCE, Path};
use crate::picture::Picture;
use crate::recorder::{PictureRecorder, RecorderConfig};

/// Laid-out text that knows how to paint itself.
///
/// Text shaping and layout live outside this crate; a paragraph is handed a
/// canvas and issues ordinary draw calls (usually text blobs) against it.
pub trait Paragraph {
    /// Paint the paragraph with its top-left corner at `offset`.
    fn paint(&self, canvas: &mut dyn Canvas, offset: Point);
}

/// Immediate-mode drawing surface.
///
/// Transform methods pre-multiply the current matrix, so they act in the
/// current local coordinate system. Clips intersect with the current clip.
/// Every `save`/`save_layer` must be balanced by a `restore`.
pub trait Canvas {
    /// Push a copy of the current matrix and clip.
    fn save(&mut self);
    /// Push an offscreen layer covering `rect`, composited with `paint` on restore.
    fn save_layer(&mut self, rect: Rect, paint: &Paint);
    /// Pop the most recent save or save layer.
    fn restore(&mut self);
    /// `1` plus the number of open save scopes.
    fn save_count(&self) -> usize;

    /// Pre-translate the matrix.
    fn translate(&mut self, dx: f64, dy: f64);
    /// Pre-scale the matrix; `sy` defaults to `sx`.
    fn scale(&mut self, sx: f64, sy: Option<f64>);
    /// Pre-rotate the matrix, about `pivot` if given.
    fn rotate(&mut self, radians: f64, pivot: Option<Point>);
    /// Pre-skew the matrix.
    fn skew(&mut self, sx: f64, sy: f64);
    /// Pre-concatenate `matrix`.
    fn concat(&mut self, matrix: Affine);
    /// Replace the matrix with identity.
    fn reset_matrix(&mut self);
    /// Replace the matrix.
    fn set_matrix(&mut self, matrix: Affine);
    /// The current matrix.
    fn total_matrix(&self) -> Affine;

    /// Intersect the clip with `rect`.
    fn clip_rect(&mut self, rect: Rect);
    /// Intersect the clip with `rrect`.
    fn clip_rrect(&mut self, rrect: RoundedRect);
    /// Intersect the clip with `path`.
    fn clip_path(&mut self, path: &Path);

    /// Fill or stroke `path`.
    fn draw_path(&mut self, path: &Path, paint: &Paint);
    /// Draw `image` with its top-left corner at `offset`.
    fn draw_image(&mut self, image: &Image, offset: Point, paint: &Paint);
    /// Draw `src` of `image` (or all of it) scaled into `dst`.
    fn draw_image_rect(&mut self, image: &Image, src: Option<Rect>, dst: Rect, paint: &Paint);
    /// Draw `image` as a nine-patch with stretchable `center`.
    fn draw_image_nine(
        &mut self,
        image: &Image,
        src: Option<Rect>,
        center: Rect,
        dst: Rect,
        paint: &Paint,
    );
    /// Draw a recorded picture.
    fn draw_picture(&mut self, picture: &Picture);
    /// Draw shaped text with its origin at `offset`.
    fn draw_text_blob(&mut self, blob: &TextBlob, offset: Vec2, paint: &Paint);
    /// Let `paragraph` paint itself at `offset`.
    fn draw_paragraph(&mut self, paragraph: &dyn Paragraph, offset: Point);

    /// Device pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;
    /// Push pending work to the target, if the canvas batches.
    fn flush(&mut self);
}

/// Convenience drawing helpers built on [`Canvas`].
pub trait CanvasExt: Canvas {
    /// Stroke a line segment. The paint is always used as a stroke.
    fn draw_line(&mut self, p0: Point, p1: Point, paint: &Paint) {
        let mut path = BezPath::new();
        path.move_to(p0);
        path.line_to(p1);
        let paint = Paint {
            style: PaintStyle::Stroke,
            ..paint.clone()
        };
        self.draw_path(&path.into(), &paint);
    }

    /// Draw a rectangle. Nothing is recorded for a zero-area rectangle.
    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        if rect.area() == 0.0 {
            return;
        }
        self.draw_path(&Path::rect(rect), paint);
    }

    /// Draw a rounded rectangle.
    fn draw_rrect(&mut self, rrect: RoundedRect, paint: &Paint) {
        self.draw_path(&Path::rounded_rect(rrect), paint);
    }

    /// Draw the ring between `outer` and `inner`.
    fn draw_drrect(&mut self, outer: RoundedRect, inner: RoundedRect, paint: &Paint) {
        let mut path = Path::rounded_rect(outer).with_fill_rule(Fill::EvenOdd);
        path.extend_from(&Path::rounded_rect(inner));
        self.draw_path(&path, paint);
    }

    /// Draw the ellipse inscribed in `rect`.
    fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.draw_path(&Path::oval(rect), paint);
    }

    /// Draw a circle.
    fn draw_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let r = Vec2::new(radius, radius);
        self.draw_oval(Rect::from_points(center - r, center + r), paint);
    }

    /// Draw an arc of the ellipse inscribed in `rect`.
    ///
    /// With `use_center` the arc is closed through the center, producing a
    /// wedge.
    fn draw_arc(
        &mut self,
        rect: Rect,
        start_angle: f64,
        sweep_angle: f64,
        use_center: bool,
        paint: &Paint,
    ) {
        let center = rect.center();
        let radii = Vec2::new(rect.width() * 0.5, rect.height() * 0.5);
        let arc = Arc::new(center, radii, start_angle, sweep_angle, 0.0);
        let start = center + Vec2::new(radii.x * start_angle.cos(), radii.y * start_angle.sin());

        let mut path = BezPath::new();
        if use_center {
            path.move_to(center);
            path.line_to(start);
        } else {
            path.move_to(start);
        }
        path.extend(arc.append_iter(PATH_TOLERANCE));
        if use_center {
            path.close_path();
        }
        self.draw_path(&path.into(), paint);
    }

    /// Draw a material-style shadow cast by `path` at `elevation`.
    ///
    /// Records an ambient pass and a spot pass offset downward. The
    /// `transparent_occluder` flag is a rasterization hint only and does not
    /// change what is recorded.
    fn draw_shadow(
        &mut self,
        path: &Path,
        color: Color,
        elevation: f64,
        _transparent_occluder: bool,
    ) {
        let ambient = Paint::fill(color.multiply_alpha(AMBIENT_ALPHA))
            .with_mask_filter(MaskFilter::blur(BlurStyle::Normal, elevation * 0.5));
        let spot = Paint::fill(color.multiply_alpha(SPOT_ALPHA))
            .with_mask_filter(MaskFilter::blur(BlurStyle::Normal, elevation));

        self.save();
        self.draw_path(path, &ambient);
        self.translate(0.0, elevation * 0.5);
        self.draw_path(path, &spot);
        self.restore();
    }

    /// Run `f` between a `save` and its `restore`.
    ///
    /// Note: if `f` panics, the scope is not restored.
    #[inline]
    fn with_save<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.save();
        let out = f(self);
        self.restore();
        out
    }

    /// Run `f` inside a save layer covering `rect`.
    ///
    /// Note: if `f` panics, the layer is not restored.
    #[inline]
    fn with_save_layer<R>(
        &mut self,
        rect: Rect,
        paint: &Paint,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.save_layer(rect, paint);
        let out = f(self);
        self.restore();
        out
    }
}

impl<C: Canvas + ?Sized> CanvasExt for C {}

const AMBIENT_ALPHA: f32 = 0.039;
const SPOT_ALPHA: f32 = 0.25;

/// A [`Canvas`] that records every call into a [`PictureRecorder`].
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    recorder: PictureRecorder,
}

impl RecordingCanvas {
    /// Create a canvas over a fresh recorder.
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            recorder: PictureRecorder::new(config),
        }
    }

    /// The underlying recorder.
    #[inline]
    pub fn recorder(&self) -> &PictureRecorder {
        &self.recorder
    }

    /// Finish recording. See [`PictureRecorder::end_recording`].
    pub fn end_recording(&mut self) -> Result<Picture, RecordingError> {
        self.recorder.end_recording()
    }

    /// Discard the current recording.
    pub fn reset(&mut self) {
        self.recorder.reset();
    }

    #[inline]
    fn push(&mut self, cmd: DrawCommand) {
        self.recorder.add_draw_cmd(cmd);
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn save_layer(&mut self, rect: Rect, paint: &Paint) {
        self.push(DrawCommand::SaveLayer {
            rect,
            paint: paint.clone(),
        });
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn save_count(&self) -> usize {
        self.recorder.save_count()
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.push(DrawCommand::Translate { dx, dy });
    }

    fn scale(&mut self, sx: f64, sy: Option<f64>) {
        self.push(DrawCommand::Scale { sx, sy });
    }

    fn rotate(&mut self, radians: f64, pivot: Option<Point>) {
        self.push(DrawCommand::Rotate { radians, pivot });
    }

    fn skew(&mut self, sx: f64, sy: f64) {
        self.push(DrawCommand::Skew { sx, sy });
    }

    fn concat(&mut self, matrix: Affine) {
        self.push(DrawCommand::Concat(matrix));
    }

    fn reset_matrix(&mut self) {
        self.push(DrawCommand::ResetMatrix);
    }

    fn set_matrix(&mut self, matrix: Affine) {
        self.push(DrawCommand::SetMatrix(matrix));
    }

    fn total_matrix(&self) -> Affine {
        self.recorder.total_matrix()
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.push(DrawCommand::ClipRect(rect));
    }

    fn clip_rrect(&mut self, rrect: RoundedRect) {
        self.push(DrawCommand::ClipRRect(rrect));
    }

    fn clip_path(&mut self, path: &Path) {
        self.push(DrawCommand::ClipPath(path.clone()));
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.push(DrawCommand::DrawPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_image(&mut self, image: &Image, offset: Point, paint: &Paint) {
        self.push(DrawCommand::DrawImage {
            image: *image,
            offset,
            paint: paint.clone(),
        });
    }

    fn draw_image_rect(&mut self, image: &Image, src: Option<Rect>, dst: Rect, paint: &Paint) {
        self.push(DrawCommand::DrawImageRect {
            image: *image,
            src,
            dst,
            paint: paint.clone(),
        });
    }

    fn draw_image_nine(
        &mut self,
        image: &Image,
        src: Option<Rect>,
        center: Rect,
        dst: Rect,
        paint: &Paint,
    ) {
        self.push(DrawCommand::DrawImageNine {
            image: *image,
            src,
            center,
            dst,
            paint: paint.clone(),
        });
    }

    fn draw_picture(&mut self, picture: &Picture) {
        self.push(DrawCommand::DrawPicture(picture.clone()));
    }

    fn draw_text_blob(&mut self, blob: &TextBlob, offset: Vec2, paint: &Paint) {
        self.push(DrawCommand::DrawTextBlob {
            blob: blob.clone(),
            offset,
            paint: paint.clone(),
        });
    }

    fn draw_paragraph(&mut self, paragraph: &dyn Paragraph, offset: Point) {
        paragraph.paint(self, offset);
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.recorder.config().device_pixel_ratio
    }

    fn flush(&mut self) {}
}
