// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_picture --heading-base-level=0

//! Understory Picture: record immediate-mode drawing into immutable pictures.
//!
//! This crate turns a stream of canvas calls into a [`Picture`]: an ordered,
//! immutable list of [`DrawCommand`]s together with tight paint bounds and a
//! spatial index over the paint commands.
//!
//! # Core concepts
//!
//! - **Commands**: [`DrawCommand`] is a closed sum type. State commands
//!   (save, save layer, restore, transforms, clips) mutate the recording
//!   state; paint commands (paths, images, text, nested pictures) produce
//!   pixels.
//! - **Recording**: [`PictureRecorder`] keeps a stack of canvas states and
//!   folds each paint command's bounds into the current state as it arrives.
//!   Save layers open an isolated coordinate space whose bounds are projected
//!   back into the parent on restore.
//! - **Canvas**: [`Canvas`] is the drawing vocabulary. [`RecordingCanvas`]
//!   implements it over a recorder; [`CanvasExt`] adds derived shapes
//!   (lines, rects, ovals, arcs, shadows) and scoped helpers.
//! - **Pictures**: [`Picture`] is cheap to clone and carries a stable
//!   [`PictureId`] that is safe to use as a cache key. Pictures can be
//!   replayed onto any canvas, in full or culled to a rectangle.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use peniko::Color;
//! use understory_picture::{Canvas, CanvasExt, Paint, RecordingCanvas};
//!
//! let mut canvas = RecordingCanvas::default();
//! canvas.translate(10.0, 0.0);
//! canvas.draw_rect(Rect::new(0.0, 0.0, 20.0, 20.0), &Paint::fill(Color::WHITE));
//! canvas.translate(-10.0, 0.0);
//!
//! let picture = canvas.end_recording().unwrap();
//! assert_eq!(picture.paint_bounds(), Rect::new(10.0, 0.0, 30.0, 20.0));
//! ```
//!
//! Bounds are conservative: clips are tracked as bounding rectangles only,
//! and blurs inflate bounds by three standard deviations.

mod bbox_index;
mod canvas;
mod command;
mod error;
pub mod geometry;
mod image;
mod paint;
mod path;
mod picture;
mod pool;
mod recorder;

pub use bbox_index::{BBoxIndex, DEFAULT_CELL_SIZE};
pub use canvas::{Canvas, CanvasExt, Paragraph, RecordingCanvas};
pub use command::DrawCommand;
pub use error::RecordingError;
pub use image::{Image, ImageId, TextBlob};
pub use paint::{BlurStyle, ImageFilter, MaskFilter, Paint, PaintStyle};
pub use path::{PATH_TOLERANCE, Path};
pub use picture::{Picture, PictureId};
pub use pool::{CommandHandle, CommandPool};
pub use recorder::{PictureRecorder, RecorderConfig};
