// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles for externally owned pixel content and pre-shaped text.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Rect, Size, Vec2};

/// Identifier for an image.
///
/// Identifiers are process-unique and never reused, so they can key caches
/// without risk of aliasing a different image.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl ImageId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A renderable bitmap.
///
/// The pixels live with whoever produced the image (an asset decoder, a GPU
/// texture producer, or a raster cache); this handle only carries identity
/// and dimensions, which is all recording and bounds computation need.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Image {
    id: ImageId,
    width: u32,
    height: u32,
}

impl Image {
    /// Create a handle for a new image with the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: ImageId::next(),
            width,
            height,
        }
    }

    /// Identity of this image.
    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in pixels.
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// A run of shaped glyphs with precomputed bounds.
///
/// Shaping happens outside this crate; the recorder only needs the text's
/// bounds relative to its baseline origin.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlob {
    text: Arc<str>,
    bounds: Rect,
}

impl TextBlob {
    /// Create a blob from its text and bounds relative to the draw origin.
    pub fn new(text: impl Into<Arc<str>>, bounds: Rect) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }

    /// The text carried by this blob.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bounds relative to the draw origin.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bounds when drawn at `offset`.
    #[inline]
    pub fn shifted_bounds(&self, offset: Vec2) -> Rect {
        self.bounds + offset
    }
}
