// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitmap cache for pictures that are expensive to replay.
//!
//! Entries are keyed by picture identity plus the linear part of the
//! transform, the device pixel ratio and the anti-aliasing level. Pictures
//! are immutable, so an entry never goes stale; it is only ever evicted.
//!
//! A lookup that returns `None` is always safe: the caller replays the
//! picture instead. The cache therefore changes cost, never output.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect};
use understory_picture::geometry::{is_empty_rect, linear_key, map_rect};
use understory_picture::{Canvas, Image, Paint, Picture, PictureId};

/// Renders pictures into bitmaps on behalf of a [`RasterCache`].
///
/// Implementations are provided by the GPU surface and become available once
/// its context exists.
pub trait PictureRasterizer: fmt::Debug {
    /// Render `picture` under `matrix` into a bitmap covering `device_rect`.
    ///
    /// `device_rect` is already rounded out to whole pixels. Returning `None`
    /// means the picture could not be rasterized; the cache treats it as a
    /// miss.
    fn rasterize(
        &mut self,
        picture: &Picture,
        matrix: Affine,
        device_rect: Rect,
        anti_aliasing: u32,
    ) -> Option<Image>;
}

/// Options for a [`RasterCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterCacheConfig {
    /// Requests needed before a picture not marked complex is rasterized.
    pub access_threshold: usize,
    /// Pictures with fewer commands are only cached when marked complex.
    pub min_op_count: usize,
    /// Frames an entry may go unused before it is evicted.
    pub max_unused_frames: u64,
    /// Upper bound on retained entries; least recently used go first.
    pub max_entries: usize,
}

impl Default for RasterCacheConfig {
    fn default() -> Self {
        Self {
            access_threshold: 3,
            min_op_count: 10,
            max_unused_frames: 0,
            max_entries: 64,
        }
    }
}

impl RasterCacheConfig {
    /// Set the access threshold.
    pub fn with_access_threshold(mut self, threshold: usize) -> Self {
        self.access_threshold = threshold;
        self
    }

    /// Set the minimum op count.
    pub fn with_min_op_count(mut self, count: usize) -> Self {
        self.min_op_count = count;
        self
    }

    /// Set how many frames an entry may go unused.
    pub fn with_max_unused_frames(mut self, frames: u64) -> Self {
        self.max_unused_frames = frames;
        self
    }

    /// Set the entry cap.
    pub fn with_max_entries(mut self, entries: usize) -> Self {
        self.max_entries = entries;
        self
    }
}

/// A rasterized picture ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCacheResult {
    image: Image,
    logical_rect: Rect,
    linear: [u64; 4],
}

impl RasterCacheResult {
    /// The cached bitmap.
    #[inline]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Bounds of the cached content in the picture's own coordinates.
    #[inline]
    pub fn logical_rect(&self) -> Rect {
        self.logical_rect
    }

    /// Returns `true` if the bitmap was rasterized under a matrix that
    /// differs from `matrix` at most by a translation.
    ///
    /// Inside a save layer the canvas matrix is relative to the layer, so it
    /// can disagree with the device matrix the bitmap was keyed on. Such a
    /// bitmap must not be blitted.
    #[inline]
    pub fn matches(&self, matrix: Affine) -> bool {
        linear_key(matrix) == self.linear
    }

    /// Draw the bitmap where the picture would land under the canvas's
    /// current matrix.
    ///
    /// Only meaningful when [`matches`](Self::matches) holds for the canvas's
    /// current matrix.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let bounds = device_bounds(canvas.total_matrix(), self.logical_rect);
        canvas.save();
        canvas.reset_matrix();
        canvas.draw_image(&self.image, Point::new(bounds.x0, bounds.y0), &Paint::default());
        canvas.restore();
    }
}

/// `rect` mapped through `matrix` and rounded out to whole pixels.
fn device_bounds(matrix: Affine, rect: Rect) -> Rect {
    map_rect(matrix, rect).expand()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RasterCacheKey {
    picture: PictureId,
    linear: [u64; 4],
    device_pixel_ratio: u64,
    anti_aliasing: u32,
}

#[derive(Debug, Default)]
struct Entry {
    access_count: usize,
    last_used_frame: u64,
    result: Option<Arc<RasterCacheResult>>,
}

/// Counters describing cache activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterCacheStats {
    /// Entries currently tracked, rasterized or not.
    pub entries: usize,
    /// Entries holding a bitmap.
    pub images: usize,
    /// Bitmaps produced by the picture rasterizer.
    pub rasterized: u64,
    /// Lookups answered with a bitmap.
    pub hits: u64,
    /// Entries removed by sweeping.
    pub evicted: u64,
}

/// Usage-tracked bitmap cache for pictures.
#[derive(Default)]
pub struct RasterCache {
    config: RasterCacheConfig,
    entries: HashMap<RasterCacheKey, Entry>,
    rasterizer: Option<Box<dyn PictureRasterizer>>,
    frame: u64,
    stats: RasterCacheStats,
}

impl fmt::Debug for RasterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterCache")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("rasterizer", &self.rasterizer)
            .field("frame", &self.frame)
            .field("stats", &self.stats)
            .finish()
    }
}

impl RasterCache {
    /// Create an empty cache with no rasterizer attached.
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration of this cache.
    #[inline]
    pub fn config(&self) -> &RasterCacheConfig {
        &self.config
    }

    /// Attach the rasterizer used to fill entries.
    pub fn set_rasterizer(&mut self, rasterizer: Option<Box<dyn PictureRasterizer>>) {
        self.rasterizer = rasterizer;
    }

    /// Returns `true` if a rasterizer is attached.
    #[inline]
    pub fn has_rasterizer(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Look up (and, once worthwhile, create) the bitmap for `picture`.
    ///
    /// `will_change` marks volatile content that is never cached.
    /// `is_complex` marks stable, expensive content that is cached on first
    /// sight regardless of size. Other pictures need at least
    /// [`min_op_count`](RasterCacheConfig::min_op_count) commands and
    /// [`access_threshold`](RasterCacheConfig::access_threshold) requests.
    ///
    /// Repeated requests for the same key return the same result instance.
    pub fn get_prerolled_image(
        &mut self,
        picture: &Picture,
        matrix: Affine,
        device_pixel_ratio: f64,
        anti_aliasing: u32,
        is_complex: bool,
        will_change: bool,
    ) -> Option<Arc<RasterCacheResult>> {
        if !self.is_worth_rasterizing(picture, is_complex, will_change) {
            return None;
        }
        let logical_rect = picture.paint_bounds();
        let device_rect = device_bounds(matrix, logical_rect);
        if is_empty_rect(device_rect) {
            return None;
        }

        let key = RasterCacheKey {
            picture: picture.id(),
            linear: linear_key(matrix),
            device_pixel_ratio: device_pixel_ratio.to_bits(),
            anti_aliasing,
        };
        let entry = self.entries.entry(key).or_default();
        entry.access_count += 1;
        entry.last_used_frame = self.frame;

        if !is_complex && entry.access_count < self.config.access_threshold {
            return None;
        }

        if entry.result.is_none() {
            let rasterizer = self.rasterizer.as_mut()?;
            let image = rasterizer.rasterize(picture, matrix, device_rect, anti_aliasing)?;
            self.stats.rasterized += 1;
            tracing::trace!(picture = ?key.picture, ?device_rect, "rasterized picture");
            entry.result = Some(Arc::new(RasterCacheResult {
                image,
                logical_rect,
                linear: key.linear,
            }));
        } else {
            self.stats.hits += 1;
        }
        entry.result.clone()
    }

    fn is_worth_rasterizing(&self, picture: &Picture, is_complex: bool, will_change: bool) -> bool {
        if will_change {
            return false;
        }
        if is_complex {
            return true;
        }
        picture.approximate_op_count() >= self.config.min_op_count
    }

    /// End-of-frame bookkeeping: evict stale entries and enforce the cap.
    pub fn sweep_after_frame(&mut self) {
        let frame = self.frame;
        let max_unused = self.config.max_unused_frames;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| frame.saturating_sub(e.last_used_frame) <= max_unused);

        if self.entries.len() > self.config.max_entries {
            let mut ages: Vec<(u64, RasterCacheKey)> = self
                .entries
                .iter()
                .map(|(k, e)| (e.last_used_frame, *k))
                .collect();
            ages.sort_unstable_by_key(|(used, _)| *used);
            let excess = self.entries.len() - self.config.max_entries;
            for (_, key) in ages.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let evicted = before - self.entries.len();
        self.stats.evicted += evicted as u64;
        if evicted > 0 {
            tracing::debug!(evicted, retained = self.entries.len(), "raster cache sweep");
        }
        self.frame += 1;
    }

    /// Drop every entry. Used when the GPU context that owns the bitmaps is lost.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of tracked entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activity counters.
    pub fn stats(&self) -> RasterCacheStats {
        RasterCacheStats {
            entries: self.entries.len(),
            images: self.entries.values().filter(|e| e.result.is_some()).count(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::Color;
    use understory_picture::{CanvasExt, RecordingCanvas};

    #[derive(Debug, Default)]
    struct FakeRasterizer;

    impl PictureRasterizer for FakeRasterizer {
        fn rasterize(&mut self, _: &Picture, _: Affine, _: Rect, _: u32) -> Option<Image> {
            Some(Image::new(1, 1))
        }
    }

    fn picture(ops: usize) -> Picture {
        let mut canvas = RecordingCanvas::default();
        for i in 0..ops {
            let x = i as f64;
            canvas.draw_rect(Rect::new(x, 0.0, x + 1.0, 1.0), &Paint::fill(Color::WHITE));
        }
        canvas.end_recording().unwrap()
    }

    fn get(
        cache: &mut RasterCache,
        picture: &Picture,
        matrix: Affine,
        is_complex: bool,
    ) -> Option<Arc<RasterCacheResult>> {
        cache.get_prerolled_image(picture, matrix, 1.0, 0, is_complex, false)
    }

    fn cache() -> RasterCache {
        let mut cache = RasterCache::new(RasterCacheConfig::default());
        cache.set_rasterizer(Some(Box::new(FakeRasterizer)));
        cache
    }

    #[test]
    fn simple_pictures_are_never_cached() {
        let mut cache = cache();
        let p = picture(2);
        for _ in 0..5 {
            assert!(get(&mut cache, &p, Affine::IDENTITY, false).is_none());
        }
        assert!(get(&mut cache, &p, Affine::IDENTITY, true).is_some());
    }

    #[test]
    fn threshold_must_be_reached() {
        let mut cache = cache();
        let p = picture(12);
        assert!(get(&mut cache, &p, Affine::IDENTITY, false).is_none());
        assert!(get(&mut cache, &p, Affine::IDENTITY, false).is_none());
        assert!(get(&mut cache, &p, Affine::IDENTITY, false).is_some());
    }

    #[test]
    fn will_change_bypasses() {
        let mut cache = cache();
        let p = picture(12);
        assert!(cache.get_prerolled_image(&p, Affine::IDENTITY, 1.0, 0, true, true).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn integral_translation_shares_entry() {
        let mut cache = cache();
        let p = picture(1);
        let a = get(&mut cache, &p, Affine::translate((3.0, 4.0)), true);
        let b = get(&mut cache, &p, Affine::translate((9.0, 1.0)), true);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(cache.len(), 1);
        let c = get(&mut cache, &p, Affine::scale(2.0), true);
        assert!(c.is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn unused_entries_are_swept() {
        let mut cache = cache();
        let p = picture(1);
        let q = picture(1);
        get(&mut cache, &p, Affine::IDENTITY, true);
        cache.sweep_after_frame();
        assert_eq!(cache.len(), 1);

        get(&mut cache, &q, Affine::IDENTITY, true);
        cache.sweep_after_frame();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evicted, 1);
    }

    #[test]
    fn entry_cap_drops_least_recently_used() {
        let config = RasterCacheConfig::default()
            .with_max_unused_frames(10)
            .with_max_entries(2);
        let mut cache = RasterCache::new(config);
        cache.set_rasterizer(Some(Box::new(FakeRasterizer)));
        let pictures: Vec<_> = (0..3).map(|_| picture(1)).collect();
        for p in &pictures {
            get(&mut cache, p, Affine::IDENTITY, true);
            cache.sweep_after_frame();
        }
        assert_eq!(cache.len(), 2);
        // The first picture was the least recently used and is gone.
        assert!(get(&mut cache, &pictures[0], Affine::IDENTITY, true).is_some());
        assert_eq!(cache.stats().rasterized, 4);
    }

    #[derive(Debug, Default)]
    struct FailingRasterizer;

    impl PictureRasterizer for FailingRasterizer {
        fn rasterize(&mut self, _: &Picture, _: Affine, _: Rect, _: u32) -> Option<Image> {
            None
        }
    }

    #[test]
    fn failed_rasterization_is_not_counted() {
        let mut cache = RasterCache::default();
        cache.set_rasterizer(Some(Box::new(FailingRasterizer)));
        let p = picture(1);
        assert!(get(&mut cache, &p, Affine::IDENTITY, true).is_none());
        assert!(get(&mut cache, &p, Affine::IDENTITY, true).is_none());
        assert_eq!(cache.stats().rasterized, 0);
        assert_eq!(cache.stats().images, 0);
    }

    #[test]
    fn no_rasterizer_means_miss() {
        let mut cache = RasterCache::default();
        let p = picture(1);
        assert!(get(&mut cache, &p, Affine::IDENTITY, true).is_none());
    }

    #[test]
    fn result_draws_at_device_bounds() {
        let result = RasterCacheResult {
            image: Image::new(10, 10),
            logical_rect: Rect::new(0.5, 0.5, 10.0, 10.0),
            linear: linear_key(Affine::IDENTITY),
        };
        assert!(result.matches(Affine::translate((20.0, 0.0))));
        assert!(!result.matches(Affine::scale(2.0)));
        let mut canvas = RecordingCanvas::default();
        canvas.translate(20.0, 0.0);
        result.draw(&mut canvas);
        canvas.translate(-20.0, 0.0);
        let pic = canvas.end_recording().unwrap();
        assert_eq!(pic.paint_bounds(), Rect::new(20.0, 0.0, 30.0, 10.0));
    }
}
