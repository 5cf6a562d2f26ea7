// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle and matrix helpers shared by the recorder and the compositor.
//!
//! Bounds throughout this workspace are conservative axis-aligned rectangles.
//! An "empty" rectangle (zero or negative area, or non-finite) never
//! contributes to a union, so the first non-empty rectangle seeds an
//! accumulated bound and later ones expand it.

use kurbo::{Affine, Rect, Vec2};

/// A rectangle large enough to stand in for "unbounded" culling.
///
/// This is used as the initial cull rect of a preroll pass and as the
/// fallback when a transform cannot be inverted.
pub const LARGEST_RECT: Rect = Rect::new(-1.0e9, -1.0e9, 1.0e9, 1.0e9);

/// Returns `true` if `rect` covers no area (or is not finite).
#[inline]
pub fn is_empty_rect(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0 && rect.is_finite())
}

/// Union of two bounds where empty rectangles are ignored.
///
/// If both are empty the result is [`Rect::ZERO`].
#[inline]
pub fn union_non_empty(acc: Rect, rect: Rect) -> Rect {
    match (is_empty_rect(acc), is_empty_rect(rect)) {
        (true, true) => Rect::ZERO,
        (false, true) => acc,
        (true, false) => rect,
        (false, false) => acc.union(rect),
    }
}

/// Intersection of two rectangles, normalized to [`Rect::ZERO`] when empty.
#[inline]
pub fn intersect_or_empty(a: Rect, b: Rect) -> Rect {
    let r = a.intersect(b);
    if is_empty_rect(r) { Rect::ZERO } else { r }
}

/// Map `rect` through `matrix` and return the axis-aligned bounding box.
///
/// Empty rectangles map to [`Rect::ZERO`].
#[inline]
pub fn map_rect(matrix: Affine, rect: Rect) -> Rect {
    if is_empty_rect(rect) {
        return Rect::ZERO;
    }
    matrix.transform_rect_bbox(rect)
}

/// Shift a rectangle by an offset, keeping empty rectangles empty.
#[inline]
pub fn shift_rect(rect: Rect, offset: Vec2) -> Rect {
    if is_empty_rect(rect) {
        Rect::ZERO
    } else {
        rect + offset
    }
}

/// The larger of the two axis scale factors of `matrix`.
///
/// Blur radii and stroke widths are scaled by this value when bounds are
/// computed in device space.
#[inline]
pub fn max_scale(matrix: Affine) -> f64 {
    let [a, b, c, d, _, _] = matrix.as_coeffs();
    let sx = a.hypot(b);
    let sy = c.hypot(d);
    sx.max(sy)
}

/// Return `matrix` with its translation rounded to whole device pixels.
#[inline]
pub fn pixel_aligned(matrix: Affine) -> Affine {
    let [a, b, c, d, e, f] = matrix.as_coeffs();
    Affine::new([a, b, c, d, e.round(), f.round()])
}

/// Bit pattern of the linear (non-translation) part of `matrix`.
///
/// Two matrices with equal linear parts differ at most by a translation, so
/// content rasterized under one can be blitted under the other.
#[inline]
pub fn linear_key(matrix: Affine) -> [u64; 4] {
    let [a, b, c, d, _, _] = matrix.as_coeffs();
    [a.to_bits(), b.to_bits(), c.to_bits(), d.to_bits()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_ignores_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(union_non_empty(Rect::ZERO, a), a);
        assert_eq!(union_non_empty(a, Rect::ZERO), a);
        assert_eq!(union_non_empty(Rect::ZERO, Rect::ZERO), Rect::ZERO);
        assert_eq!(
            union_non_empty(a, Rect::new(20.0, 20.0, 30.0, 30.0)),
            Rect::new(0.0, 0.0, 30.0, 30.0)
        );
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert!(is_empty_rect(intersect_or_empty(a, b)));
    }

    #[test]
    fn pixel_alignment_rounds_translation_only() {
        let m = Affine::new([2.0, 0.0, 0.0, 2.0, 10.4, 7.6]);
        let aligned = pixel_aligned(m);
        assert_eq!(aligned.as_coeffs(), [2.0, 0.0, 0.0, 2.0, 10.0, 8.0]);
        assert_eq!(linear_key(m), linear_key(aligned));
    }

    #[test]
    fn max_scale_of_rotation_is_one() {
        let m = Affine::rotate(0.7);
        assert!((max_scale(m) - 1.0).abs() < 1e-12);
        assert!((max_scale(Affine::scale_non_uniform(2.0, 3.0)) - 3.0).abs() < 1e-12);
    }
}
