// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path geometry paired with the fill rule used to interpret it.

use kurbo::{BezPath, Ellipse, Rect, RoundedRect, Shape};
use peniko::Fill;

/// Tolerance used when converting analytic shapes into Bézier paths.
pub const PATH_TOLERANCE: f64 = 0.1;

/// A Bézier path with a fill rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    elements: BezPath,
    fill_rule: Fill,
}

impl Path {
    /// Create an empty path with the non-zero fill rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed rectangle.
    pub fn rect(rect: Rect) -> Self {
        rect.to_path(PATH_TOLERANCE).into()
    }

    /// A closed rounded rectangle.
    pub fn rounded_rect(rrect: RoundedRect) -> Self {
        rrect.to_path(PATH_TOLERANCE).into()
    }

    /// An ellipse inscribed in `rect`.
    pub fn oval(rect: Rect) -> Self {
        Ellipse::from_rect(rect).to_path(PATH_TOLERANCE).into()
    }

    /// Set the fill rule.
    pub fn with_fill_rule(mut self, fill_rule: Fill) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    /// The underlying Bézier path.
    #[inline]
    pub fn elements(&self) -> &BezPath {
        &self.elements
    }

    /// Mutable access to the underlying Bézier path.
    #[inline]
    pub fn elements_mut(&mut self) -> &mut BezPath {
        &mut self.elements
    }

    /// Fill rule used for filling and clipping.
    #[inline]
    pub fn fill_rule(&self) -> Fill {
        self.fill_rule
    }

    /// Returns `true` if the path has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.elements().is_empty()
    }

    /// Tight bounding box of the geometry, or [`Rect::ZERO`] for an empty path.
    pub fn bounds(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            self.elements.bounding_box()
        }
    }

    /// Append all elements of `other` to this path.
    pub fn extend_from(&mut self, other: &Self) {
        self.elements.extend(other.elements.iter());
    }
}

impl Default for Path {
    fn default() -> Self {
        BezPath::new().into()
    }
}

impl From<BezPath> for Path {
    fn from(elements: BezPath) -> Self {
        Self {
            elements,
            fill_rule: Fill::NonZero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_path_bounds_match_rect() {
        let r = Rect::new(1.0, 2.0, 11.0, 22.0);
        assert_eq!(Path::rect(r).bounds(), r);
    }

    #[test]
    fn empty_path_has_empty_bounds() {
        let p = Path::new();
        assert!(p.is_empty());
        assert_eq!(p.bounds(), Rect::ZERO);
    }

    #[test]
    fn extend_keeps_fill_rule_of_receiver() {
        let mut outer =
            Path::rect(Rect::new(0.0, 0.0, 10.0, 10.0)).with_fill_rule(Fill::EvenOdd);
        outer.extend_from(&Path::rect(Rect::new(2.0, 2.0, 8.0, 8.0)));
        assert_eq!(outer.fill_rule(), Fill::EvenOdd);
        assert_eq!(outer.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }
}
