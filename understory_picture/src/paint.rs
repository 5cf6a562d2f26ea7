// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint description, filters, and the geometric inflation they imply.

use kurbo::{Affine, Cap, Join};
use peniko::{BlendMode, Color};

/// Whether geometry is filled or stroked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintStyle {
    /// Fill the interior of the geometry.
    #[default]
    Fill,
    /// Stroke the outline of the geometry.
    Stroke,
}

/// How a blur mask filter treats the inside and outside of the shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurStyle {
    /// Blur inside and outside.
    #[default]
    Normal,
    /// Solid inside, blurred outside.
    Solid,
    /// Nothing inside, blurred outside.
    Outer,
    /// Blurred inside, nothing outside.
    Inner,
}

/// Mask filter applied to the coverage of a single draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaskFilter {
    /// Blur style.
    pub style: BlurStyle,
    /// Gaussian standard deviation in local units.
    pub sigma: f64,
}

impl MaskFilter {
    /// Create a blur mask filter.
    #[inline]
    pub const fn blur(style: BlurStyle, sigma: f64) -> Self {
        Self { style, sigma }
    }

    /// Distance the blur spreads coverage beyond the geometry, in device units.
    ///
    /// A Gaussian is treated as fully decayed at three standard deviations.
    #[inline]
    pub fn outset(&self, scale: f64) -> f64 {
        if self.sigma > 0.0 {
            3.0 * self.sigma * scale
        } else {
            0.0
        }
    }
}

/// Image filter applied to a layer or sampled from a backdrop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ImageFilter {
    /// Gaussian blur with separate X/Y standard deviations.
    Blur {
        /// Standard deviation along the X axis.
        sigma_x: f64,
        /// Standard deviation along the Y axis.
        sigma_y: f64,
    },
    /// Resample the input through an affine transform.
    Matrix {
        /// Transform applied to the input.
        transform: Affine,
    },
}

impl ImageFilter {
    /// Create a uniform blur filter.
    #[inline]
    pub const fn blur(sigma: f64) -> Self {
        Self::Blur {
            sigma_x: sigma,
            sigma_y: sigma,
        }
    }

    /// Distance the filter spreads content beyond its input, in device units.
    pub fn outset(&self, scale: f64) -> f64 {
        match self {
            Self::Blur { sigma_x, sigma_y } => 3.0 * sigma_x.max(*sigma_y).max(0.0) * scale,
            Self::Matrix { .. } => 0.0,
        }
    }
}

/// Parameters for a single draw or a save layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    /// Solid color used for the draw (or the layer tint for save layers).
    pub color: Color,
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Stroke width in local units; `0.0` means a hairline.
    pub stroke_width: f64,
    /// Stroke end cap.
    pub stroke_cap: Cap,
    /// Stroke corner join.
    pub stroke_join: Join,
    /// Miter limit for [`Join::Miter`].
    pub stroke_miter_limit: f64,
    /// Blend mode used when compositing the draw.
    pub blend_mode: BlendMode,
    /// Optional mask filter (blur) applied to coverage.
    pub mask_filter: Option<MaskFilter>,
    /// Optional image filter applied to the draw or layer output.
    pub image_filter: Option<ImageFilter>,
    /// Optional filter applied to the content already beneath a save layer.
    pub backdrop: Option<ImageFilter>,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            stroke_width: 0.0,
            stroke_cap: Cap::Butt,
            stroke_join: Join::Miter,
            stroke_miter_limit: 4.0,
            blend_mode: BlendMode::default(),
            mask_filter: None,
            image_filter: None,
            backdrop: None,
            anti_alias: true,
        }
    }
}

impl Paint {
    /// A fill paint with the given color.
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// A stroke paint with the given color and width.
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke,
            stroke_width: width,
            ..Self::default()
        }
    }

    /// Set the mask filter.
    pub fn with_mask_filter(mut self, filter: MaskFilter) -> Self {
        self.mask_filter = Some(filter);
        self
    }

    /// Set the backdrop filter.
    pub fn with_backdrop(mut self, filter: ImageFilter) -> Self {
        self.backdrop = Some(filter);
        self
    }

    /// Distance a stroke extends beyond the stroked geometry, in local units.
    ///
    /// Returns `0.0` for fills. `hairline` is the local width used for a
    /// zero-width stroke.
    pub fn stroke_outset(&self, hairline: f64) -> f64 {
        if self.style != PaintStyle::Stroke {
            return 0.0;
        }
        let half = if self.stroke_width > 0.0 {
            self.stroke_width * 0.5
        } else {
            hairline * 0.5
        };
        let mut multiplier = 1.0_f64;
        if self.stroke_join == Join::Miter {
            multiplier = multiplier.max(self.stroke_miter_limit);
        }
        if self.stroke_cap == Cap::Square {
            multiplier = multiplier.max(core::f64::consts::SQRT_2);
        }
        half * multiplier
    }

    /// Blur outset for the current mask filter at the given scale.
    #[inline]
    pub fn mask_outset(&self, scale: f64) -> f64 {
        self.mask_filter.map_or(0.0, |m| m.outset(scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_have_no_stroke_outset() {
        assert_eq!(Paint::fill(Color::WHITE).stroke_outset(1.0), 0.0);
    }

    #[test]
    fn miter_limit_scales_half_width() {
        let paint = Paint::stroke(Color::WHITE, 4.0);
        assert_eq!(paint.stroke_outset(1.0), 8.0);

        let round = Paint {
            stroke_join: Join::Round,
            ..paint
        };
        assert_eq!(round.stroke_outset(1.0), 2.0);
    }

    #[test]
    fn zero_sigma_blur_does_not_inflate() {
        let paint = Paint::fill(Color::WHITE).with_mask_filter(MaskFilter::blur(BlurStyle::Normal, 0.0));
        assert_eq!(paint.mask_outset(2.0), 0.0);
        let paint = paint.with_mask_filter(MaskFilter::blur(BlurStyle::Normal, 2.0));
        assert_eq!(paint.mask_outset(2.0), 12.0);
    }
}
