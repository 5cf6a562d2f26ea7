// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! On-screen frame timing diagnostics.

use std::time::Duration;

use kurbo::{Affine, Rect, Vec2};
use peniko::Color;
use understory_picture::{Canvas, CanvasExt, Paint, TextBlob};

use crate::layer::{Layer, LayerBase, PaintContext, PrerollContext};
use crate::stopwatch::{FRAME_BUDGET, SAMPLE_COUNT, Stopwatch};

bitflags::bitflags! {
    /// Which timing panels a [`PerformanceOverlayLayer`] shows.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PerformanceOverlayOptions: u8 {
        /// Show raster frame cost as text.
        const DISPLAY_RASTERIZER_STATISTICS   = 0b0001;
        /// Show raster frame cost as a bar chart.
        const VISUALIZE_RASTERIZER_STATISTICS = 0b0010;
        /// Show engine frame cost as text.
        const DISPLAY_ENGINE_STATISTICS       = 0b0100;
        /// Show engine frame cost as a bar chart.
        const VISUALIZE_ENGINE_STATISTICS     = 0b1000;
    }
}

const FONT_SIZE: f64 = 15.0;
const TEXT_PADDING: f64 = 8.0;

/// Draws frame statistics for the rasterizer and the engine.
///
/// The overlay always paints once constructed, even before any frame has
/// been timed.
#[derive(Debug)]
pub struct PerformanceOverlayLayer {
    base: LayerBase,
    options: PerformanceOverlayOptions,
    rect: Rect,
}

impl PerformanceOverlayLayer {
    /// Create an overlay occupying `rect`.
    pub fn new(options: PerformanceOverlayOptions, rect: Rect) -> Self {
        Self {
            base: LayerBase::new(),
            options,
            rect,
        }
    }

    /// Enabled panels.
    #[inline]
    pub fn options(&self) -> PerformanceOverlayOptions {
        self.options
    }
}

impl Layer for PerformanceOverlayLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn preroll(&mut self, _context: &mut PrerollContext<'_>, _matrix: Affine) {
        self.base.set_paint_bounds(self.rect);
    }

    fn paint(&mut self, context: &mut PaintContext<'_>) {
        let half = self.rect.height() * 0.5;
        let raster_panel = Rect::new(self.rect.x0, self.rect.y0, self.rect.x1, self.rect.y0 + half);
        let engine_panel = Rect::new(self.rect.x0, self.rect.y0 + half, self.rect.x1, self.rect.y1);

        let panels = [
            (
                context.raster_time,
                "Raster",
                raster_panel,
                PerformanceOverlayOptions::VISUALIZE_RASTERIZER_STATISTICS,
                PerformanceOverlayOptions::DISPLAY_RASTERIZER_STATISTICS,
            ),
            (
                context.engine_time,
                "Engine",
                engine_panel,
                PerformanceOverlayOptions::VISUALIZE_ENGINE_STATISTICS,
                PerformanceOverlayOptions::DISPLAY_ENGINE_STATISTICS,
            ),
        ];
        for (stopwatch, label, panel, visualize, display) in panels {
            if self.options.contains(visualize) {
                draw_chart(context.canvas, stopwatch, panel);
            }
            if self.options.contains(display) {
                draw_statistics(context.canvas, stopwatch, label, panel);
            }
        }
    }

    fn needs_painting(&self) -> bool {
        true
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn draw_statistics(canvas: &mut dyn Canvas, stopwatch: &Stopwatch, label: &str, panel: Rect) {
    let average = millis(stopwatch.average_lap());
    let fps = if average > 0.0 { 1000.0 / average } else { 0.0 };
    let text = format!(
        "{label}: {average:.1} ms/frame ({fps:.0} fps), max {:.1} ms",
        millis(stopwatch.max_lap())
    );
    let width = text.chars().count() as f64 * FONT_SIZE * 0.6;
    let blob = TextBlob::new(text, Rect::new(0.0, -FONT_SIZE, width, FONT_SIZE * 0.25));
    let origin = Vec2::new(panel.x0 + TEXT_PADDING, panel.y0 + TEXT_PADDING + FONT_SIZE);
    canvas.draw_text_blob(&blob, origin, &Paint::fill(Color::from_rgb8(0xff, 0xff, 0xff)));
}

fn draw_chart(canvas: &mut dyn Canvas, stopwatch: &Stopwatch, panel: Rect) {
    canvas.draw_rect(panel, &Paint::fill(Color::from_rgba8(0xff, 0xff, 0xff, 0x60)));

    // The panel spans two frame budgets; the budget line sits halfway up.
    let budget = millis(FRAME_BUDGET);
    let scale = panel.height() / (2.0 * budget);
    let bar_width = panel.width() / SAMPLE_COUNT as f64;
    let under = Paint::fill(Color::from_rgba8(0x00, 0xaa, 0x00, 0xff));
    let over = Paint::fill(Color::from_rgba8(0xff, 0x00, 0x00, 0xff));

    for (i, lap) in stopwatch.samples().enumerate() {
        let cost = millis(lap);
        let height = (cost * scale).min(panel.height());
        let x = panel.x0 + i as f64 * bar_width;
        let bar = Rect::new(x, panel.y1 - height, x + bar_width, panel.y1);
        canvas.draw_rect(bar, if cost > budget { &over } else { &under });
    }

    let budget_y = panel.y1 - budget * scale;
    canvas.draw_line(
        (panel.x0, budget_y).into(),
        (panel.x1, budget_y).into(),
        &Paint::stroke(Color::from_rgba8(0x00, 0x00, 0x00, 0xff), 1.0),
    );
}
