//! Minimal raster charting
//!
//! A chart is a white RGB canvas split into panels. Each panel maps data
//! coordinates onto its plot area and draws frames, gridlines, tick labels,
//! lines and bars with `imageproc`.

use crate::font::{draw_text, text_width, GLYPH_HEIGHT};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub(crate) const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
pub(crate) const RED: Rgb<u8> = Rgb([214, 39, 40]);
pub(crate) const GREEN: Rgb<u8> = Rgb([44, 160, 44]);
pub(crate) const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
pub(crate) const SKY_BLUE: Rgb<u8> = Rgb([135, 206, 235]);
pub(crate) const YELLOW: Rgb<u8> = Rgb([230, 200, 0]);
pub(crate) const ORANGE: Rgb<u8> = Rgb([255, 140, 0]);

const LABEL_SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;
const Y_TICKS: usize = 5;

/// Data range of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Span of `values` widened by 5% on each side; never zero-width
    pub fn padded(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            return Self { min: 0.0, max: 1.0 };
        }
        if min == max {
            return Self { min: min - 0.5, max: max + 0.5 };
        }
        let margin = (max - min) * 0.05;
        Self { min: min - margin, max: max + margin }
    }

    /// Range from zero up to the largest value plus 5%
    pub fn from_zero(values: impl IntoIterator<Item = f64>) -> Self {
        let max = values.into_iter().filter(|v| v.is_finite()).fold(0.0, f64::max);
        if max <= 0.0 {
            return Self { min: 0.0, max: 1.0 };
        }
        Self { min: 0.0, max: max * 1.05 }
    }

    /// Extend to include `value`
    pub fn including(self, value: f64) -> Self {
        Self { min: self.min.min(value), max: self.max.max(value) }
    }

    fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// One plot area on a chart, in pixels
#[derive(Debug, Clone, Copy)]
pub(crate) struct Panel {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub x: Range,
    pub y: Range,
}

impl Panel {
    /// Pixel position of a data point
    pub fn map(&self, x: f64, y: f64) -> (f32, f32) {
        let px = self.left as f64 + self.x.fraction(x) * self.width as f64;
        let py = self.top as f64 + (1.0 - self.y.fraction(y)) * self.height as f64;
        (px as f32, py as f32)
    }

    fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    fn right(&self) -> i32 {
        self.left + self.width as i32
    }
}

/// Pixel box reserved for a panel, including its labels
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// An RGB canvas being drawn on
pub(crate) struct Chart {
    image: RgbImage,
}

impl Chart {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// `rows × cols` equal cells below a header band of `header` pixels
    pub fn grid(&self, rows: u32, cols: u32, header: u32) -> Vec<Cell> {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let cell_width = self.width() / cols;
        let cell_height = self.height().saturating_sub(header) / rows;
        (0..rows)
            .flat_map(|r| {
                (0..cols).map(move |c| Cell {
                    left: (c * cell_width) as i32,
                    top: (header + r * cell_height) as i32,
                    width: cell_width,
                    height: cell_height,
                })
            })
            .collect()
    }

    /// Centered heading across the whole chart
    pub fn heading(&mut self, text: &str, y: i32) {
        let width = text_width(text, TITLE_SCALE + 1) as i32;
        let x = (self.width() as i32 - width) / 2;
        draw_text(&mut self.image, x, y, TITLE_SCALE + 1, text, BLACK);
    }

    /// Lay out a panel inside `cell`, draw its frame, gridlines, y ticks and labels
    pub fn panel(&mut self, cell: Cell, x: Range, y: Range, title: &str, x_label: &str, y_label: &str) -> Panel {
        let panel = self.layout(cell, x, y, title, x_label, y_label);
        for i in 0..=Y_TICKS {
            let value = y.min + (y.max - y.min) * i as f64 / Y_TICKS as f64;
            self.y_tick(&panel, value, &tick_label(value));
        }
        panel
    }

    /// Panel whose y axis holds categories labelled by the caller
    pub fn category_panel(&mut self, cell: Cell, x: Range, y: Range, title: &str, x_label: &str) -> Panel {
        self.layout(cell, x, y, title, x_label, "")
    }

    fn layout(&mut self, cell: Cell, x: Range, y: Range, title: &str, x_label: &str, y_label: &str) -> Panel {
        let margin_left = 110u32;
        let margin_right = 30u32;
        let margin_top = 60u32;
        let margin_bottom = 80u32;
        let panel = Panel {
            left: cell.left + margin_left as i32,
            top: cell.top + margin_top as i32,
            width: cell.width.saturating_sub(margin_left + margin_right).max(1),
            height: cell.height.saturating_sub(margin_top + margin_bottom).max(1),
            x,
            y,
        };

        for i in 0..=Y_TICKS {
            let value = y.min + (y.max - y.min) * i as f64 / Y_TICKS as f64;
            let (_, py) = panel.map(x.min, value);
            draw_line_segment_mut(
                &mut self.image,
                (panel.left as f32, py),
                (panel.right() as f32, py),
                GRID,
            );
        }

        let frame = Rect::at(panel.left, panel.top).of_size(panel.width, panel.height);
        draw_hollow_rect_mut(&mut self.image, frame, BLACK);

        draw_text(&mut self.image, panel.left, cell.top + 15, TITLE_SCALE, title, BLACK);
        draw_text(&mut self.image, panel.left, panel.top - 22, LABEL_SCALE, y_label, BLACK);
        let x_label_width = text_width(x_label, LABEL_SCALE) as i32;
        draw_text(
            &mut self.image,
            panel.left + (panel.width as i32 - x_label_width) / 2,
            panel.bottom() + 45,
            LABEL_SCALE,
            x_label,
            BLACK,
        );
        panel
    }

    /// Text under the x axis, centered on data coordinate `x`
    pub fn x_tick(&mut self, panel: &Panel, x: f64, label: &str) {
        let (px, _) = panel.map(x, panel.y.min);
        let width = text_width(label, LABEL_SCALE) as i32;
        let left = (px as i32 - width / 2)
            .min(panel.right() + 20 - width)
            .max(panel.left - 40);
        draw_text(&mut self.image, left, panel.bottom() + 12, LABEL_SCALE, label, BLACK);
    }

    /// Text left of the y axis at data coordinate `y`
    pub fn y_tick(&mut self, panel: &Panel, y: f64, label: &str) {
        let (_, py) = panel.map(panel.x.min, y);
        let left = panel.left - 8 - text_width(label, LABEL_SCALE) as i32;
        draw_text(
            &mut self.image,
            left,
            py as i32 - (GLYPH_HEIGHT * LABEL_SCALE / 2) as i32,
            LABEL_SCALE,
            label,
            BLACK,
        );
    }

    /// Legend entry in the panel's top-right corner
    pub fn legend(&mut self, panel: &Panel, slot: u32, label: &str, color: Rgb<u8>) {
        let width = text_width(label, LABEL_SCALE) as i32;
        let x = panel.right() - width - 50;
        let y = panel.top + 10 + (slot * 22) as i32;
        draw_filled_rect_mut(&mut self.image, Rect::at(x, y + 5).of_size(30, 4), color);
        draw_text(&mut self.image, x + 38, y, LABEL_SCALE, label, BLACK);
    }

    /// Polyline through `points`, 2 px wide
    pub fn line(&mut self, panel: &Panel, points: &[(f64, f64)], color: Rgb<u8>) {
        for pair in points.windows(2) {
            let (a, b) = (panel.map(pair[0].0, pair[0].1), panel.map(pair[1].0, pair[1].1));
            draw_line_segment_mut(&mut self.image, a, b, color);
            draw_line_segment_mut(&mut self.image, (a.0, a.1 + 1.0), (b.0, b.1 + 1.0), color);
        }
    }

    /// Dashed polyline through `points`
    pub fn dashed_line(&mut self, panel: &Panel, points: &[(f64, f64)], color: Rgb<u8>) {
        for (i, pair) in points.windows(2).enumerate() {
            if i % 2 == 0 {
                let (a, b) = (panel.map(pair[0].0, pair[0].1), panel.map(pair[1].0, pair[1].1));
                draw_line_segment_mut(&mut self.image, a, b, color);
            }
        }
    }

    /// Dashed horizontal line across the panel at `y`
    pub fn dashed_hline(&mut self, panel: &Panel, y: f64, color: Rgb<u8>) {
        let (_, py) = panel.map(panel.x.min, y);
        let mut x = panel.left;
        while x < panel.right() {
            let end = (x + 12).min(panel.right());
            draw_line_segment_mut(&mut self.image, (x as f32, py), (end as f32, py), color);
            draw_line_segment_mut(&mut self.image, (x as f32, py + 1.0), (end as f32, py + 1.0), color);
            x += 20;
        }
    }

    /// Round markers at `points`
    pub fn markers(&mut self, panel: &Panel, points: &[(f64, f64)], color: Rgb<u8>) {
        for &(x, y) in points {
            let (px, py) = panel.map(x, y);
            draw_filled_circle_mut(&mut self.image, (px as i32, py as i32), 4, color);
        }
    }

    /// Vertical bar from the x axis up to `y`, spanning `x0..x1`
    pub fn bar(&mut self, panel: &Panel, x0: f64, x1: f64, y: f64, fill: Rgb<u8>, edge: Option<Rgb<u8>>) {
        let base = panel.y.min.max(0.0).min(panel.y.max);
        let (left, top) = panel.map(x0, y);
        let (right, bottom) = panel.map(x1, base);
        let Some(rect) = rect_between(left, top, right, bottom) else {
            return;
        };
        draw_filled_rect_mut(&mut self.image, rect, fill);
        if let Some(edge) = edge {
            draw_hollow_rect_mut(&mut self.image, rect, edge);
        }
    }

    /// Horizontal bar from the y axis out to `x`, spanning `y0..y1`
    pub fn hbar(&mut self, panel: &Panel, y0: f64, y1: f64, x: f64, fill: Rgb<u8>) {
        let base = panel.x.min.max(0.0).min(panel.x.max);
        let (left, top) = panel.map(base, y1);
        let (right, bottom) = panel.map(x, y0);
        if let Some(rect) = rect_between(left, top, right, bottom) {
            draw_filled_rect_mut(&mut self.image, rect, fill);
        }
    }
}

fn rect_between(left: f32, top: f32, right: f32, bottom: f32) -> Option<Rect> {
    let (x0, x1) = (left.min(right).round() as i32, left.max(right).round() as i32);
    let (y0, y1) = (top.min(bottom).round() as i32, top.max(bottom).round() as i32);
    let width = (x1 - x0).max(0) as u32;
    let height = (y1 - y0).max(0) as u32;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size(width, height))
}

/// Compact numeric label for an axis tick
pub(crate) fn tick_label(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 100.0 || value == value.trunc() {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}
