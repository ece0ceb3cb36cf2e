//! Drawing primitives for annotations
//!
//! All drawing clips to the canvas; coordinates may lie partly or wholly
//! outside the image.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::font::LabelFont;
use crate::ocr::{Coordinates, Geometry};

/// Annotation red
pub const ANNOTATION_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Rectangle drawn around a flagged word, relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxGeometry {
    pub pad_left: i32,
    pub pad_top: i32,
    pub extend_right: i32,
    pub extend_bottom: i32,
    /// Label is drawn this far above the anchor
    pub label_offset: i32,
    pub thickness: u32,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self {
            pad_left: 5,
            pad_top: 5,
            extend_right: 100,
            extend_bottom: 30,
            label_offset: 25,
            thickness: 2,
        }
    }
}

impl BoxGeometry {
    /// Rectangle corners `(left, top, right, bottom)` for an anchor
    pub fn bounds(&self, anchor: Coordinates) -> (i32, i32, i32, i32) {
        (
            anchor.x.saturating_sub(self.pad_left),
            anchor.y.saturating_sub(self.pad_top),
            anchor.x.saturating_add(self.extend_right),
            anchor.y.saturating_add(self.extend_bottom),
        )
    }
}

/// Outline an inclusive rectangle, growing inwards for thickness > 1
pub fn draw_thick_rect(
    canvas: &mut RgbaImage,
    (left, top, right, bottom): (i32, i32, i32, i32),
    thickness: u32,
    color: Rgba<u8>,
) {
    // Keep edge arithmetic in range; clamped edges still fall off-canvas
    let margin = thickness as i32 + 1;
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let clamp_x = |v: i32| v.clamp(-margin, width + margin);
    let clamp_y = |v: i32| v.clamp(-margin, height + margin);
    let (left, right) = (clamp_x(left), clamp_x(right));
    let (top, bottom) = (clamp_y(top), clamp_y(bottom));

    for t in 0..thickness.max(1) as i32 {
        let (l, tp) = (left.saturating_add(t), top.saturating_add(t));
        let (r, b) = (right.saturating_sub(t), bottom.saturating_sub(t));
        if r < l || b < tp {
            break;
        }
        let rect = Rect::at(l, tp).of_size((r - l + 1) as u32, (b - tp + 1) as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Draw a flagged word: box around the anchor plus `label` above it
pub fn draw_error_box(
    canvas: &mut RgbaImage,
    font: &LabelFont,
    geometry: &BoxGeometry,
    anchor: Coordinates,
    label: &str,
    color: Rgba<u8>,
) {
    draw_thick_rect(canvas, geometry.bounds(anchor), geometry.thickness, color);

    let label_y = anchor.y.saturating_sub(geometry.label_offset);
    if anchor.x < canvas.width() as i32 && label_y < canvas.height() as i32 {
        font.draw(canvas, color, anchor.x, label_y, label);
    }
}

/// Closed polygon outline; `thickness` widens each edge by offset copies
pub fn draw_polygon_outline(canvas: &mut RgbaImage, points: &[(f32, f32)], thickness: u32, color: Rgba<u8>) {
    if points.len() < 2 {
        return;
    }
    let radius = (thickness.max(1) / 2) as i32;

    for i in 0..points.len() {
        let start = points[i];
        let end = points[(i + 1) % points.len()];
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(canvas, (start.0 + ox, start.1 + oy), (end.0 + ox, end.1 + oy), color);
            }
        }
    }
}

/// Outline a detection region in keyword-highlight mode
pub fn draw_region(canvas: &mut RgbaImage, geometry: &Geometry, color: Rgba<u8>) {
    match geometry {
        Geometry::Polygon { points } => {
            let points: Vec<(f32, f32)> = points.iter().map(|p| (p.x as f32, p.y as f32)).collect();
            draw_polygon_outline(canvas, &points, 3, color);
        }
        Geometry::Box {
            left,
            top,
            width,
            height,
        } => {
            let right = left.saturating_add(*width as i32);
            let bottom = top.saturating_add(*height as i32);
            draw_thick_rect(canvas, (*left, *top, right, bottom), 2, color);
        }
    }
}
