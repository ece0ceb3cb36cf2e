//! Label font loading
//!
//! A scalable TTF is preferred: the configured path first, then a list of
//! common system locations. If none loads, labels fall back to the
//! built-in bitmap font, so loading never fails.

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use super::bitmap;

/// Default label size in pixels
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font used for annotation labels
pub enum LabelFont {
    Scalable { font: FontVec, size: f32 },
    /// Built-in 3x5 font; `dot` is the pixel size of one font dot
    Bitmap { dot: u32 },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalable { size, .. } => f.debug_struct("Scalable").field("size", size).finish(),
            Self::Bitmap { dot } => f.debug_struct("Bitmap").field("dot", dot).finish(),
        }
    }
}

impl LabelFont {
    /// Load the first usable font, falling back to the bitmap font
    pub fn load(preferred: Option<&Path>, size: f32) -> Self {
        let size = if size.is_finite() && size > 0.0 {
            size
        } else {
            DEFAULT_FONT_SIZE
        };

        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if let Some(font) = load_font_file(&path) {
                tracing::debug!(path = %path.display(), size = size, "Loaded label font");
                return Self::Scalable { font, size };
            }
        }

        tracing::warn!("No scalable font found, using built-in bitmap font");
        Self::bitmap(size)
    }

    /// Bitmap font sized to roughly match `size` pixels of cap height
    pub fn bitmap(size: f32) -> Self {
        let dot = (size / 8.0).round().max(1.0) as u32;
        Self::Bitmap { dot }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    ///
    /// Anti-aliased edges are blended as straight alpha, so labels keep
    /// their color on transparent layers.
    pub fn draw(&self, canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, text: &str) {
        match self {
            Self::Scalable { font, size } => {
                let (width, height) = text_size(*size, font, text);
                let pad = size.ceil() as u32;
                let mut mask = GrayImage::new(width + 2 * pad, height + 2 * pad);
                draw_text_mut(&mut mask, Luma([255]), pad as i32, pad as i32, *size, font, text);
                blend_coverage(canvas, &mask, x.saturating_sub(pad as i32), y.saturating_sub(pad as i32), color);
            }
            Self::Bitmap { dot } => bitmap::draw_text(canvas, color, x, y, *dot, text),
        }
    }
}

/// Paint `color` through a coverage mask placed at `(x, y)`, compositing
/// source-over with straight alpha
fn blend_coverage(canvas: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32, color: Rgba<u8>) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);

    for (mx, my, coverage) in mask.enumerate_pixels() {
        if coverage[0] == 0 {
            continue;
        }
        let (px, py) = (x as i64 + mx as i64, y as i64 + my as i64);
        if px < 0 || py < 0 || px >= width || py >= height {
            continue;
        }

        let dst = canvas.get_pixel_mut(px as u32, py as u32);
        let src_a = coverage[0] as f32 / 255.0 * color[3] as f32 / 255.0;
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            continue;
        }
        for c in 0..3 {
            let value = (color[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn load_font_file(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Ignoring unparseable font file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_font_file_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(load_font_file(&path).is_none());
        assert!(load_font_file(&dir.path().join("missing.ttf")).is_none());
    }

    #[test]
    fn test_load_never_fails() {
        let font = LabelFont::load(Some(Path::new("/nonexistent/font.ttf")), 20.0);
        let mut canvas = RgbaImage::new(120, 40);
        font.draw(&mut canvas, Rgba([255, 0, 0, 255]), 2, 2, "teh (paddle)");
        assert!(canvas.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_partial_coverage_keeps_color_on_transparent_canvas() {
        let mut canvas = RgbaImage::new(4, 1);
        let mask = GrayImage::from_raw(3, 1, vec![26, 255, 0]).unwrap();

        blend_coverage(&mut canvas, &mask, 1, 0, Rgba([255, 0, 0, 255]));

        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*canvas.get_pixel(1, 0), Rgba([255, 0, 0, 26]));
        assert_eq!(*canvas.get_pixel(2, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(3, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_partial_coverage_blends_over_opaque_canvas() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let mask = GrayImage::from_raw(1, 1, vec![51]).unwrap();

        blend_coverage(&mut canvas, &mask, 0, 0, Rgba([255, 0, 0, 255]));

        // 20% red over white
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 204, 204, 255]));
    }

    #[test]
    fn test_mask_outside_canvas_is_clipped() {
        let mut canvas = RgbaImage::new(2, 2);
        let mask = GrayImage::from_pixel(3, 3, Luma([255]));

        blend_coverage(&mut canvas, &mask, -2, -2, Rgba([255, 0, 0, 255]));
        blend_coverage(&mut canvas, &mask, i32::MAX - 1, 0, Rgba([255, 0, 0, 255]));

        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_bitmap_dot_size() {
        assert!(matches!(LabelFont::bitmap(20.0), LabelFont::Bitmap { dot: 3 }));
        assert!(matches!(LabelFont::bitmap(2.0), LabelFont::Bitmap { dot: 1 }));
    }
}
