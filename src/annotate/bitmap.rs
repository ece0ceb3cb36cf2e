//! Built-in 3x5 bitmap font.
//!
//! Used when no scalable font can be loaded. Covers uppercase letters,
//! digits and the punctuation that appears in labels; lowercase is drawn
//! as uppercase and anything else as a solid block.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const GLYPH_WIDTH: u32 = 3;

/// Rows of a glyph, top to bottom; bit 2 is the leftmost column
type Glyph = [u8; 5];

const BLOCK: Glyph = [0b111; 5];

fn glyph(c: char) -> Glyph {
    match c.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b110, 0b001, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ' ' => [0; 5],
        _ => BLOCK,
    }
}

/// Draw `text` with its top-left corner at `(x, y)`, each font dot `dot` pixels square.
///
/// Drawing outside the canvas is clipped.
pub fn draw_text(canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, dot: u32, text: &str) {
    let dot = dot.max(1);
    let advance = ((GLYPH_WIDTH + 1) * dot) as i32;

    for (i, c) in text.chars().enumerate() {
        let origin_x = x.saturating_add(advance.saturating_mul(i as i32));
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = origin_x.saturating_add((col * dot) as i32);
                let py = y.saturating_add(row as i32 * dot as i32);
                if px >= canvas.width() as i32 || py >= canvas.height() as i32 {
                    continue;
                }
                draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(dot, dot), color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_draws_glyph_dots() {
        let mut canvas = RgbaImage::new(20, 10);
        draw_text(&mut canvas, RED, 0, 0, 1, "T");

        // Top bar of T
        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(2, 0), RED);
        // Stem
        assert_eq!(*canvas.get_pixel(1, 4), RED);
        assert_eq!(canvas.get_pixel(0, 4)[3], 0);
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        assert_eq!(glyph('e'), glyph('E'));
        assert_eq!(glyph('\u{00e9}'), BLOCK);
    }

    #[test]
    fn test_clips_outside_canvas() {
        let mut canvas = RgbaImage::new(8, 8);
        draw_text(&mut canvas, RED, -20, -3, 2, "teh (paddle)");
        draw_text(&mut canvas, RED, 6, 6, 4, "X");
        draw_text(&mut canvas, RED, i32::MAX - 2, 0, 1, "WW");
    }
}
