/// Glyph layout - turns a string into per-glyph blit records.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::font::{FontAtlas, FIRST_GLYPH, GLYPH_COUNT};

/// Left margin the pen returns to after a newline, in overlay pixels.
pub const LEFT_MARGIN: f32 = 2.0;

/// One glyph's blit record, uploaded verbatim to the placement buffer the
/// device-side compositor reads.
///
/// `x0/y0/dx/dy` select the source rectangle in the atlas; `dest` is the
/// (fractional) top-left destination position in the overlay image.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlyphPlacement {
    pub x0: u16,
    pub y0: u16,
    pub dx: u16,
    pub dy: u16,
    pub dest: [f32; 2],
}

/// Lay out `text` with the atlas' metrics.
///
/// The pen starts at `(LEFT_MARGIN, font_size)` and advances left-to-right
/// by each glyph's `xadvance`. `\n` is the only recognized control
/// character: it resets the pen to the left margin and advances one line
/// height (= `font_size`). Characters outside the baked ASCII range are
/// skipped.
pub fn layout_glyphs(text: &str, atlas: &FontAtlas) -> Vec<GlyphPlacement> {
    let origin = Vec2::new(LEFT_MARGIN, atlas.font_size);
    let mut pen = origin;
    let mut placements = Vec::with_capacity(text.len());

    for ch in text.chars() {
        if ch == '\n' {
            pen.x = origin.x;
            pen.y += atlas.font_size;
            continue;
        }

        let index = match (ch as u32).checked_sub(FIRST_GLYPH) {
            Some(index) if (index as usize) < GLYPH_COUNT => index as usize,
            _ => continue,
        };

        let glyph = &atlas.glyphs[index];
        placements.push(GlyphPlacement {
            x0: glyph.x0,
            y0: glyph.y0,
            dx: glyph.x1 - glyph.x0,
            dy: glyph.y1 - glyph.y0,
            dest: [pen.x + glyph.xoff, pen.y + glyph.yoff],
        });
        pen.x += glyph.xadvance;
    }

    placements
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod layout_tests;
