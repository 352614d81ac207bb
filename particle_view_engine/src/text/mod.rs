//! Text overlay support: pre-baked font atlas data and glyph layout.
//!
//! Font rasterization is an external collaborator's job: the engine
//! consumes a finished [`FontAtlas`] through the [`FontRasterizer`] trait
//! and only does layout and device uploads itself.

mod font;
mod layout;

pub use font::{FontAtlas, FontRasterizer, GlyphMetrics, ATLAS_SIZE, FIRST_GLYPH, GLYPH_COUNT};
pub use layout::{layout_glyphs, GlyphPlacement, LEFT_MARGIN};
