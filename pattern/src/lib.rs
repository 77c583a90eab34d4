//! Glyph boards and the date-to-intensity mapping.
//!
//! A [`Glyph`] is a small grid of intensity digits; a [`GlyphBoard`] tiles a
//! sequence of glyphs (separated by blank gap weeks) along a repeating
//! calendar-day axis and maps any date to the [`Intensity`] drawn at that
//! position. The mapping is pure and deterministic: it depends only on the
//! date and the board layout.

pub mod board;
pub mod glyph;

pub use board::GlyphBoard;
pub use glyph::{Glyph, GlyphError, GlyphResult, Intensity};
