use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Errors that can occur while constructing glyphs or boards
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GlyphError {
    #[error("glyph has no rows")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid intensity digit '{digit}' at row {row}, column {column}")]
    InvalidDigit {
        digit: char,
        row: usize,
        column: usize,
    },

    #[error("board has no glyphs")]
    EmptyBoard,
}

pub type GlyphResult<T> = Result<T, GlyphError>;

/// Commit density level for one calendar day.
///
/// The numeric level mirrors the digits a glyph is written in: 0 means no
/// commits, 3 means the darkest cell the calendar renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Intensity {
    None,
    Light,
    Medium,
    Dark,
}

impl Intensity {
    /// Parse a single glyph digit (0-3).
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(Intensity::None),
            '1' => Some(Intensity::Light),
            '2' => Some(Intensity::Medium),
            '3' => Some(Intensity::Dark),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Intensity::None => 0,
            Intensity::Light => 1,
            Intensity::Medium => 2,
            Intensity::Dark => 3,
        }
    }

    /// The commit-count range this level maps to.
    pub fn commit_range(self) -> RangeInclusive<u32> {
        match self {
            Intensity::None => 0..=0,
            Intensity::Light => 1..=2,
            Intensity::Medium => 3..=5,
            Intensity::Dark => 6..=8,
        }
    }

    /// Draw a commit count for this level from its range.
    pub fn sample_commits<R: Rng>(self, rng: &mut R) -> u32 {
        rng.gen_range(self.commit_range())
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// One bitmap in the pattern: rows of intensity digits, one row per week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    rows: Vec<Vec<Intensity>>,
}

impl Glyph {
    /// Parse a glyph from digit strings. Rows must be non-empty and of
    /// uniform width.
    pub fn parse(rows: &[&str]) -> GlyphResult<Self> {
        if rows.is_empty() {
            return Err(GlyphError::Empty);
        }

        let expected = rows[0].chars().count();
        if expected == 0 {
            return Err(GlyphError::Empty);
        }

        let mut parsed = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(expected);
            for (col_idx, digit) in row.chars().enumerate() {
                let cell = Intensity::from_digit(digit).ok_or(GlyphError::InvalidDigit {
                    digit,
                    row: row_idx,
                    column: col_idx,
                })?;
                cells.push(cell);
            }
            if cells.len() != expected {
                return Err(GlyphError::RaggedRow {
                    row: row_idx,
                    found: cells.len(),
                    expected,
                });
            }
            parsed.push(cells);
        }

        Ok(Glyph { rows: parsed })
    }

    /// Number of week-rows in this glyph.
    pub fn weeks(&self) -> usize {
        self.rows.len()
    }

    /// Width of this glyph measured in calendar days.
    pub fn width_days(&self) -> i64 {
        self.rows.len() as i64 * 7
    }

    /// Look up the cell at (week, day). Out-of-range lookups read as level 0.
    pub fn at(&self, week: usize, day: usize) -> Intensity {
        self.rows
            .get(week)
            .and_then(|row| row.get(day))
            .copied()
            .unwrap_or(Intensity::None)
    }
}
