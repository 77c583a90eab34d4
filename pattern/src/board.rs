use crate::glyph::{Glyph, GlyphError, GlyphResult, Intensity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An ordered sequence of glyphs tiled along the calendar-day axis,
/// separated by blank gap weeks. The layout repeats with period
/// [`GlyphBoard::width_days`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphBoard {
    glyphs: Vec<Glyph>,
    gap_weeks: u32,
}

impl GlyphBoard {
    pub fn new(glyphs: Vec<Glyph>, gap_weeks: u32) -> GlyphResult<Self> {
        if glyphs.is_empty() {
            return Err(GlyphError::EmptyBoard);
        }
        Ok(GlyphBoard { glyphs, gap_weeks })
    }

    /// The built-in board: three stick-figure poses.
    pub fn builtin(gap_weeks: u32) -> Self {
        let rows: [&[&str]; 3] = [
            // Arms up, one leg out.
            &[
                "0030300", "0303030", "0003000", "0003000", "0003000", "0030000", "0300000",
            ],
            // Jumping.
            &[
                "0003000", "0033300", "0003000", "0303030", "0003000", "0030300", "0300030",
            ],
            // Twist.
            &[
                "0003000", "0030300", "0003000", "0030300", "0003000", "0300030", "0030300",
            ],
        ];

        // The digit tables above are compile-time constants; parse cannot
        // fail on them.
        let glyphs = rows
            .iter()
            .filter_map(|glyph| Glyph::parse(glyph).ok())
            .collect();
        GlyphBoard {
            glyphs,
            gap_weeks,
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Total pattern width in calendar days: glyph widths plus the gaps
    /// between consecutive glyphs.
    pub fn width_days(&self) -> i64 {
        let glyph_days: i64 = self.glyphs.iter().map(Glyph::width_days).sum();
        let gap_days = i64::from(self.gap_weeks) * 7 * (self.glyphs.len() as i64 - 1);
        glyph_days + gap_days
    }

    /// Map a calendar date to the intensity drawn at its position in the
    /// repeating layout. Dates before the epoch wrap around like any other.
    pub fn intensity_for(&self, date: NaiveDate) -> Intensity {
        // NaiveDate::default() is the Unix epoch, the fixed origin of the
        // repeating pattern.
        let epoch = NaiveDate::default();
        let days = date.signed_duration_since(epoch).num_days();
        let offset = days.rem_euclid(self.width_days());

        let gap_days = i64::from(self.gap_weeks) * 7;
        let mut start = 0i64;
        for (idx, glyph) in self.glyphs.iter().enumerate() {
            let end = start + glyph.width_days();
            if offset < end {
                let day_in_glyph = offset - start;
                let week = (day_in_glyph / 7) as usize;
                let day = (day_in_glyph % 7) as usize;
                return glyph.at(week, day);
            }
            start = end;

            if idx < self.glyphs.len() - 1 {
                if offset < start + gap_days {
                    return Intensity::None;
                }
                start += gap_days;
            }
        }

        Intensity::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(days_from_epoch: i64) -> NaiveDate {
        NaiveDate::default() + chrono::Duration::days(days_from_epoch)
    }

    #[test]
    fn test_builtin_board_dimensions() {
        let board = GlyphBoard::builtin(1);
        assert_eq!(board.glyph_count(), 3);
        // Three 7-week glyphs plus two one-week gaps.
        assert_eq!(board.width_days(), 3 * 49 + 2 * 7);
    }

    #[test]
    fn test_width_without_gaps() {
        let board = GlyphBoard::builtin(0);
        assert_eq!(board.width_days(), 3 * 49);
    }

    #[test]
    fn test_empty_board_rejected() {
        assert_eq!(GlyphBoard::new(vec![], 1), Err(GlyphError::EmptyBoard));
    }

    #[test]
    fn test_intensity_always_in_range() {
        let board = GlyphBoard::builtin(1);
        for day in 0..board.width_days() * 2 {
            let level = board.intensity_for(date(day)).level();
            assert!(level <= 3, "day {} gave level {}", day, level);
        }
    }

    #[test]
    fn test_periodicity() {
        let board = GlyphBoard::builtin(1);
        let width = board.width_days();
        for day in 0..width {
            assert_eq!(
                board.intensity_for(date(day)),
                board.intensity_for(date(day + width)),
                "period mismatch at day {}",
                day
            );
        }
    }

    #[test]
    fn test_determinism() {
        let board = GlyphBoard::builtin(1);
        let d = date(1234);
        let first = board.intensity_for(d);
        for _ in 0..10 {
            assert_eq!(board.intensity_for(d), first);
        }
    }

    #[test]
    fn test_gap_days_are_blank() {
        let board = GlyphBoard::builtin(1);
        // The first gap spans offsets [49, 56).
        for offset in 49..56 {
            assert_eq!(board.intensity_for(date(offset)), Intensity::None);
        }
    }

    #[test]
    fn test_pre_epoch_dates_wrap() {
        let board = GlyphBoard::builtin(1);
        let width = board.width_days();
        for day in 0..width {
            assert_eq!(
                board.intensity_for(date(day - width)),
                board.intensity_for(date(day))
            );
        }
    }

    #[test]
    fn test_three_single_row_glyphs_no_gaps() {
        // 21-day layout: three one-row glyphs, no gaps.
        let glyphs = vec![
            Glyph::parse(&["1230123"]).unwrap(),
            Glyph::parse(&["2222222"]).unwrap(),
            Glyph::parse(&["3333333"]).unwrap(),
        ];
        let board = GlyphBoard::new(glyphs, 0).unwrap();
        assert_eq!(board.width_days(), 21);

        // Day 0 reads the first glyph's row 0, column 0.
        assert_eq!(board.intensity_for(date(0)), Intensity::Light);
        // Period check: day 22 matches day 1.
        assert_eq!(board.intensity_for(date(22)), board.intensity_for(date(1)));
        assert_eq!(board.intensity_for(date(22)), Intensity::Medium);
        // Days 7..14 read the second glyph.
        assert_eq!(board.intensity_for(date(8)), Intensity::Medium);
        assert_eq!(board.intensity_for(date(15)), Intensity::Dark);
    }
}
