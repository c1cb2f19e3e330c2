//! Recurring weekly time blocks.
//!
//! A [`TimeBlock`] encodes where a lesson sits in the week pattern of a
//! term: an active-days bitmask, an active-weeks bitmask, a start slot and
//! a duration in slots. Everything above it (constraints, availability,
//! conflict indices) is expressed through the overlap and precedence
//! predicates defined here.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};
use crate::repository::ProblemConfig;

/// A recurring weekly placement: which days, which weeks, which slots.
///
/// Bit 0 of `days` is the first day of the week, bit 0 of `weeks` the first
/// week of the term. Immutable once constructed.
///
/// # Examples
///
/// ```
/// use tabula_model::{ProblemConfig, TimeBlock};
///
/// let config = ProblemConfig::default();
/// let a = TimeBlock::parse("1000100", "111", 8, 4, &config).unwrap();
/// let b = TimeBlock::parse("1000000", "111", 10, 4, &config).unwrap();
/// assert!(a.overlaps(&b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBlock {
    days: u8,
    weeks: u64,
    start: u16,
    length: u16,
}

impl TimeBlock {
    /// Creates a time block from raw bitmasks, checking the slot range.
    pub fn new(days: u8, weeks: u64, start: u16, length: u16, slots_per_day: u16) -> Result<Self> {
        if length == 0 {
            return Err(TabulaError::InvalidTime("length must be positive".into()));
        }
        if start as u32 + length as u32 > slots_per_day as u32 {
            return Err(TabulaError::InvalidTime(format!(
                "slots [{start}, {}) exceed {slots_per_day} slots per day",
                start as u32 + length as u32
            )));
        }
        Ok(Self {
            days,
            weeks,
            start,
            length,
        })
    }

    /// Creates a time block from `"10001"`-style day and week bit-strings.
    ///
    /// The first character is the first day of the week (resp. the first
    /// week of the term). Fails when a string contains a symbol other than
    /// `0`/`1`, is longer than the configured week/term (capped at the mask
    /// capacity of 7 days / 64 weeks), or when the slot range runs past the
    /// end of the day.
    pub fn parse(days: &str, weeks: &str, start: u16, length: u16, config: &ProblemConfig) -> Result<Self> {
        let days = parse_bits(days, (config.days_per_week as usize).min(7), "days")? as u8;
        let weeks = parse_bits(weeks, (config.weeks_per_term as usize).min(64), "weeks")?;
        Self::new(days, weeks, start, length, config.slots_per_day)
    }

    /// Active-days bitmask.
    pub fn days(&self) -> u8 {
        self.days
    }

    /// Active-weeks bitmask.
    pub fn weeks(&self) -> u64 {
        self.weeks
    }

    /// First slot of the block within a day.
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Duration in slots.
    pub fn length(&self) -> u16 {
        self.length
    }

    /// One-past-the-last slot of the block within a day.
    pub fn end(&self) -> u16 {
        self.start + self.length
    }

    /// Index of the first active day, or `u32::MAX` when no day is active.
    pub fn first_day(&self) -> u32 {
        if self.days == 0 {
            u32::MAX
        } else {
            self.days.trailing_zeros()
        }
    }

    /// Number of active days per week.
    pub fn day_count(&self) -> u32 {
        self.days.count_ones()
    }

    /// True when both blocks are active on at least one common day of a
    /// common week.
    pub fn shares_day_and_week(&self, other: &TimeBlock) -> bool {
        self.days & other.days != 0 && self.weeks & other.weeks != 0
    }

    /// True when the blocks collide: common day, common week, intersecting
    /// slot ranges.
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.overlaps_with_travel(other, 0)
    }

    /// Overlap test with each slot range inflated by a travel buffer, used
    /// for bookings in rooms a shared attendee must walk between.
    pub fn overlaps_with_travel(&self, other: &TimeBlock, travel: u16) -> bool {
        self.shares_day_and_week(other)
            && (self.start as u32) < other.end() as u32 + travel as u32
            && (other.start as u32) < self.end() as u32 + travel as u32
    }

    /// Strict precedence: compares (first active day, start slot)
    /// lexicographically. Irreflexive.
    pub fn is_earlier(&self, other: &TimeBlock) -> bool {
        (self.first_day(), self.start) < (other.first_day(), other.start)
    }

    /// Free slots between the two blocks on a shared day; 0 when they
    /// overlap. Only meaningful when [`shares_day_and_week`] holds.
    ///
    /// [`shares_day_and_week`]: TimeBlock::shares_day_and_week
    pub fn gap_to(&self, other: &TimeBlock) -> u16 {
        if self.start < other.end() && other.start < self.end() {
            0
        } else if self.end() <= other.start {
            other.start - self.end()
        } else {
            self.start - other.end()
        }
    }

    /// Slots from the earlier start to the later end of the two blocks.
    pub fn span_with(&self, other: &TimeBlock) -> u16 {
        self.end().max(other.end()) - self.start.min(other.start)
    }
}

fn parse_bits(bits: &str, max_len: usize, what: &str) -> Result<u64> {
    if bits.is_empty() || bits.len() > max_len {
        return Err(TabulaError::InvalidTime(format!(
            "{what} bit-string {bits:?} must have between 1 and {max_len} symbols"
        )));
    }
    let mut mask = 0u64;
    for (i, c) in bits.chars().enumerate() {
        match c {
            '1' => mask |= 1 << i,
            '0' => {}
            other => {
                return Err(TabulaError::InvalidTime(format!(
                    "{what} bit-string contains {other:?}"
                )))
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProblemConfig {
        ProblemConfig::default()
    }

    fn block(days: &str, weeks: &str, start: u16, length: u16) -> TimeBlock {
        TimeBlock::parse(days, weeks, start, length, &config()).unwrap()
    }

    #[test]
    fn parse_rejects_bad_symbols() {
        let err = TimeBlock::parse("10x01", "1", 0, 2, &config()).unwrap_err();
        assert!(matches!(err, TabulaError::InvalidTime(_)));
    }

    #[test]
    fn parse_rejects_overlong_bitstrings() {
        assert!(TimeBlock::parse("10101011", "1", 0, 2, &config()).is_err());
        let weeks = "1".repeat(65);
        assert!(TimeBlock::parse("1", &weeks, 0, 2, &config()).is_err());
    }

    #[test]
    fn parse_caps_bitstrings_at_the_mask_capacity() {
        // a configuration wider than the masks must not shift past bit 63
        // or drop day bits through the u8 cast
        let wide = ProblemConfig {
            days_per_week: 9,
            weeks_per_term: 80,
            ..ProblemConfig::default()
        };
        let weeks = "0".repeat(69) + "1";
        assert!(matches!(
            TimeBlock::parse("1", &weeks, 0, 2, &wide),
            Err(TabulaError::InvalidTime(_))
        ));
        assert!(matches!(
            TimeBlock::parse("000000001", "1", 0, 2, &wide),
            Err(TabulaError::InvalidTime(_))
        ));
        // within capacity the wide configuration still parses
        let block = TimeBlock::parse("0000001", "1", 0, 2, &wide).unwrap();
        assert_eq!(block.day_count(), 1);
    }

    #[test]
    fn parse_rejects_out_of_range_slots() {
        let slots = config().slots_per_day;
        assert!(TimeBlock::parse("1", "1", slots - 1, 2, &config()).is_err());
        assert!(TimeBlock::parse("1", "1", 0, 0, &config()).is_err());
    }

    #[test]
    fn overlap_requires_common_day_week_and_slots() {
        let a = block("10001", "111", 8, 4);
        assert!(a.overlaps(&block("10000", "111", 10, 4)));
        // disjoint days
        assert!(!a.overlaps(&block("01000", "111", 8, 4)));
        // disjoint weeks
        assert!(!a.overlaps(&block("10001", "0001", 8, 4)));
        // disjoint slots
        assert!(!a.overlaps(&block("10001", "111", 12, 4)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let blocks = [
            block("10001", "111", 8, 4),
            block("10000", "111", 10, 4),
            block("01000", "111", 8, 4),
            block("10001", "0001", 8, 4),
            block("11111", "1", 0, 12),
        ];
        for a in &blocks {
            for b in &blocks {
                assert_eq!(a.overlaps(b), b.overlaps(a));
                assert_eq!(
                    a.overlaps_with_travel(b, 3),
                    b.overlaps_with_travel(a, 3)
                );
            }
        }
    }

    #[test]
    fn travel_buffer_inflates_the_slot_range() {
        let a = block("1", "1", 8, 4); // ends at 12
        let b = block("1", "1", 13, 4);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps_with_travel(&b, 2));
    }

    #[test]
    fn is_earlier_is_irreflexive_and_orders_by_day_then_start() {
        let a = block("10000", "1", 8, 4);
        let b = block("01000", "1", 2, 4);
        let c = block("10000", "1", 10, 4);
        assert!(!a.is_earlier(&a));
        assert!(a.is_earlier(&b)); // earlier day wins over later start
        assert!(a.is_earlier(&c));
        assert!(!b.is_earlier(&a));
        // same day and start: neither precedes the other
        let d = block("10000", "01", 8, 6);
        assert!(!a.is_earlier(&d) && !d.is_earlier(&a));
    }

    #[test]
    fn gap_and_span() {
        let a = block("1", "1", 8, 4);
        let b = block("1", "1", 15, 3);
        assert_eq!(a.gap_to(&b), 3);
        assert_eq!(b.gap_to(&a), 3);
        assert_eq!(a.span_with(&b), 10);
        assert_eq!(a.gap_to(&block("1", "1", 10, 4)), 0);
    }
}
