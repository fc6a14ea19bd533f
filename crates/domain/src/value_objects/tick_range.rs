//! Tick ranges of concentrated-liquidity positions.

use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Inclusive-lower, exclusive-upper tick interval of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Creates a range, rejecting inverted bounds.
    pub fn new(lower: i32, upper: i32) -> Result<Self, DomainError> {
        if lower > upper {
            return Err(DomainError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Whether the pool's current tick earns fees in this range.
    #[must_use]
    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick < self.upper
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    /// A range of the same width centred on `tick`, snapped to `tick_spacing`.
    #[must_use]
    pub fn recentred(&self, tick: i32, tick_spacing: u16) -> Self {
        let spacing = i32::from(tick_spacing.max(1));
        let width = ((self.width() + spacing - 1) / spacing * spacing).max(2 * spacing);
        let lower = (tick - width / 2).div_euclid(spacing) * spacing;
        Self {
            lower,
            upper: lower + width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let range = TickRange::new(-64, 64).unwrap();
        assert!(range.contains(-64));
        assert!(range.contains(0));
        assert!(range.contains(63));
        assert!(!range.contains(64));
        assert!(!range.contains(-65));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(matches!(
            TickRange::new(10, -10),
            Err(DomainError::InvalidRange { lower: 10, upper: -10 })
        ));
    }

    #[test]
    fn test_recentred_keeps_width_and_alignment() {
        let range = TickRange::new(-640, 640).unwrap();
        let moved = range.recentred(1000, 64);
        assert_eq!(moved.lower % 64, 0);
        assert_eq!(moved.upper % 64, 0);
        assert_eq!(moved.width(), 1280);
        assert!(moved.contains(1000));
    }

    #[test]
    fn test_recentred_negative_tick() {
        let range = TickRange::new(0, 128).unwrap();
        let moved = range.recentred(-1000, 64);
        assert!(moved.contains(-1000));
        assert_eq!(moved.lower.rem_euclid(64), 0);
    }
}
