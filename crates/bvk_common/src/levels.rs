//! Level system
//!
//! Levels 1-10 driven by lifetime points with a hand-tuned threshold
//! table rather than a formula.
//!
//! ## Point curve
//!
//! - Level 1: 0 (everyone starts here)
//! - Level 2: 100
//! - Level 3: 300
//! - Level 4: 600
//! - Level 5: 1,000
//! - Levels 6-10: 2,500 then +500 per level (3,000 / 3,500 / 4,000 / 4,500)
//!
//! The level column on a profile is never authoritative: it is recomputed
//! from `total_points` on every write.

use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;

/// Points required to *start* each level, indexed by `level - 1`.
pub const LEVEL_STARTS: [i64; 10] = [0, 100, 300, 600, 1000, 2500, 3000, 3500, 4000, 4500];

/// A player level (1-10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(pub u8);

impl Level {
    /// Create a new level (clamped to 1-10)
    pub fn new(level: u8) -> Self {
        Self(level.clamp(MIN_LEVEL, MAX_LEVEL))
    }

    /// Get the raw level number
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Points required to reach this level from zero
    pub fn points_required(&self) -> i64 {
        points_for_level(self.0)
    }

    /// Points still missing to reach the next level; 0 at max level
    pub fn points_to_next(&self, total_points: i64) -> i64 {
        if self.0 >= MAX_LEVEL {
            return 0;
        }
        (points_for_level(self.0 + 1) - total_points).max(0)
    }

    /// Calculate level from lifetime points
    pub fn from_points(total_points: i64) -> Self {
        for level in (MIN_LEVEL..=MAX_LEVEL).rev() {
            if total_points >= points_for_level(level) {
                return Self(level);
            }
        }
        Self(MIN_LEVEL)
    }

    /// Progress through the current level band as a fraction (0.0 - 1.0)
    pub fn progress_to_next(&self, total_points: i64) -> f64 {
        if self.0 >= MAX_LEVEL {
            return 1.0;
        }

        let band_start = points_for_level(self.0);
        let band_end = points_for_level(self.0 + 1);
        let band_size = band_end - band_start;

        if band_size == 0 {
            return 1.0;
        }

        let into_band = (total_points - band_start).max(0) as f64;
        (into_band / band_size as f64).clamp(0.0, 1.0)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(MIN_LEVEL)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Points required to start a level; out-of-range input is clamped
pub fn points_for_level(level: u8) -> i64 {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    LEVEL_STARTS[(level - 1) as usize]
}

/// Convenience wrapper used by stores: the stored level column
pub fn level_for_points(total_points: i64) -> u8 {
    Level::from_points(total_points).value()
}

/// Snapshot of a user's position on the curve, for progress screens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProgress {
    pub total_points: i64,
    pub level: u8,
    /// Points accumulated inside the current band
    pub points_into_level: i64,
    /// Width of the current band; 0 at max level
    pub band_size: i64,
    /// Points total at which the next level starts; None at max level
    pub next_level_at: Option<i64>,
    /// Whole percent through the band (100 at max level)
    pub percent: u8,
}

impl LevelProgress {
    pub fn from_points(total_points: i64) -> Self {
        let level = Level::from_points(total_points);
        let band_start = level.points_required();
        let (band_size, next_level_at) = if level.value() >= MAX_LEVEL {
            (0, None)
        } else {
            let next = points_for_level(level.value() + 1);
            (next - band_start, Some(next))
        };
        let percent = (level.progress_to_next(total_points) * 100.0).round() as u8;
        Self {
            total_points,
            level: level.value(),
            points_into_level: (total_points - band_start).max(0),
            band_size,
            next_level_at,
            percent,
        }
    }
}
