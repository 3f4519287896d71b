//! Daily streak tracking
//!
//! A streak counts consecutive calendar days with at least one login.
//! The transition runs once per login and is idempotent within a day:
//! same day is a no-op, the day after extends, anything longer resets
//! to 1. `longest_streak` never decreases.

use chrono::{Days, NaiveDate};

use crate::models::DailyStreak;

/// What a login did to the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already counted today
    Unchanged,
    /// Consecutive day, current incremented
    Extended,
    /// Missed at least one day, back to 1
    Reset,
}

/// Seed record created at registration: day one counts
pub fn fresh(user_id: i64, today: NaiveDate) -> DailyStreak {
    DailyStreak {
        user_id,
        current_streak: 1,
        longest_streak: 1,
        last_activity_date: today,
    }
}

/// Apply one login on `today` to the streak in place.
pub fn advance(streak: &mut DailyStreak, today: NaiveDate) -> StreakChange {
    if streak.last_activity_date == today {
        return StreakChange::Unchanged;
    }

    let yesterday = today
        .checked_sub_days(Days::new(1))
        .unwrap_or(streak.last_activity_date);

    let change = if streak.last_activity_date == yesterday {
        streak.current_streak += 1;
        StreakChange::Extended
    } else {
        streak.current_streak = 1;
        StreakChange::Reset
    };

    streak.longest_streak = streak.longest_streak.max(streak.current_streak);
    streak.last_activity_date = today;
    change
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_fresh_streak_counts_day_one() {
        let streak = fresh(7, day(1));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_activity_date, day(1));
    }

    #[test]
    fn test_same_day_is_noop() {
        let mut streak = fresh(7, day(1));
        assert_eq!(advance(&mut streak, day(1)), StreakChange::Unchanged);
        assert_eq!(advance(&mut streak, day(1)), StreakChange::Unchanged);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.last_activity_date, day(1));
    }

    #[test]
    fn test_consecutive_days_extend() {
        let mut streak = fresh(7, day(1));
        for d in 2..=6 {
            assert_eq!(advance(&mut streak, day(d)), StreakChange::Extended);
        }
        assert_eq!(streak.current_streak, 6);
        assert_eq!(streak.longest_streak, 6);
        assert_eq!(streak.last_activity_date, day(6));
    }

    #[test]
    fn test_gap_resets_but_longest_survives() {
        let mut streak = fresh(7, day(1));
        advance(&mut streak, day(2));
        advance(&mut streak, day(3));
        assert_eq!(streak.current_streak, 3);

        // Skip day 4
        assert_eq!(advance(&mut streak, day(5)), StreakChange::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_activity_date, day(5));
    }

    #[test]
    fn test_rebuild_after_reset_can_beat_longest() {
        let mut streak = fresh(7, day(1));
        advance(&mut streak, day(2));
        advance(&mut streak, day(5)); // Reset
        for d in 6..=10 {
            advance(&mut streak, day(d));
        }
        assert_eq!(streak.current_streak, 6);
        assert_eq!(streak.longest_streak, 6);
    }

    #[test]
    fn test_longest_never_decreases() {
        let mut streak = fresh(7, day(1));
        advance(&mut streak, day(2));
        advance(&mut streak, day(3));
        advance(&mut streak, day(10));
        advance(&mut streak, day(20));
        assert!(streak.longest_streak >= streak.current_streak);
        assert_eq!(streak.longest_streak, 3);
    }
}
