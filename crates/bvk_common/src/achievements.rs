//! Achievement rules
//!
//! Badges live in a catalog row per badge (kind + threshold). Engines
//! raise `MilestoneEvent`s; the rule match below decides which catalog
//! entries a given event satisfies. Awarding itself is an INSERT OR
//! IGNORE on the (user, achievement) join, so re-awarding is a no-op.
//!
//! ## Builtin catalog
//!
//! | Badge            | Kind     | Threshold | Rule                       |
//! |------------------|----------|-----------|----------------------------|
//! | First Steps      | lesson   | 1         | exact completed-count      |
//! | Getting Started  | lesson   | 5         | exact completed-count      |
//! | Lesson Master    | lesson   | 10        | exact completed-count      |
//! | Perfect Score    | quiz     | -         | any 100% quiz              |
//! | Lemonade Expert  | scenario | 1         | exact completed-count      |
//! | Toy Tycoon       | scenario | 5         | exact completed-count      |
//! | Entrepreneur     | scenario | 10        | exact completed-count      |
//! | 7-Day Streak     | streak   | 7         | current streak >= 7        |
//! | Points Collector | points   | 100       | lifetime points >= 100     |
//! | Points Champion  | points   | 500       | lifetime points >= 500     |
//! | First Profit     | special  | -         | never auto-awarded         |
//! | The Investor     | special  | -         | never auto-awarded         |
//!
//! Count-based rules match the threshold exactly: the 2nd completed
//! lesson fires nothing. Value-based rules (streak, points) match on
//! crossing, so one jump can satisfy several badges at once.

use serde::{Deserialize, Serialize};

use crate::models::{Achievement, AchievementKind};

/// A milestone raised by the progression engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilestoneEvent {
    /// A lesson was completed; carries the new completed-lesson count
    LessonCompleted { total: i64 },
    /// A quiz was submitted with a 100% score
    QuizPerfectScore,
    /// A scenario finished successfully; carries the new completed count
    ScenarioCompleted { total: i64 },
    /// The login streak reached this many consecutive days
    StreakReached { days: i64 },
    /// Lifetime points reached this total
    PointsReached { total: i64 },
}

impl MilestoneEvent {
    /// Does this event satisfy a catalog rule of `kind` / `threshold`?
    pub fn satisfies(&self, kind: AchievementKind, threshold: i64) -> bool {
        match (self, kind) {
            (MilestoneEvent::LessonCompleted { total }, AchievementKind::Lesson) => {
                *total == threshold
            }
            (MilestoneEvent::ScenarioCompleted { total }, AchievementKind::Scenario) => {
                *total == threshold
            }
            (MilestoneEvent::QuizPerfectScore, AchievementKind::Quiz) => true,
            (MilestoneEvent::StreakReached { days }, AchievementKind::Streak) => {
                *days >= threshold
            }
            (MilestoneEvent::PointsReached { total }, AchievementKind::Points) => {
                *total >= threshold
            }
            // Special badges have no automatic rule
            _ => false,
        }
    }
}

/// Active catalog entries this event satisfies
pub fn matching<'a>(event: &MilestoneEvent, catalog: &'a [Achievement]) -> Vec<&'a Achievement> {
    catalog
        .iter()
        .filter(|a| a.is_active && event.satisfies(a.kind, a.threshold))
        .collect()
}

/// One row of the builtin catalog, installed when the table is empty
#[derive(Debug, Clone)]
pub struct CatalogSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub kind: AchievementKind,
    pub threshold: i64,
    pub points_reward: i64,
    pub coins_reward: i64,
    pub sort_order: i64,
}

/// The default badge set
pub fn builtin_catalog() -> Vec<CatalogSeed> {
    use AchievementKind::*;
    vec![
        CatalogSeed {
            name: "First Profit",
            description: "Earn your first profit",
            icon: "💰",
            kind: Special,
            threshold: 0,
            points_reward: 10,
            coins_reward: 5,
            sort_order: 1,
        },
        CatalogSeed {
            name: "Lemonade Expert",
            description: "Master the lemonade stand",
            icon: "🍋",
            kind: Scenario,
            threshold: 1,
            points_reward: 25,
            coins_reward: 10,
            sort_order: 2,
        },
        CatalogSeed {
            name: "Toy Tycoon",
            description: "Build a successful toy empire",
            icon: "🏆",
            kind: Scenario,
            threshold: 5,
            points_reward: 50,
            coins_reward: 25,
            sort_order: 3,
        },
        CatalogSeed {
            name: "The Investor",
            description: "Make your first investment",
            icon: "📈",
            kind: Special,
            threshold: 0,
            points_reward: 30,
            coins_reward: 15,
            sort_order: 4,
        },
        CatalogSeed {
            name: "7-Day Streak",
            description: "Login for 7 consecutive days",
            icon: "🕒",
            kind: Streak,
            threshold: 7,
            points_reward: 40,
            coins_reward: 20,
            sort_order: 5,
        },
        CatalogSeed {
            name: "Entrepreneur",
            description: "Complete 10 business scenarios",
            icon: "🏢",
            kind: Scenario,
            threshold: 10,
            points_reward: 100,
            coins_reward: 50,
            sort_order: 6,
        },
        CatalogSeed {
            name: "First Steps",
            description: "Complete your first lesson",
            icon: "🎯",
            kind: Lesson,
            threshold: 1,
            points_reward: 10,
            coins_reward: 5,
            sort_order: 7,
        },
        CatalogSeed {
            name: "Getting Started",
            description: "Complete 5 lessons",
            icon: "📚",
            kind: Lesson,
            threshold: 5,
            points_reward: 25,
            coins_reward: 10,
            sort_order: 8,
        },
        CatalogSeed {
            name: "Lesson Master",
            description: "Complete 10 lessons",
            icon: "📖",
            kind: Lesson,
            threshold: 10,
            points_reward: 50,
            coins_reward: 25,
            sort_order: 9,
        },
        CatalogSeed {
            name: "Perfect Score",
            description: "Get 100% on a quiz",
            icon: "💯",
            kind: Quiz,
            threshold: 0,
            points_reward: 30,
            coins_reward: 15,
            sort_order: 10,
        },
        CatalogSeed {
            name: "Points Collector",
            description: "Earn 100 points",
            icon: "⭐",
            kind: Points,
            threshold: 100,
            points_reward: 20,
            coins_reward: 10,
            sort_order: 11,
        },
        CatalogSeed {
            name: "Points Champion",
            description: "Earn 500 points",
            icon: "🌟",
            kind: Points,
            threshold: 500,
            points_reward: 50,
            coins_reward: 30,
            sort_order: 12,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(id: i64, kind: AchievementKind, threshold: i64, active: bool) -> Achievement {
        Achievement {
            id,
            name: format!("badge-{}", id),
            description: String::new(),
            icon: String::new(),
            kind,
            threshold,
            points_reward: 0,
            coins_reward: 0,
            is_active: active,
            sort_order: id,
        }
    }

    #[test]
    fn test_lesson_counts_match_exactly() {
        let first = MilestoneEvent::LessonCompleted { total: 1 };
        assert!(first.satisfies(AchievementKind::Lesson, 1));
        assert!(!first.satisfies(AchievementKind::Lesson, 5));

        let second = MilestoneEvent::LessonCompleted { total: 2 };
        assert!(!second.satisfies(AchievementKind::Lesson, 1));
        assert!(!second.satisfies(AchievementKind::Lesson, 5));

        let fifth = MilestoneEvent::LessonCompleted { total: 5 };
        assert!(fifth.satisfies(AchievementKind::Lesson, 5));
    }

    #[test]
    fn test_value_milestones_match_on_crossing() {
        let points = MilestoneEvent::PointsReached { total: 520 };
        assert!(points.satisfies(AchievementKind::Points, 100));
        assert!(points.satisfies(AchievementKind::Points, 500));
        assert!(!points.satisfies(AchievementKind::Points, 1000));

        let streak = MilestoneEvent::StreakReached { days: 9 };
        assert!(streak.satisfies(AchievementKind::Streak, 7));
        assert!(!streak.satisfies(AchievementKind::Streak, 30));
    }

    #[test]
    fn test_perfect_score_matches_quiz_kind_only() {
        let event = MilestoneEvent::QuizPerfectScore;
        assert!(event.satisfies(AchievementKind::Quiz, 0));
        assert!(!event.satisfies(AchievementKind::Lesson, 0));
        assert!(!event.satisfies(AchievementKind::Special, 0));
    }

    #[test]
    fn test_special_badges_never_auto_fire() {
        let events = [
            MilestoneEvent::LessonCompleted { total: 1 },
            MilestoneEvent::QuizPerfectScore,
            MilestoneEvent::ScenarioCompleted { total: 1 },
            MilestoneEvent::StreakReached { days: 100 },
            MilestoneEvent::PointsReached { total: 100_000 },
        ];
        for event in events {
            assert!(!event.satisfies(AchievementKind::Special, 0));
        }
    }

    #[test]
    fn test_matching_filters_inactive() {
        let catalog = vec![
            badge(1, AchievementKind::Points, 100, true),
            badge(2, AchievementKind::Points, 100, false),
            badge(3, AchievementKind::Points, 500, true),
        ];
        let event = MilestoneEvent::PointsReached { total: 150 };
        let hits = matching(&event, &catalog);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 12);

        // Lesson ladder at the expected counts
        let lesson_thresholds: Vec<i64> = catalog
            .iter()
            .filter(|c| c.kind == AchievementKind::Lesson)
            .map(|c| c.threshold)
            .collect();
        assert_eq!(lesson_thresholds, vec![1, 5, 10]);

        // Unique names and orders
        let mut names: Vec<&str> = catalog.iter().map(|c| c.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
    }
}
