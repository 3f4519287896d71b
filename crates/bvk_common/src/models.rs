//! Domain records for accounts, curriculum and scenarios.
//!
//! These are the rows the stores read and write. All money amounts are
//! integer cents; all ids are SQLite rowids. Derived fields (the profile
//! `level`) are recomputed on every write, never trusted from storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Schema version recorded in `schema_meta`.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name preferring the real name over the handle.
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.username.clone()
        } else {
            self.first_name.clone()
        }
    }
}

/// Per-user gamification record. `level` is always `level_for_points(total_points)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub age: Option<i64>,
    pub bio: String,
    pub city: String,
    pub country: String,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub total_points: i64,
    pub coins: i64,
    pub level: u8,
    pub last_login_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Consecutive-day activity counter. Invariant: `longest_streak >= current_streak`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStreak {
    pub user_id: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: NaiveDate,
}

/// Parent account addendum; children are linked rows in `parent_children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentProfile {
    pub user_id: i64,
    pub phone: String,
    pub occupation: String,
    pub report_frequency: ReportFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ReportFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFrequency::Daily => "daily",
            ReportFrequency::Weekly => "weekly",
            ReportFrequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "daily" => ReportFrequency::Daily,
            "monthly" => ReportFrequency::Monthly,
            _ => ReportFrequency::Weekly,
        }
    }
}

// ============================================================================
// Achievements
// ============================================================================

/// Badge category; rules match on this plus `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Lesson,
    Scenario,
    Streak,
    Points,
    Quiz,
    Special,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::Lesson => "lesson",
            AchievementKind::Scenario => "scenario",
            AchievementKind::Streak => "streak",
            AchievementKind::Points => "points",
            AchievementKind::Quiz => "quiz",
            AchievementKind::Special => "special",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lesson" => AchievementKind::Lesson,
            "scenario" => AchievementKind::Scenario,
            "streak" => AchievementKind::Streak,
            "points" => AchievementKind::Points,
            "quiz" => AchievementKind::Quiz,
            _ => AchievementKind::Special,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: AchievementKind,
    /// Count or point total that satisfies the rule; 0 when unused.
    pub threshold: i64,
    /// Display values; never applied to the profile on award.
    pub points_reward: i64,
    pub coins_reward: i64,
    pub is_active: bool,
    pub sort_order: i64,
}

/// Unique (user, achievement) join; append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedAchievement {
    pub achievement: Achievement,
    pub earned_at: DateTime<Utc>,
}

// ============================================================================
// Curriculum
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "beginner" => Difficulty::Beginner,
            "advanced" => Difficulty::Advanced,
            _ => Difficulty::Intermediate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub difficulty: Difficulty,
    pub min_age: i64,
    pub max_age: i64,
    pub total_duration_min: i64,
    pub certificate_available: bool,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub path_id: i64,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub duration_min: i64,
    /// 1-based position inside the path; unique per path.
    pub sort_order: i64,
    pub content: String,
    pub points: i64,
    pub coins: i64,
    pub requires_previous: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub lesson_id: i64,
    pub title: String,
    pub description: String,
    pub pass_percentage: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub points: i64,
    pub sort_order: i64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    pub sort_order: i64,
}

/// Per-user lesson progress; unique (user, lesson).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLesson {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    pub progress_percent: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// User-visible lesson state derived from progress and the unlock rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Locked,
    Unlocked,
    InProgress,
    Completed,
}

/// Append-only quiz attempt log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Proof of a finished path; unique (user, path) and unique number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    pub user_id: i64,
    pub path_id: i64,
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
}

// ============================================================================
// Scenarios
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioDifficulty {
    Easy,
    Medium,
    Hard,
}

impl ScenarioDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioDifficulty::Easy => "easy",
            ScenarioDifficulty::Medium => "medium",
            ScenarioDifficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "easy" => ScenarioDifficulty::Easy,
            "hard" => ScenarioDifficulty::Hard,
            _ => ScenarioDifficulty::Medium,
        }
    }
}

/// A micro-business simulation template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub difficulty: ScenarioDifficulty,
    pub initial_budget_cents: i64,
    pub target_profit_cents: i64,
    pub duration_label: String,
    pub age_range: String,
    pub points_reward: i64,
    pub coins_reward: i64,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub scenario_id: i64,
    pub name: String,
    pub icon: String,
    pub unit_cost_cents: i64,
    pub suggested_price_cents: i64,
}

/// Flavor event surfaced on day advance; no mechanical effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub id: i64,
    pub scenario_id: i64,
    pub description: String,
    pub icon: String,
    /// Relative selection weight among the scenario's events.
    pub weight: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    InProgress,
    Completed,
    Failed,
}

impl PlayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayStatus::InProgress => "in_progress",
            PlayStatus::Completed => "completed",
            PlayStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PlayStatus::Completed,
            "failed" => PlayStatus::Failed,
            _ => PlayStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlayStatus::InProgress)
    }
}

/// One user's live (or finished) run of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayThrough {
    pub id: i64,
    pub user_id: i64,
    pub scenario_id: i64,
    pub status: PlayStatus,
    pub budget_cents: i64,
    pub revenue_cents: i64,
    pub costs_cents: i64,
    pub days_played: i64,
    /// Frozen at end; `revenue - costs` at that moment.
    pub final_profit_cents: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PlayThrough {
    /// Running profit; equals `final_profit_cents` once ended.
    pub fn profit_cents(&self) -> i64 {
        self.revenue_cents - self.costs_cents
    }
}

/// Per-product stock inside a play-through; `on_hand` is never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub playthrough_id: i64,
    pub product_id: i64,
    pub on_hand: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Purchase,
    Sale,
    Expense,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Purchase => "purchase",
            LedgerKind::Sale => "sale",
            LedgerKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "purchase" => LedgerKind::Purchase,
            "sale" => LedgerKind::Sale,
            _ => LedgerKind::Expense,
        }
    }
}

/// Append-only record of a purchase, sale or daily expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub playthrough_id: i64,
    pub kind: LedgerKind,
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub unit_cents: i64,
    pub total_cents: i64,
    /// Day counter at the time of the entry.
    pub day: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in [
            PlayStatus::InProgress,
            PlayStatus::Completed,
            PlayStatus::Failed,
        ] {
            assert_eq!(PlayStatus::parse(s.as_str()), s);
        }
        assert_eq!(PlayStatus::parse("garbage"), PlayStatus::InProgress);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PlayStatus::InProgress.is_terminal());
        assert!(PlayStatus::Completed.is_terminal());
        assert!(PlayStatus::Failed.is_terminal());
    }

    #[test]
    fn test_achievement_kind_parse() {
        assert_eq!(AchievementKind::parse("lesson"), AchievementKind::Lesson);
        assert_eq!(AchievementKind::parse("quiz"), AchievementKind::Quiz);
        assert_eq!(AchievementKind::parse("unknown"), AchievementKind::Special);
    }

    #[test]
    fn test_profit_is_revenue_minus_costs() {
        let play = PlayThrough {
            id: 1,
            user_id: 1,
            scenario_id: 1,
            status: PlayStatus::InProgress,
            budget_cents: 5_000,
            revenue_cents: 12_000,
            costs_cents: 7_500,
            days_played: 3,
            final_profit_cents: None,
            started_at: Utc::now(),
            ended_at: None,
        };
        assert_eq!(play.profit_cents(), 4_500);
    }
}
