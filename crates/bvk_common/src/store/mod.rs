//! SQLite-backed persistent storage.
//!
//! One `Store` handle owns the connection; the per-area impl blocks live
//! in `accounts`, `curriculum` and `scenarios`. Multi-row mutations run
//! inside a single transaction so a crash never leaves a half-applied
//! award or trade.

mod accounts;
mod curriculum;
mod scenarios;

pub use accounts::{
    LoginRecord, NewUser, ProfileEdit, ProfileOverview, ProgressCounts, RegisteredUser,
};
pub use curriculum::{LessonActivity, LessonCompletion, LessonView, PathOverview, QuizSubmission};
pub use scenarios::{
    BuyOutcome, DayOutcome, EndOutcome, PlayActivity, PlayView, SellOutcome, StartOutcome,
};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::achievements::builtin_catalog;
use crate::config;
use crate::models::SCHEMA_VERSION;

/// Application store backed by SQLite
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl Store {
    /// Open or create the store at the default location
    pub fn open_default() -> anyhow::Result<Self> {
        let db_path = config::data_dir().join("bizventure.db");
        Self::open(&db_path)
    }

    /// Open or create the store at a specific path
    pub fn open(path: &PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.clone(),
        };

        store.init_schema()?;
        Ok(store)
    }

    /// Get database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Initialize the database schema
    fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY REFERENCES users(id),
                age INTEGER,
                bio TEXT NOT NULL DEFAULT '',
                city TEXT NOT NULL DEFAULT '',
                country TEXT NOT NULL DEFAULT 'Norway',
                parent_name TEXT NOT NULL DEFAULT '',
                parent_email TEXT NOT NULL DEFAULT '',
                parent_phone TEXT NOT NULL DEFAULT '',
                total_points INTEGER NOT NULL DEFAULT 0,
                coins INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                last_login_at TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_streaks (
                user_id INTEGER PRIMARY KEY REFERENCES users(id),
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                last_activity_date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS parent_profiles (
                user_id INTEGER PRIMARY KEY REFERENCES users(id),
                phone TEXT NOT NULL DEFAULT '',
                occupation TEXT NOT NULL DEFAULT '',
                report_frequency TEXT NOT NULL DEFAULT 'weekly'
            );

            CREATE TABLE IF NOT EXISTS parent_children (
                parent_user_id INTEGER NOT NULL REFERENCES users(id),
                child_user_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (parent_user_id, child_user_id)
            );

            CREATE TABLE IF NOT EXISTS achievements (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL,
                threshold INTEGER NOT NULL DEFAULT 0,
                points_reward INTEGER NOT NULL DEFAULT 0,
                coins_reward INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS user_achievements (
                user_id INTEGER NOT NULL REFERENCES users(id),
                achievement_id INTEGER NOT NULL REFERENCES achievements(id),
                earned_at TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_id)
            );

            CREATE TABLE IF NOT EXISTS learning_paths (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'beginner',
                min_age INTEGER NOT NULL DEFAULT 6,
                max_age INTEGER NOT NULL DEFAULT 14,
                total_duration_min INTEGER NOT NULL DEFAULT 0,
                certificate_available INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS lessons (
                id INTEGER PRIMARY KEY,
                path_id INTEGER NOT NULL REFERENCES learning_paths(id),
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                duration_min INTEGER NOT NULL DEFAULT 10,
                sort_order INTEGER NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                points INTEGER NOT NULL DEFAULT 10,
                coins INTEGER NOT NULL DEFAULT 5,
                requires_previous INTEGER NOT NULL DEFAULT 1,
                is_active INTEGER NOT NULL DEFAULT 1,
                UNIQUE(path_id, sort_order)
            );

            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY,
                lesson_id INTEGER NOT NULL UNIQUE REFERENCES lessons(id),
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                pass_percentage INTEGER NOT NULL DEFAULT 70,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                quiz_id INTEGER NOT NULL REFERENCES quizzes(id),
                text TEXT NOT NULL,
                points INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0,
                explanation TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS answer_options (
                id INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id),
                text TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS user_lessons (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                lesson_id INTEGER NOT NULL REFERENCES lessons(id),
                completed INTEGER NOT NULL DEFAULT 0,
                progress_percent INTEGER NOT NULL DEFAULT 0,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                UNIQUE(user_id, lesson_id)
            );

            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                quiz_id INTEGER NOT NULL REFERENCES quizzes(id),
                score INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                percentage INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS certificates (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                path_id INTEGER NOT NULL REFERENCES learning_paths(id),
                certificate_number TEXT NOT NULL UNIQUE,
                issued_at TEXT NOT NULL,
                UNIQUE(user_id, path_id)
            );

            CREATE TABLE IF NOT EXISTS scenarios (
                id INTEGER PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'easy',
                initial_budget_cents INTEGER NOT NULL,
                target_profit_cents INTEGER NOT NULL,
                duration_label TEXT NOT NULL DEFAULT '',
                age_range TEXT NOT NULL DEFAULT '',
                points_reward INTEGER NOT NULL DEFAULT 0,
                coins_reward INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                scenario_id INTEGER NOT NULL REFERENCES scenarios(id),
                name TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '',
                unit_cost_cents INTEGER NOT NULL,
                suggested_price_cents INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scenario_events (
                id INTEGER PRIMARY KEY,
                scenario_id INTEGER NOT NULL REFERENCES scenarios(id),
                description TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '',
                weight INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS playthroughs (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                scenario_id INTEGER NOT NULL REFERENCES scenarios(id),
                status TEXT NOT NULL DEFAULT 'in_progress',
                budget_cents INTEGER NOT NULL,
                revenue_cents INTEGER NOT NULL DEFAULT 0,
                costs_cents INTEGER NOT NULL DEFAULT 0,
                days_played INTEGER NOT NULL DEFAULT 0,
                final_profit_cents INTEGER,
                started_at TEXT NOT NULL,
                ended_at TEXT
            );

            CREATE TABLE IF NOT EXISTS inventory_items (
                playthrough_id INTEGER NOT NULL REFERENCES playthroughs(id),
                product_id INTEGER NOT NULL REFERENCES products(id),
                on_hand INTEGER NOT NULL DEFAULT 0 CHECK (on_hand >= 0),
                PRIMARY KEY (playthrough_id, product_id)
            );

            CREATE TABLE IF NOT EXISTS ledger_entries (
                id INTEGER PRIMARY KEY,
                playthrough_id INTEGER NOT NULL REFERENCES playthroughs(id),
                kind TEXT NOT NULL,
                product_id INTEGER REFERENCES products(id),
                quantity INTEGER NOT NULL DEFAULT 0,
                unit_cents INTEGER NOT NULL DEFAULT 0,
                total_cents INTEGER NOT NULL,
                day INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_lessons_path ON lessons(path_id);
            CREATE INDEX IF NOT EXISTS idx_user_lessons_user ON user_lessons(user_id);
            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user ON quiz_attempts(user_id);
            CREATE INDEX IF NOT EXISTS idx_playthroughs_user ON playthroughs(user_id);
            CREATE INDEX IF NOT EXISTS idx_ledger_play ON ledger_entries(playthrough_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_playthroughs_active
                ON playthroughs(user_id, scenario_id) WHERE status = 'in_progress';
            "#,
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        install_catalog(&conn)?;
        Ok(())
    }
}

/// Install the builtin badge catalog; existing names are left untouched
fn install_catalog(conn: &Connection) -> anyhow::Result<()> {
    for seed in builtin_catalog() {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO achievements
                (name, description, icon, kind, threshold, points_reward, coins_reward, is_active, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
            "#,
            params![
                seed.name,
                seed.description,
                seed.icon,
                seed.kind.as_str(),
                seed.threshold,
                seed.points_reward,
                seed.coins_reward,
                seed.sort_order
            ],
        )?;
    }
    Ok(())
}

// ---- column helpers shared by the per-area modules ----

pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .unwrap_or_else(|_| Utc::now().into())
        .with_timezone(&Utc)
}

pub(crate) fn parse_ts_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_ts(&s))
}

pub(crate) fn date_str(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_store_installs_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::open(&path).unwrap();

        let catalog = store.achievement_catalog().unwrap();
        assert_eq!(catalog.len(), 12);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let store = Store::open(&path).unwrap();
            assert_eq!(store.achievement_catalog().unwrap().len(), 12);
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.achievement_catalog().unwrap().len(), 12);
    }

    #[test]
    fn test_schema_version_recorded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::open(&path).unwrap();

        let conn = store.lock();
        let version: String = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION.to_string());
    }

    #[test]
    fn test_date_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_date(&date_str(d)), d);
        // Garbage falls back to today rather than erroring
        let fallback = parse_date("not-a-date");
        assert_eq!(fallback, Utc::now().date_naive());
    }
}
