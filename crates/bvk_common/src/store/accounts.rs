//! Account operations: users, profiles, streaks, badges, parent links.
//!
//! Registration and login are multi-row updates and run in one
//! transaction. The conn-level helpers at the bottom (`apply_points`,
//! `apply_milestones`) are shared with the curriculum and scenario
//! flows so awards always commit atomically with the action that
//! triggered them.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use super::{date_str, parse_date, parse_ts, parse_ts_opt, ts, Store};
use crate::achievements::{self, MilestoneEvent};
use crate::error::{BvkError, Result};
use crate::levels::level_for_points;
use crate::models::{
    Achievement, AchievementKind, DailyStreak, EarnedAchievement, ParentProfile, Profile,
    ReportFrequency, User,
};
use crate::streak::{self, StreakChange};

/// Input for registration; the password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub is_parent: bool,
}

/// Everything created by a successful registration
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub profile: Profile,
    pub streak: DailyStreak,
}

/// Result of recording a login
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub user: User,
    pub profile: Profile,
    pub streak: DailyStreak,
    pub is_parent: bool,
    pub newly_awarded: Vec<Achievement>,
}

/// Partial profile edit; None leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEdit {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
}

/// Headline lesson/scenario counters shown on profile screens
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ProgressCounts {
    pub completed_lessons: i64,
    pub in_progress_lessons: i64,
    pub completed_scenarios: i64,
    pub certificates: i64,
}

/// Profile page payload
#[derive(Debug, Clone)]
pub struct ProfileOverview {
    pub user: User,
    pub profile: Profile,
    pub streak: Option<DailyStreak>,
    pub earned: Vec<EarnedAchievement>,
    pub counts: ProgressCounts,
}

impl Store {
    /// Create the user plus profile, streak and (optionally) parent
    /// profile in one transaction. Registration day counts as streak
    /// day one.
    pub fn register_user(&self, new: NewUser, now: DateTime<Utc>) -> Result<RegisteredUser> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let username_taken: i64 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            params![new.username],
            |row| row.get(0),
        )?;
        if username_taken > 0 {
            return Err(BvkError::conflict("username already taken"));
        }

        let email_taken: i64 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?",
            params![new.email],
            |row| row.get(0),
        )?;
        if email_taken > 0 {
            return Err(BvkError::conflict("email already registered"));
        }

        tx.execute(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.username,
                new.email,
                new.password_hash,
                new.first_name,
                new.last_name,
                ts(now)
            ],
        )?;
        let user_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            INSERT INTO profiles
                (user_id, age, parent_name, parent_email, parent_phone, last_login_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.age,
                new.parent_name,
                new.parent_email,
                new.parent_phone,
                ts(now),
                ts(now)
            ],
        )?;

        let seeded = streak::fresh(user_id, now.date_naive());
        tx.execute(
            r#"
            INSERT INTO daily_streaks (user_id, current_streak, longest_streak, last_activity_date)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                user_id,
                seeded.current_streak,
                seeded.longest_streak,
                date_str(seeded.last_activity_date)
            ],
        )?;

        if new.is_parent {
            tx.execute(
                "INSERT INTO parent_profiles (user_id, report_frequency) VALUES (?, ?)",
                params![user_id, ReportFrequency::Weekly.as_str()],
            )?;
        }

        let user = get_user_conn(&tx, user_id)?.ok_or(BvkError::NotFound("user"))?;
        let profile = get_profile_conn(&tx, user_id)?.ok_or(BvkError::NotFound("profile"))?;
        tx.commit()?;

        Ok(RegisteredUser {
            user,
            profile,
            streak: seeded,
        })
    }

    /// Credentials lookup for login; None when the username is unknown
    pub fn credentials(&self, username: &str) -> Result<Option<(i64, String)>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Stamp a login: last-login time, streak transition, streak badges.
    pub fn record_login(&self, user_id: i64, now: DateTime<Utc>) -> Result<LoginRecord> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let user = get_user_conn(&tx, user_id)?.ok_or(BvkError::NotFound("user"))?;
        tx.execute(
            "UPDATE profiles SET last_login_at = ?, updated_at = ? WHERE user_id = ?",
            params![ts(now), ts(now), user_id],
        )?;

        let today = now.date_naive();
        let mut streak = get_streak_conn(&tx, user_id)?.unwrap_or_else(|| {
            // Pre-streak accounts get their record on first login
            streak::fresh(user_id, today)
        });
        let change = streak::advance(&mut streak, today);
        tx.execute(
            r#"
            INSERT INTO daily_streaks (user_id, current_streak, longest_streak, last_activity_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_activity_date = excluded.last_activity_date
            "#,
            params![
                user_id,
                streak.current_streak,
                streak.longest_streak,
                date_str(streak.last_activity_date)
            ],
        )?;

        let newly_awarded = if change == StreakChange::Unchanged {
            Vec::new()
        } else {
            apply_milestones(
                &tx,
                user_id,
                &[MilestoneEvent::StreakReached {
                    days: streak.current_streak,
                }],
                now,
            )?
        };

        let profile = get_profile_conn(&tx, user_id)?.ok_or(BvkError::NotFound("profile"))?;
        let is_parent = has_parent_profile(&tx, user_id)?;
        tx.commit()?;

        Ok(LoginRecord {
            user,
            profile,
            streak,
            is_parent,
            newly_awarded,
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.lock();
        get_user_conn(&conn, user_id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock();
        let user = conn
            .query_row(
                "SELECT id, username, email, first_name, last_name, created_at FROM users WHERE username = ?",
                params![username],
                row_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_profile(&self, user_id: i64) -> Result<Option<Profile>> {
        let conn = self.lock();
        get_profile_conn(&conn, user_id)
    }

    pub fn get_streak(&self, user_id: i64) -> Result<Option<DailyStreak>> {
        let conn = self.lock();
        get_streak_conn(&conn, user_id)
    }

    /// Apply a partial edit; email changes re-check uniqueness.
    pub fn update_profile(
        &self,
        user_id: i64,
        edit: ProfileEdit,
        now: DateTime<Utc>,
    ) -> Result<Profile> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if let Some(ref email) = edit.email {
            let taken: i64 = tx.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ? AND id != ?",
                params![email, user_id],
                |row| row.get(0),
            )?;
            if taken > 0 {
                return Err(BvkError::conflict("email already registered"));
            }
            tx.execute(
                "UPDATE users SET email = ? WHERE id = ?",
                params![email, user_id],
            )?;
        }
        if let Some(ref first_name) = edit.first_name {
            tx.execute(
                "UPDATE users SET first_name = ? WHERE id = ?",
                params![first_name, user_id],
            )?;
        }
        if let Some(ref last_name) = edit.last_name {
            tx.execute(
                "UPDATE users SET last_name = ? WHERE id = ?",
                params![last_name, user_id],
            )?;
        }

        let pairs: [(&str, Option<String>); 6] = [
            ("bio", edit.bio),
            ("city", edit.city),
            ("country", edit.country),
            ("parent_name", edit.parent_name),
            ("parent_email", edit.parent_email),
            ("parent_phone", edit.parent_phone),
        ];
        for (column, value) in pairs {
            if let Some(value) = value {
                tx.execute(
                    &format!("UPDATE profiles SET {} = ? WHERE user_id = ?", column),
                    params![value, user_id],
                )?;
            }
        }
        if let Some(age) = edit.age {
            tx.execute(
                "UPDATE profiles SET age = ? WHERE user_id = ?",
                params![age, user_id],
            )?;
        }
        tx.execute(
            "UPDATE profiles SET updated_at = ? WHERE user_id = ?",
            params![ts(now), user_id],
        )?;

        let profile = get_profile_conn(&tx, user_id)?.ok_or(BvkError::NotFound("profile"))?;
        tx.commit()?;
        Ok(profile)
    }

    pub fn set_password_hash(&self, user_id: i64, hash: &str) -> Result<()> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![hash, user_id],
        )?;
        if changed == 0 {
            return Err(BvkError::NotFound("user"));
        }
        Ok(())
    }

    pub fn password_hash_of(&self, user_id: i64) -> Result<String> {
        let conn = self.lock();
        conn.query_row(
            "SELECT password_hash FROM users WHERE id = ?",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(BvkError::NotFound("user"))
    }

    /// Active badge catalog, in display order
    pub fn achievement_catalog(&self) -> Result<Vec<Achievement>> {
        let conn = self.lock();
        load_catalog(&conn)
    }

    /// Badges this user has earned, newest first
    pub fn earned_achievements(&self, user_id: i64) -> Result<Vec<EarnedAchievement>> {
        let conn = self.lock();
        earned_conn(&conn, user_id, None)
    }

    pub fn recent_achievements(&self, user_id: i64, limit: i64) -> Result<Vec<EarnedAchievement>> {
        let conn = self.lock();
        earned_conn(&conn, user_id, Some(limit))
    }

    pub fn progress_counts(&self, user_id: i64) -> Result<ProgressCounts> {
        let conn = self.lock();
        progress_counts_conn(&conn, user_id)
    }

    /// Everything the profile page needs in one call
    pub fn profile_overview(&self, user_id: i64) -> Result<ProfileOverview> {
        let conn = self.lock();
        let user = get_user_conn(&conn, user_id)?.ok_or(BvkError::NotFound("user"))?;
        let profile = get_profile_conn(&conn, user_id)?.ok_or(BvkError::NotFound("profile"))?;
        let streak = get_streak_conn(&conn, user_id)?;
        let earned = earned_conn(&conn, user_id, None)?;
        let counts = progress_counts_conn(&conn, user_id)?;
        Ok(ProfileOverview {
            user,
            profile,
            streak,
            earned,
            counts,
        })
    }

    // ---- parent monitoring ----

    pub fn parent_profile(&self, user_id: i64) -> Result<Option<ParentProfile>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT user_id, phone, occupation, report_frequency FROM parent_profiles WHERE user_id = ?",
                params![user_id],
                |row| {
                    Ok(ParentProfile {
                        user_id: row.get(0)?,
                        phone: row.get(1)?,
                        occupation: row.get(2)?,
                        report_frequency: ReportFrequency::parse(&row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Link a child account by username
    pub fn add_child(&self, parent_id: i64, child_username: &str) -> Result<User> {
        let conn = self.lock();
        let child = conn
            .query_row(
                "SELECT id, username, email, first_name, last_name, created_at FROM users WHERE username = ?",
                params![child_username],
                row_user,
            )
            .optional()?
            .ok_or(BvkError::NotFound("user"))?;
        if child.id == parent_id {
            return Err(BvkError::validation("you cannot link your own account"));
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO parent_children (parent_user_id, child_user_id) VALUES (?, ?)",
            params![parent_id, child.id],
        )?;
        if inserted == 0 {
            return Err(BvkError::conflict("child already linked"));
        }
        Ok(child)
    }

    pub fn remove_child(&self, parent_id: i64, child_id: i64) -> Result<()> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM parent_children WHERE parent_user_id = ? AND child_user_id = ?",
            params![parent_id, child_id],
        )?;
        if removed == 0 {
            return Err(BvkError::NotFound("child"));
        }
        Ok(())
    }

    pub fn children_of(&self, parent_id: i64) -> Result<Vec<User>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.created_at
            FROM users u
            JOIN parent_children pc ON pc.child_user_id = u.id
            WHERE pc.parent_user_id = ?
            ORDER BY u.username
            "#,
        )?;
        let rows = stmt.query_map(params![parent_id], row_user)?;

        let mut children = Vec::new();
        for row in rows {
            children.push(row?);
        }
        Ok(children)
    }
}

// ---- conn-level helpers shared with the other store modules ----

pub(super) fn row_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        created_at: parse_ts(&row.get::<_, String>(5)?),
    })
}

fn row_profile(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(0)?,
        age: row.get(1)?,
        bio: row.get(2)?,
        city: row.get(3)?,
        country: row.get(4)?,
        parent_name: row.get(5)?,
        parent_email: row.get(6)?,
        parent_phone: row.get(7)?,
        total_points: row.get(8)?,
        coins: row.get(9)?,
        level: row.get::<_, i64>(10)? as u8,
        last_login_at: parse_ts_opt(row.get(11)?),
        updated_at: parse_ts(&row.get::<_, String>(12)?),
    })
}

fn row_achievement(row: &Row) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        kind: AchievementKind::parse(&row.get::<_, String>(4)?),
        threshold: row.get(5)?,
        points_reward: row.get(6)?,
        coins_reward: row.get(7)?,
        is_active: row.get::<_, i64>(8)? != 0,
        sort_order: row.get(9)?,
    })
}

pub(super) fn get_user_conn(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, first_name, last_name, created_at FROM users WHERE id = ?",
            params![user_id],
            row_user,
        )
        .optional()?;
    Ok(user)
}

pub(super) fn get_profile_conn(conn: &Connection, user_id: i64) -> Result<Option<Profile>> {
    let profile = conn
        .query_row(
            r#"
            SELECT user_id, age, bio, city, country, parent_name, parent_email, parent_phone,
                   total_points, coins, level, last_login_at, updated_at
            FROM profiles WHERE user_id = ?
            "#,
            params![user_id],
            row_profile,
        )
        .optional()?;
    Ok(profile)
}

pub(super) fn get_streak_conn(conn: &Connection, user_id: i64) -> Result<Option<DailyStreak>> {
    let streak = conn
        .query_row(
            "SELECT user_id, current_streak, longest_streak, last_activity_date FROM daily_streaks WHERE user_id = ?",
            params![user_id],
            |row| {
                Ok(DailyStreak {
                    user_id: row.get(0)?,
                    current_streak: row.get(1)?,
                    longest_streak: row.get(2)?,
                    last_activity_date: parse_date(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()?;
    Ok(streak)
}

pub(super) fn has_parent_profile(conn: &Connection, user_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parent_profiles WHERE user_id = ?",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(super) fn load_catalog(conn: &Connection) -> Result<Vec<Achievement>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, description, icon, kind, threshold, points_reward, coins_reward,
               is_active, sort_order
        FROM achievements WHERE is_active = 1 ORDER BY sort_order
        "#,
    )?;
    let rows = stmt.query_map([], row_achievement)?;

    let mut catalog = Vec::new();
    for row in rows {
        catalog.push(row?);
    }
    Ok(catalog)
}

fn earned_conn(
    conn: &Connection,
    user_id: i64,
    limit: Option<i64>,
) -> Result<Vec<EarnedAchievement>> {
    let mut sql = String::from(
        r#"
        SELECT a.id, a.name, a.description, a.icon, a.kind, a.threshold, a.points_reward,
               a.coins_reward, a.is_active, a.sort_order, ua.earned_at
        FROM user_achievements ua
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.user_id = ?
        ORDER BY ua.earned_at DESC
        "#,
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(EarnedAchievement {
            achievement: row_achievement(row)?,
            earned_at: parse_ts(&row.get::<_, String>(10)?),
        })
    })?;

    let mut earned = Vec::new();
    for row in rows {
        earned.push(row?);
    }
    Ok(earned)
}

pub(super) fn progress_counts_conn(conn: &Connection, user_id: i64) -> Result<ProgressCounts> {
    let completed_lessons: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_lessons WHERE user_id = ? AND completed = 1",
        params![user_id],
        |row| row.get(0),
    )?;
    let in_progress_lessons: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_lessons WHERE user_id = ? AND completed = 0",
        params![user_id],
        |row| row.get(0),
    )?;
    let completed_scenarios: i64 = conn.query_row(
        "SELECT COUNT(*) FROM playthroughs WHERE user_id = ? AND status = 'completed'",
        params![user_id],
        |row| row.get(0),
    )?;
    let certificates: i64 = conn.query_row(
        "SELECT COUNT(*) FROM certificates WHERE user_id = ?",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(ProgressCounts {
        completed_lessons,
        in_progress_lessons,
        completed_scenarios,
        certificates,
    })
}

/// Add points and coins to a profile and recompute the level column.
pub(super) fn apply_points(
    conn: &Connection,
    user_id: i64,
    points: i64,
    coins: i64,
    now: DateTime<Utc>,
) -> Result<Profile> {
    conn.execute(
        "UPDATE profiles SET total_points = total_points + ?, coins = coins + ?, updated_at = ? WHERE user_id = ?",
        params![points, coins, ts(now), user_id],
    )?;
    let total: i64 = conn.query_row(
        "SELECT total_points FROM profiles WHERE user_id = ?",
        params![user_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "UPDATE profiles SET level = ? WHERE user_id = ?",
        params![level_for_points(total) as i64, user_id],
    )?;
    get_profile_conn(conn, user_id)?.ok_or(BvkError::NotFound("profile"))
}

/// Match milestone events against the catalog and award what sticks.
/// Returns only the badges that were new for this user.
pub(super) fn apply_milestones(
    conn: &Connection,
    user_id: i64,
    events: &[MilestoneEvent],
    now: DateTime<Utc>,
) -> Result<Vec<Achievement>> {
    let catalog = load_catalog(conn)?;
    let mut awarded = Vec::new();
    for event in events {
        for hit in achievements::matching(event, &catalog) {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, earned_at) VALUES (?, ?, ?)",
                params![user_id, hit.id, ts(now)],
            )?;
            if inserted > 0 {
                awarded.push(hit.clone());
            }
        }
    }
    Ok(awarded)
}
