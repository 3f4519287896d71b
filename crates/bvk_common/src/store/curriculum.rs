//! Curriculum storage: paths, lessons, quizzes, progress, certificates.
//!
//! Completion is the only place points enter the system from lessons, so
//! `complete_inner` runs inside the caller's transaction together with
//! the point grant and any badge awards.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::accounts::{apply_milestones, apply_points, get_profile_conn};
use super::{parse_ts, parse_ts_opt, ts, Store};
use crate::achievements::MilestoneEvent;
use crate::curriculum::{self, QuestionWithOptions, QuizForm};
use crate::error::{BvkError, Result};
use crate::models::{
    Achievement, AnswerOption, Certificate, Difficulty, LearningPath, Lesson, LessonStatus,
    Profile, Question, Quiz, QuizAttempt, UserLesson,
};

/// A lesson with the viewing user's status
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub lesson: Lesson,
    pub status: LessonStatus,
    pub record: Option<UserLesson>,
}

/// Full path page: lessons in order plus completion summary
#[derive(Debug, Clone, Serialize)]
pub struct PathOverview {
    pub path: LearningPath,
    pub lessons: Vec<LessonView>,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub progress_percent: i64,
    pub certificate: Option<Certificate>,
}

/// Outcome of completing a lesson
#[derive(Debug, Clone, Serialize)]
pub struct LessonCompletion {
    pub lesson: Lesson,
    pub profile: Profile,
    pub newly_awarded: Vec<Achievement>,
    pub already_completed: bool,
    pub points_awarded: i64,
    pub coins_awarded: i64,
}

/// Outcome of a quiz submission
#[derive(Debug, Clone, Serialize)]
pub struct QuizSubmission {
    pub attempt: QuizAttempt,
    pub perfect: bool,
    pub lesson_completed: bool,
    pub profile: Option<Profile>,
    pub newly_awarded: Vec<Achievement>,
}

/// A progress record joined with its lesson, for activity feeds
#[derive(Debug, Clone, Serialize)]
pub struct LessonActivity {
    pub record: UserLesson,
    pub lesson: Lesson,
}

impl Store {
    // ---- content management (ids on inputs are ignored) ----

    pub fn create_path(&self, path: &LearningPath) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO learning_paths
                (title, description, icon, difficulty, min_age, max_age, total_duration_min,
                 certificate_available, sort_order, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                path.title,
                path.description,
                path.icon,
                path.difficulty.as_str(),
                path.min_age,
                path.max_age,
                path.total_duration_min,
                path.certificate_available as i64,
                path.sort_order,
                path.is_active as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_lesson(&self, lesson: &Lesson) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO lessons
                (path_id, title, description, icon, duration_min, sort_order, content,
                 points, coins, requires_previous, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                lesson.path_id,
                lesson.title,
                lesson.description,
                lesson.icon,
                lesson.duration_min,
                lesson.sort_order,
                lesson.content,
                lesson.points,
                lesson.coins,
                lesson.requires_previous as i64,
                lesson.is_active as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_quiz(&self, quiz: &Quiz) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO quizzes (lesson_id, title, description, pass_percentage, is_active)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                quiz.lesson_id,
                quiz.title,
                quiz.description,
                quiz.pass_percentage,
                quiz.is_active as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_question(&self, question: &Question) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO questions (quiz_id, text, points, sort_order, explanation)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                question.quiz_id,
                question.text,
                question.points,
                question.sort_order,
                question.explanation
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_answer_option(&self, option: &AnswerOption) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO answer_options (question_id, text, is_correct, sort_order)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                option.question_id,
                option.text,
                option.is_correct as i64,
                option.sort_order
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ---- reads ----

    pub fn list_paths(&self) -> Result<Vec<LearningPath>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, icon, difficulty, min_age, max_age, total_duration_min, certificate_available, sort_order, is_active FROM learning_paths WHERE is_active = 1 ORDER BY sort_order",
        )?;
        let rows = stmt.query_map([], row_path)?;

        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }

    pub fn get_path(&self, path_id: i64) -> Result<Option<LearningPath>> {
        let conn = self.lock();
        get_path_conn(&conn, path_id)
    }

    pub fn get_lesson(&self, lesson_id: i64) -> Result<Option<Lesson>> {
        let conn = self.lock();
        get_lesson_conn(&conn, lesson_id)
    }

    /// Path page with per-lesson status for this user
    pub fn path_overview(&self, user_id: i64, path_id: i64) -> Result<PathOverview> {
        let conn = self.lock();
        let path = get_path_conn(&conn, path_id)?.ok_or(BvkError::NotFound("learning path"))?;
        let lessons = views_for_path(&conn, user_id, path_id)?;

        let total_lessons = lessons.len() as i64;
        let completed_lessons = lessons
            .iter()
            .filter(|v| v.status == LessonStatus::Completed)
            .count() as i64;
        let progress_percent = curriculum::path_progress_percent(completed_lessons, total_lessons);

        let certificate = conn
            .query_row(
                "SELECT id, user_id, path_id, certificate_number, issued_at FROM certificates WHERE user_id = ? AND path_id = ?",
                params![user_id, path_id],
                row_certificate,
            )
            .optional()?;

        Ok(PathOverview {
            path,
            lessons,
            completed_lessons,
            total_lessons,
            progress_percent,
            certificate,
        })
    }

    /// Start (or resume) a lesson. Locked lessons refuse.
    pub fn start_lesson(&self, user_id: i64, lesson_id: i64, now: DateTime<Utc>) -> Result<LessonView> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let lesson = get_lesson_conn(&tx, lesson_id)?.ok_or(BvkError::NotFound("lesson"))?;
        if !unlocked_conn(&tx, user_id, &lesson)? {
            return Err(BvkError::conflict("lesson is locked"));
        }

        tx.execute(
            "INSERT OR IGNORE INTO user_lessons (user_id, lesson_id, started_at) VALUES (?, ?, ?)",
            params![user_id, lesson_id, ts(now)],
        )?;
        let record = user_lesson_conn(&tx, user_id, lesson_id)?;
        tx.commit()?;

        let status = curriculum::status_for(record.as_ref(), true);
        Ok(LessonView {
            lesson,
            status,
            record,
        })
    }

    /// Mark a lesson completed, award its points and coins and any
    /// badges that unlock. Completing twice is a no-op.
    pub fn complete_lesson(
        &self,
        user_id: i64,
        lesson_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let lesson = get_lesson_conn(&tx, lesson_id)?.ok_or(BvkError::NotFound("lesson"))?;
        if !unlocked_conn(&tx, user_id, &lesson)? {
            return Err(BvkError::conflict("lesson is locked"));
        }

        let (completed_now, profile, newly_awarded) = complete_inner(&tx, user_id, &lesson, now)?;
        tx.commit()?;

        Ok(LessonCompletion {
            already_completed: !completed_now,
            points_awarded: if completed_now { lesson.points } else { 0 },
            coins_awarded: if completed_now { lesson.coins } else { 0 },
            lesson,
            profile,
            newly_awarded,
        })
    }

    /// The lesson's quiz with questions and options, if it has one
    pub fn quiz_for_lesson(&self, lesson_id: i64) -> Result<Option<QuizForm>> {
        let conn = self.lock();
        let quiz = conn
            .query_row(
                "SELECT id, lesson_id, title, description, pass_percentage, is_active FROM quizzes WHERE lesson_id = ? AND is_active = 1",
                params![lesson_id],
                row_quiz,
            )
            .optional()?;
        let Some(quiz) = quiz else {
            return Ok(None);
        };
        let questions = questions_conn(&conn, quiz.id)?;
        Ok(Some(QuizForm { quiz, questions }))
    }

    /// Grade a submission, log the attempt, and on a pass run the lesson
    /// completion path. A 100% score counts for the perfect-score badge
    /// even when the lesson was already done.
    pub fn submit_quiz(
        &self,
        user_id: i64,
        quiz_id: i64,
        answers: &HashMap<i64, i64>,
        now: DateTime<Utc>,
    ) -> Result<QuizSubmission> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let quiz = tx
            .query_row(
                "SELECT id, lesson_id, title, description, pass_percentage, is_active FROM quizzes WHERE id = ? AND is_active = 1",
                params![quiz_id],
                row_quiz,
            )
            .optional()?
            .ok_or(BvkError::NotFound("quiz"))?;

        let questions = questions_conn(&tx, quiz.id)?;
        let grade = curriculum::grade_quiz(&questions, answers);
        let passed = grade.passed(quiz.pass_percentage);

        tx.execute(
            r#"
            INSERT INTO quiz_attempts (user_id, quiz_id, score, total_questions, percentage, passed, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                quiz_id,
                grade.score,
                grade.total_questions,
                grade.percentage,
                passed as i64,
                ts(now)
            ],
        )?;
        let attempt = QuizAttempt {
            id: tx.last_insert_rowid(),
            user_id,
            quiz_id,
            score: grade.score,
            total_questions: grade.total_questions,
            percentage: grade.percentage,
            passed,
            completed_at: now,
        };

        let mut newly_awarded = Vec::new();
        let mut lesson_completed = false;
        let mut profile = None;

        if passed {
            let lesson =
                get_lesson_conn(&tx, quiz.lesson_id)?.ok_or(BvkError::NotFound("lesson"))?;
            let (completed_now, updated, awards) = complete_inner(&tx, user_id, &lesson, now)?;
            lesson_completed = completed_now;
            profile = Some(updated);
            newly_awarded.extend(awards);

            if grade.is_perfect() {
                let awards =
                    apply_milestones(&tx, user_id, &[MilestoneEvent::QuizPerfectScore], now)?;
                newly_awarded.extend(awards);
            }
        }

        tx.commit()?;
        Ok(QuizSubmission {
            attempt,
            perfect: grade.is_perfect(),
            lesson_completed,
            profile,
            newly_awarded,
        })
    }

    /// Issue the path certificate once every active lesson is completed.
    /// Re-issuing returns the existing certificate.
    pub fn issue_certificate(
        &self,
        user_id: i64,
        path_id: i64,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<Certificate> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let path = get_path_conn(&tx, path_id)?.ok_or(BvkError::NotFound("learning path"))?;
        if !path.certificate_available {
            return Err(BvkError::validation("this path has no certificate"));
        }

        let total: i64 = tx.query_row(
            "SELECT COUNT(*) FROM lessons WHERE path_id = ? AND is_active = 1",
            params![path_id],
            |row| row.get(0),
        )?;
        let completed: i64 = tx.query_row(
            r#"
            SELECT COUNT(*) FROM user_lessons ul
            JOIN lessons l ON l.id = ul.lesson_id
            WHERE ul.user_id = ? AND l.path_id = ? AND l.is_active = 1 AND ul.completed = 1
            "#,
            params![user_id, path_id],
            |row| row.get(0),
        )?;
        if completed < total || total == 0 {
            return Err(BvkError::validation(
                "all lessons must be completed before the certificate is issued",
            ));
        }

        let existing = tx
            .query_row(
                "SELECT id, user_id, path_id, certificate_number, issued_at FROM certificates WHERE user_id = ? AND path_id = ?",
                params![user_id, path_id],
                row_certificate,
            )
            .optional()?;
        if let Some(cert) = existing {
            return Ok(cert);
        }

        let number = curriculum::certificate_number(rng, now.year(), user_id);
        tx.execute(
            "INSERT INTO certificates (user_id, path_id, certificate_number, issued_at) VALUES (?, ?, ?, ?)",
            params![user_id, path_id, number, ts(now)],
        )?;
        let cert = Certificate {
            id: tx.last_insert_rowid(),
            user_id,
            path_id,
            certificate_number: number,
            issued_at: now,
        };
        tx.commit()?;
        Ok(cert)
    }

    pub fn certificates_of(&self, user_id: i64) -> Result<Vec<Certificate>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, path_id, certificate_number, issued_at FROM certificates WHERE user_id = ? ORDER BY issued_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], row_certificate)?;

        let mut certs = Vec::new();
        for row in rows {
            certs.push(row?);
        }
        Ok(certs)
    }

    /// Latest lesson activity, newest started first
    pub fn recent_lessons(&self, user_id: i64, limit: i64) -> Result<Vec<LessonActivity>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT ul.id, ul.user_id, ul.lesson_id, ul.completed, ul.progress_percent,
                   ul.started_at, ul.completed_at,
                   l.id, l.path_id, l.title, l.description, l.icon, l.duration_min, l.sort_order,
                   l.content, l.points, l.coins, l.requires_previous, l.is_active
            FROM user_lessons ul
            JOIN lessons l ON l.id = ul.lesson_id
            WHERE ul.user_id = ?
            ORDER BY ul.started_at DESC
            LIMIT {}
            "#,
            limit
        ))?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(LessonActivity {
                record: row_user_lesson(row)?,
                lesson: Lesson {
                    id: row.get(7)?,
                    path_id: row.get(8)?,
                    title: row.get(9)?,
                    description: row.get(10)?,
                    icon: row.get(11)?,
                    duration_min: row.get(12)?,
                    sort_order: row.get(13)?,
                    content: row.get(14)?,
                    points: row.get(15)?,
                    coins: row.get(16)?,
                    requires_previous: row.get::<_, i64>(17)? != 0,
                    is_active: row.get::<_, i64>(18)? != 0,
                },
            })
        })?;

        let mut activity = Vec::new();
        for row in rows {
            activity.push(row?);
        }
        Ok(activity)
    }

    /// Average quiz percentage over all attempts, truncated; 0 with none
    pub fn average_quiz_percentage(&self, user_id: i64) -> Result<i64> {
        let conn = self.lock();
        let avg: Option<f64> = conn.query_row(
            "SELECT AVG(percentage) FROM quiz_attempts WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(avg.unwrap_or(0.0) as i64)
    }

    pub fn quiz_attempts_of(&self, user_id: i64, quiz_id: i64) -> Result<Vec<QuizAttempt>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, quiz_id, score, total_questions, percentage, passed, completed_at FROM quiz_attempts WHERE user_id = ? AND quiz_id = ? ORDER BY completed_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id, quiz_id], row_attempt)?;

        let mut attempts = Vec::new();
        for row in rows {
            attempts.push(row?);
        }
        Ok(attempts)
    }
}

// ---- row mappers and conn-level helpers ----

fn row_path(row: &Row) -> rusqlite::Result<LearningPath> {
    Ok(LearningPath {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        difficulty: Difficulty::parse(&row.get::<_, String>(4)?),
        min_age: row.get(5)?,
        max_age: row.get(6)?,
        total_duration_min: row.get(7)?,
        certificate_available: row.get::<_, i64>(8)? != 0,
        sort_order: row.get(9)?,
        is_active: row.get::<_, i64>(10)? != 0,
    })
}

fn row_lesson(row: &Row) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        path_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        duration_min: row.get(5)?,
        sort_order: row.get(6)?,
        content: row.get(7)?,
        points: row.get(8)?,
        coins: row.get(9)?,
        requires_previous: row.get::<_, i64>(10)? != 0,
        is_active: row.get::<_, i64>(11)? != 0,
    })
}

fn row_quiz(row: &Row) -> rusqlite::Result<Quiz> {
    Ok(Quiz {
        id: row.get(0)?,
        lesson_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        pass_percentage: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
    })
}

fn row_user_lesson(row: &Row) -> rusqlite::Result<UserLesson> {
    Ok(UserLesson {
        id: row.get(0)?,
        user_id: row.get(1)?,
        lesson_id: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
        progress_percent: row.get(4)?,
        started_at: parse_ts(&row.get::<_, String>(5)?),
        completed_at: parse_ts_opt(row.get(6)?),
    })
}

fn row_certificate(row: &Row) -> rusqlite::Result<Certificate> {
    Ok(Certificate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        path_id: row.get(2)?,
        certificate_number: row.get(3)?,
        issued_at: parse_ts(&row.get::<_, String>(4)?),
    })
}

fn row_attempt(row: &Row) -> rusqlite::Result<QuizAttempt> {
    Ok(QuizAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        quiz_id: row.get(2)?,
        score: row.get(3)?,
        total_questions: row.get(4)?,
        percentage: row.get(5)?,
        passed: row.get::<_, i64>(6)? != 0,
        completed_at: parse_ts(&row.get::<_, String>(7)?),
    })
}

fn get_path_conn(conn: &Connection, path_id: i64) -> Result<Option<LearningPath>> {
    let path = conn
        .query_row(
            "SELECT id, title, description, icon, difficulty, min_age, max_age, total_duration_min, certificate_available, sort_order, is_active FROM learning_paths WHERE id = ? AND is_active = 1",
            params![path_id],
            row_path,
        )
        .optional()?;
    Ok(path)
}

fn get_lesson_conn(conn: &Connection, lesson_id: i64) -> Result<Option<Lesson>> {
    let lesson = conn
        .query_row(
            "SELECT id, path_id, title, description, icon, duration_min, sort_order, content, points, coins, requires_previous, is_active FROM lessons WHERE id = ? AND is_active = 1",
            params![lesson_id],
            row_lesson,
        )
        .optional()?;
    Ok(lesson)
}

fn user_lesson_conn(
    conn: &Connection,
    user_id: i64,
    lesson_id: i64,
) -> Result<Option<UserLesson>> {
    let record = conn
        .query_row(
            "SELECT id, user_id, lesson_id, completed, progress_percent, started_at, completed_at FROM user_lessons WHERE user_id = ? AND lesson_id = ?",
            params![user_id, lesson_id],
            row_user_lesson,
        )
        .optional()?;
    Ok(record)
}

fn active_lessons_conn(conn: &Connection, path_id: i64) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT id, path_id, title, description, icon, duration_min, sort_order, content, points, coins, requires_previous, is_active FROM lessons WHERE path_id = ? AND is_active = 1 ORDER BY sort_order",
    )?;
    let rows = stmt.query_map(params![path_id], row_lesson)?;

    let mut lessons = Vec::new();
    for row in rows {
        lessons.push(row?);
    }
    Ok(lessons)
}

fn views_for_path(conn: &Connection, user_id: i64, path_id: i64) -> Result<Vec<LessonView>> {
    let lessons = active_lessons_conn(conn, path_id)?;

    let mut views = Vec::with_capacity(lessons.len());
    let mut previous_completed = false;
    for (i, lesson) in lessons.into_iter().enumerate() {
        let record = user_lesson_conn(conn, user_id, lesson.id)?;
        let unlocked = curriculum::is_unlocked(&lesson, i == 0, previous_completed);
        let status = curriculum::status_for(record.as_ref(), unlocked);
        previous_completed = status == LessonStatus::Completed;
        views.push(LessonView {
            lesson,
            status,
            record,
        });
    }
    Ok(views)
}

/// Single-lesson unlock check against the previous active lesson
fn unlocked_conn(conn: &Connection, user_id: i64, lesson: &Lesson) -> Result<bool> {
    let previous = conn
        .query_row(
            "SELECT id FROM lessons WHERE path_id = ? AND is_active = 1 AND sort_order < ? ORDER BY sort_order DESC LIMIT 1",
            params![lesson.path_id, lesson.sort_order],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    let (is_first, previous_completed) = match previous {
        None => (true, false),
        Some(prev_id) => {
            let completed = user_lesson_conn(conn, user_id, prev_id)?
                .map(|r| r.completed)
                .unwrap_or(false);
            (false, completed)
        }
    };
    Ok(curriculum::is_unlocked(lesson, is_first, previous_completed))
}

fn questions_conn(conn: &Connection, quiz_id: i64) -> Result<Vec<QuestionWithOptions>> {
    let mut stmt = conn.prepare(
        "SELECT id, quiz_id, text, points, sort_order, explanation FROM questions WHERE quiz_id = ? ORDER BY sort_order",
    )?;
    let rows = stmt.query_map(params![quiz_id], |row| {
        Ok(Question {
            id: row.get(0)?,
            quiz_id: row.get(1)?,
            text: row.get(2)?,
            points: row.get(3)?,
            sort_order: row.get(4)?,
            explanation: row.get(5)?,
        })
    })?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }

    let mut with_options = Vec::with_capacity(questions.len());
    let mut stmt = conn.prepare(
        "SELECT id, question_id, text, is_correct, sort_order FROM answer_options WHERE question_id = ? ORDER BY sort_order",
    )?;
    for question in questions {
        let rows = stmt.query_map(params![question.id], |row| {
            Ok(AnswerOption {
                id: row.get(0)?,
                question_id: row.get(1)?,
                text: row.get(2)?,
                is_correct: row.get::<_, i64>(3)? != 0,
                sort_order: row.get(4)?,
            })
        })?;
        let mut options = Vec::new();
        for row in rows {
            options.push(row?);
        }
        with_options.push(QuestionWithOptions { question, options });
    }
    Ok(with_options)
}

/// Shared completion path for direct completes and quiz passes. Returns
/// (completed_now, profile, newly awarded badges).
fn complete_inner(
    conn: &Connection,
    user_id: i64,
    lesson: &Lesson,
    now: DateTime<Utc>,
) -> Result<(bool, Profile, Vec<Achievement>)> {
    conn.execute(
        "INSERT OR IGNORE INTO user_lessons (user_id, lesson_id, started_at) VALUES (?, ?, ?)",
        params![user_id, lesson.id, ts(now)],
    )?;
    let record =
        user_lesson_conn(conn, user_id, lesson.id)?.ok_or(BvkError::NotFound("lesson record"))?;

    if record.completed {
        let profile = get_profile_conn(conn, user_id)?.ok_or(BvkError::NotFound("profile"))?;
        return Ok((false, profile, Vec::new()));
    }

    conn.execute(
        "UPDATE user_lessons SET completed = 1, progress_percent = 100, completed_at = ? WHERE id = ?",
        params![ts(now), record.id],
    )?;

    let profile = apply_points(conn, user_id, lesson.points, lesson.coins, now)?;

    let total_completed: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_lessons WHERE user_id = ? AND completed = 1",
        params![user_id],
        |row| row.get(0),
    )?;
    let newly_awarded = apply_milestones(
        conn,
        user_id,
        &[
            MilestoneEvent::LessonCompleted {
                total: total_completed,
            },
            MilestoneEvent::PointsReached {
                total: profile.total_points,
            },
        ],
        now,
    )?;

    Ok((true, profile, newly_awarded))
}
