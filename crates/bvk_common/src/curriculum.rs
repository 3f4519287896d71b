//! Curriculum rules
//!
//! Pure logic for the lesson ladder: unlock rules, quiz grading and
//! certificate numbers. Persistence and the award side effects live in
//! the curriculum store; everything here is deterministic (the RNG for
//! certificate suffixes is injected).

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{AnswerOption, Lesson, LessonStatus, Question, Quiz, UserLesson};

/// Can this lesson be started? First-in-path and free-standing lessons
/// are always open; the rest wait for the previous lesson.
pub fn is_unlocked(lesson: &Lesson, is_first: bool, previous_completed: bool) -> bool {
    !lesson.requires_previous || is_first || previous_completed
}

/// User-visible status. An existing progress record wins over the lock
/// computation: a started lesson never reads as locked.
pub fn status_for(record: Option<&UserLesson>, unlocked: bool) -> LessonStatus {
    match record {
        Some(r) if r.completed => LessonStatus::Completed,
        Some(_) => LessonStatus::InProgress,
        None if unlocked => LessonStatus::Unlocked,
        None => LessonStatus::Locked,
    }
}

/// Whole-percent path progress, truncated
pub fn path_progress_percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed * 100) / total
}

/// A question with its answer options, as served to the client and fed
/// to the grader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithOptions {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

/// A full quiz form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizForm {
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}

/// Grading outcome for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizGrade {
    pub score: i64,
    pub max_score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    /// Truncated whole percent; 0 for an empty quiz
    pub percentage: i64,
}

impl QuizGrade {
    pub fn passed(&self, pass_percentage: i64) -> bool {
        self.percentage >= pass_percentage
    }

    pub fn is_perfect(&self) -> bool {
        self.percentage == 100
    }
}

/// Grade a submission. `answers` maps question id to the chosen answer
/// option id. A question scores its points only when the chosen option
/// belongs to it and is marked correct; missing or foreign options
/// count as wrong.
pub fn grade_quiz(questions: &[QuestionWithOptions], answers: &HashMap<i64, i64>) -> QuizGrade {
    let mut score = 0;
    let mut max_score = 0;
    let mut correct_answers = 0;

    for q in questions {
        max_score += q.question.points;
        let chosen = answers.get(&q.question.id);
        let correct = chosen.is_some_and(|answer_id| {
            q.options
                .iter()
                .any(|opt| opt.id == *answer_id && opt.is_correct)
        });
        if correct {
            score += q.question.points;
            correct_answers += 1;
        }
    }

    let percentage = if max_score > 0 {
        (score * 100) / max_score
    } else {
        0
    };

    QuizGrade {
        score,
        max_score,
        total_questions: questions.len() as i64,
        correct_answers,
        percentage,
    }
}

const CERT_PREFIX: &str = "BVK";
const CERT_SUFFIX_LEN: usize = 6;
const CERT_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Certificate number: `BVK-{year}-{user_id:04}-{XXXXXX}` with a random
/// uppercase-alphanumeric suffix. Collisions are treated as negligible.
pub fn certificate_number(rng: &mut impl Rng, year: i32, user_id: i64) -> String {
    let suffix: String = (0..CERT_SUFFIX_LEN)
        .map(|_| CERT_CHARSET[rng.gen_range(0..CERT_CHARSET.len())] as char)
        .collect();
    format!("{}-{}-{:04}-{}", CERT_PREFIX, year, user_id, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn lesson(requires_previous: bool) -> Lesson {
        Lesson {
            id: 1,
            path_id: 1,
            title: "Saving Basics".into(),
            description: String::new(),
            icon: String::new(),
            duration_min: 10,
            sort_order: 1,
            content: String::new(),
            points: 10,
            coins: 5,
            requires_previous,
            is_active: true,
        }
    }

    fn record(completed: bool) -> UserLesson {
        UserLesson {
            id: 1,
            user_id: 1,
            lesson_id: 1,
            completed,
            progress_percent: if completed { 100 } else { 0 },
            started_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    fn question(id: i64, points: i64, correct_option: i64) -> QuestionWithOptions {
        let mk = |opt_id: i64| AnswerOption {
            id: opt_id,
            question_id: id,
            text: String::new(),
            is_correct: opt_id == correct_option,
            sort_order: opt_id,
        };
        QuestionWithOptions {
            question: Question {
                id,
                quiz_id: 1,
                text: String::new(),
                points,
                sort_order: id,
                explanation: String::new(),
            },
            options: vec![mk(id * 10 + 1), mk(id * 10 + 2), mk(id * 10 + 3)],
        }
    }

    #[test]
    fn test_unlock_rules() {
        // First in path is always open
        assert!(is_unlocked(&lesson(true), true, false));
        // Later lesson waits for the previous one
        assert!(!is_unlocked(&lesson(true), false, false));
        assert!(is_unlocked(&lesson(true), false, true));
        // Free-standing lessons ignore order
        assert!(is_unlocked(&lesson(false), false, false));
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(status_for(None, false), LessonStatus::Locked);
        assert_eq!(status_for(None, true), LessonStatus::Unlocked);
        assert_eq!(
            status_for(Some(&record(false)), true),
            LessonStatus::InProgress
        );
        assert_eq!(
            status_for(Some(&record(true)), true),
            LessonStatus::Completed
        );
        // A started record outranks a recomputed lock
        assert_eq!(
            status_for(Some(&record(false)), false),
            LessonStatus::InProgress
        );
    }

    #[test]
    fn test_grade_all_correct() {
        let questions = vec![question(1, 5, 11), question(2, 5, 21)];
        let answers = HashMap::from([(1, 11), (2, 21)]);
        let grade = grade_quiz(&questions, &answers);
        assert_eq!(grade.score, 10);
        assert_eq!(grade.max_score, 10);
        assert_eq!(grade.correct_answers, 2);
        assert_eq!(grade.percentage, 100);
        assert!(grade.is_perfect());
        assert!(grade.passed(70));
    }

    #[test]
    fn test_grade_truncates_percentage() {
        // 1 of 3 equal questions: 33%, not 34%
        let questions = vec![question(1, 5, 11), question(2, 5, 21), question(3, 5, 31)];
        let answers = HashMap::from([(1, 11), (2, 22), (3, 33)]);
        let grade = grade_quiz(&questions, &answers);
        assert_eq!(grade.score, 5);
        assert_eq!(grade.percentage, 33);
        assert!(!grade.is_perfect());
    }

    #[test]
    fn test_grade_pass_boundary_inclusive() {
        let questions = vec![question(1, 1, 11), question(2, 1, 21)];
        let answers = HashMap::from([(1, 11)]);
        let grade = grade_quiz(&questions, &answers);
        assert_eq!(grade.percentage, 50);
        assert!(grade.passed(50));
        assert!(!grade.passed(51));
    }

    #[test]
    fn test_grade_unanswered_and_foreign_options() {
        let questions = vec![question(1, 5, 11), question(2, 5, 21)];
        // Q1 unanswered, Q2 answered with Q1's correct option id
        let answers = HashMap::from([(2, 11)]);
        let grade = grade_quiz(&questions, &answers);
        assert_eq!(grade.score, 0);
        assert_eq!(grade.correct_answers, 0);
    }

    #[test]
    fn test_grade_empty_quiz() {
        let grade = grade_quiz(&[], &HashMap::new());
        assert_eq!(grade.percentage, 0);
        assert_eq!(grade.total_questions, 0);
        assert!(!grade.is_perfect());
        // Empty quiz still fails a positive pass bar
        assert!(!grade.passed(60));
        assert!(grade.passed(0));
    }

    #[test]
    fn test_weighted_questions() {
        let questions = vec![question(1, 3, 11), question(2, 7, 21)];
        let answers = HashMap::from([(2, 21)]);
        let grade = grade_quiz(&questions, &answers);
        assert_eq!(grade.score, 7);
        assert_eq!(grade.max_score, 10);
        assert_eq!(grade.percentage, 70);
    }

    #[test]
    fn test_path_progress_percent() {
        assert_eq!(path_progress_percent(0, 8), 0);
        assert_eq!(path_progress_percent(3, 8), 37);
        assert_eq!(path_progress_percent(8, 8), 100);
        assert_eq!(path_progress_percent(0, 0), 0);
    }

    #[test]
    fn test_certificate_number_format() {
        let mut rng = StdRng::seed_from_u64(5);
        let number = certificate_number(&mut rng, 2025, 42);
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "BVK");
        assert_eq!(parts[1], "2025");
        assert_eq!(parts[2], "0042");
        assert_eq!(parts[3].len(), 6);
        assert!(parts[3]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_certificate_number_padding() {
        let mut rng = StdRng::seed_from_u64(5);
        let number = certificate_number(&mut rng, 2026, 12345);
        // Ids wider than 4 digits are kept whole
        assert!(number.starts_with("BVK-2026-12345-"));
    }
}
