//! Client-side scoring of assessment answers.
//!
//! Scoring happens entirely on the client before the result is submitted;
//! the backend stores what it is sent. The submitted score is logged by the
//! session driver so server-side discrepancies stay auditable.
//!
//! Rules per question type:
//! - Multiple-choice / true-false: exact match earns `points`, a wrong
//!   answer subtracts `negative_points` when set.
//! - Short answer: trimmed, case-insensitive equality earns `points`; a
//!   wrong answer earns 0 even when `negative_points` is set.
//! - Essay: any non-empty answer earns full `points` (manual grading is
//!   outside this flow).
//! - Unanswered questions earn 0 with no penalty.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::curriculum::{Assessment, Question, QuestionType};

/// Outcome of scoring one full answer set against an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    /// Raw points earned, clamped at 0.
    pub score: f64,

    /// Sum of all question points.
    pub total_points: f64,

    /// `round(score / total_points * 100)`; 0 when there are no points to
    /// earn.
    pub percentage: f64,

    /// Whether `percentage` met the assessment's passing score.
    pub passed: bool,
}

/// Points earned for a single question, given the stored answer (if any).
#[must_use]
pub fn score_question(question: &Question, answer: Option<&str>) -> f64 {
    let Some(answer) = answer else {
        return 0.0;
    };

    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            if answer == question.correct_answer {
                question.points
            } else {
                -question.negative_points.unwrap_or(0.0)
            }
        }
        QuestionType::ShortAnswer => {
            if answer.trim().eq_ignore_ascii_case(question.correct_answer.trim()) {
                question.points
            } else {
                // Negative marking applies to choice questions only.
                0.0
            }
        }
        QuestionType::Essay => {
            if answer.trim().is_empty() {
                0.0
            } else {
                question.points
            }
        }
    }
}

/// Scores a complete answer set against an assessment.
///
/// Deterministic and idempotent: scoring the same answers twice yields the
/// same summary. The raw sum clamps at 0 so negative marking can never
/// produce a negative final score.
#[must_use]
pub fn score_assessment(assessment: &Assessment, answers: &HashMap<String, String>) -> ScoreSummary {
    let total_points = assessment.total_points();

    let raw: f64 = assessment
        .questions
        .iter()
        .map(|q| score_question(q, answers.get(&q.id).map(String::as_str)))
        .sum();
    let score = raw.max(0.0);

    let percentage = if total_points > 0.0 {
        (score / total_points * 100.0).round()
    } else {
        0.0
    };

    ScoreSummary {
        score,
        total_points,
        percentage,
        passed: percentage >= assessment.passing_score,
    }
}
