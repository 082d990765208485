//! Attempt aggregation.
//!
//! Sums per-question scores into a percentage and pass/fail flag.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Submission, SubmittedAnswer};
use crate::payload::ParsedTest;
use crate::scoring::{round2, score_question, QuestionScore, ScoreStatus, ScoringOptions};

/// A graded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub id: Uuid,
    pub test_id: String,
    pub student_id: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: DateTime<Utc>,
    /// Per-question scores in test order.
    pub questions: Vec<QuestionScore>,
    pub earned: f64,
    pub possible: f64,
    /// `earned / possible` as a percentage, rounded to 2 decimals.
    pub percentage: f64,
    pub passed: bool,
    /// Some essay still needs marking, so `passed` is provisional.
    pub pending_review: bool,
}

/// The flat record stored per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub test_id: String,
    pub student_id: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: DateTime<Utc>,
    pub earned: f64,
    pub possible: f64,
    pub percentage: f64,
    pub passed: bool,
    pub pending_review: bool,
    pub correct: usize,
    pub partial: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

impl AttemptResult {
    /// Count questions with the given status.
    pub fn count(&self, status: ScoreStatus) -> usize {
        self.questions.iter().filter(|q| q.status == status).count()
    }

    /// Score for one question.
    pub fn question(&self, id: &str) -> Option<&QuestionScore> {
        self.questions.iter().find(|q| q.question_id == id)
    }

    /// Flatten into a storable record.
    pub fn to_record(&self) -> AttemptRecord {
        AttemptRecord {
            id: self.id,
            test_id: self.test_id.clone(),
            student_id: self.student_id.clone(),
            submitted_at: self.submitted_at,
            graded_at: self.graded_at,
            earned: self.earned,
            possible: self.possible,
            percentage: self.percentage,
            passed: self.passed,
            pending_review: self.pending_review,
            correct: self.count(ScoreStatus::Correct),
            partial: self.count(ScoreStatus::Partial),
            incorrect: self.count(ScoreStatus::Incorrect),
            unanswered: self.count(ScoreStatus::Unanswered),
        }
    }
}

/// Percentage of `earned` out of `possible`, 0 when nothing is possible.
pub fn percentage(earned: f64, possible: f64) -> f64 {
    if possible > 0.0 {
        round2(earned / possible * 100.0)
    } else {
        0.0
    }
}

/// Score every question of `test` against `submission`.
///
/// Answers to unknown questions are ignored. When a question is answered
/// more than once, the first answer counts.
pub fn grade_attempt(
    test: &ParsedTest,
    submission: &Submission,
    options: &ScoringOptions,
    passing_score: f64,
) -> AttemptResult {
    let mut answers: HashMap<&str, &SubmittedAnswer> = HashMap::new();
    for answer in &submission.answers {
        if test.question(&answer.question_id).is_none() {
            tracing::warn!(
                student = %submission.student_id,
                question = %answer.question_id,
                "ignoring answer to unknown question"
            );
            continue;
        }
        answers.entry(answer.question_id.as_str()).or_insert(answer);
    }

    let questions: Vec<QuestionScore> = test
        .questions
        .iter()
        .map(|q| score_question(q, answers.get(q.id.as_str()).copied(), options))
        .collect();

    let earned = round2(questions.iter().map(|q| q.earned).sum());
    let possible = round2(test.points_possible());
    let percentage = percentage(earned, possible);
    let pending_review = questions
        .iter()
        .any(|q| q.status == ScoreStatus::PendingReview);

    AttemptResult {
        id: submission.id.unwrap_or_else(Uuid::new_v4),
        test_id: test.id.clone(),
        student_id: submission.student_id.clone(),
        submitted_at: submission.submitted_at,
        graded_at: Utc::now(),
        questions,
        earned,
        possible,
        percentage,
        passed: percentage >= passing_score,
        pending_review,
    }
}
