//! Core data model types for formulate.
//!
//! Tests and questions are stored the way teachers author them: each question
//! carries its options and answer key as delimited text fields. The typed
//! answer keys live in [`crate::payload`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of question a test can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Hotspot,
    DragDrop,
    Essay,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::TrueFalse => write!(f, "true_false"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
            QuestionType::Hotspot => write!(f, "hotspot"),
            QuestionType::DragDrop => write!(f, "drag_drop"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiple_choice" | "multiple-choice" | "mcq" | "mc" => Ok(QuestionType::MultipleChoice),
            "true_false" | "true-false" | "tf" | "boolean" => Ok(QuestionType::TrueFalse),
            "short_answer" | "short-answer" | "short" | "text" => Ok(QuestionType::ShortAnswer),
            "hotspot" => Ok(QuestionType::Hotspot),
            "drag_drop" | "drag-drop" | "dragdrop" | "drag-and-drop" | "matching" => {
                Ok(QuestionType::DragDrop)
            }
            "essay" | "long_answer" | "rubric" => Ok(QuestionType::Essay),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// How partially correct answers to multi-part questions earn points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialCreditPolicy {
    /// Full points only when every part is right and nothing wrong is chosen.
    AllOrNothing,
    /// Points in proportion to the correct parts; wrong picks cost nothing.
    Proportional,
    /// Each wrong pick cancels one correct pick, floored at zero.
    #[default]
    ProportionalWithPenalty,
}

impl fmt::Display for PartialCreditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialCreditPolicy::AllOrNothing => write!(f, "all_or_nothing"),
            PartialCreditPolicy::Proportional => write!(f, "proportional"),
            PartialCreditPolicy::ProportionalWithPenalty => write!(f, "proportional_with_penalty"),
        }
    }
}

impl FromStr for PartialCreditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all_or_nothing" | "none" => Ok(PartialCreditPolicy::AllOrNothing),
            "proportional" => Ok(PartialCreditPolicy::Proportional),
            "proportional_with_penalty" | "penalty" => {
                Ok(PartialCreditPolicy::ProportionalWithPenalty)
            }
            other => Err(format!("unknown partial credit policy: {other}")),
        }
    }
}

/// A single question as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within its test.
    pub id: String,
    /// Question type; decides how `choices` and `correct_answer` are read.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// The text shown to the student.
    #[serde(default)]
    pub prompt: String,
    /// Options, regions, items/zones, or rubric, depending on `kind`.
    #[serde(default)]
    pub choices: String,
    /// The answer key in the type's delimited format.
    #[serde(default)]
    pub correct_answer: String,
    /// Point value. Defaults to 1, or the rubric total for essays.
    #[serde(default)]
    pub points: Option<f64>,
    /// Tags for filtering and analytics.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Shown to students after grading.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A complete test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minimum percentage needed to pass. Falls back to the configured default.
    #[serde(default)]
    pub passing_score: Option<f64>,
    /// Partial credit policy. Falls back to the configured default.
    #[serde(default)]
    pub partial_credit: Option<PartialCreditPolicy>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A student's answer to one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    /// Raw answer text in the question type's answer format.
    #[serde(default)]
    pub answer: String,
    /// Marks a teacher awarded per rubric criterion (essays only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rubric_marks: BTreeMap<String, f64>,
}

impl SubmittedAnswer {
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
            rubric_marks: BTreeMap::new(),
        }
    }

    /// Whether the student left the answer empty.
    pub fn is_blank(&self) -> bool {
        self.answer.trim().is_empty()
    }
}

/// One student's attempt at a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Attempt id. Generated at grading time when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub test_id: String,
    pub student_id: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}
