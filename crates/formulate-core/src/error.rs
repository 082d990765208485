//! Payload error types.
//!
//! These errors describe why a question's `choices` / `correct_answer`
//! fields could not be turned into an answer key. They are raised when a
//! test is loaded, never while scoring a student's answer.

use thiserror::Error;

/// Errors that can occur while parsing a question payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    /// A multiple-choice question has no options.
    #[error("question '{question}' has no choices")]
    NoChoices { question: String },

    /// The answer key is empty.
    #[error("question '{question}' has no correct answer")]
    NoCorrectAnswer { question: String },

    /// A correct-answer reference does not match any choice.
    #[error("question '{question}': correct answer '{reference}' matches no choice")]
    UnknownChoice { question: String, reference: String },

    /// A hotspot region definition could not be parsed.
    #[error("question '{question}': invalid region '{region}': {reason}")]
    InvalidRegion {
        question: String,
        region: String,
        reason: String,
    },

    /// A hotspot answer key names a region that was never defined.
    #[error("question '{question}': unknown region '{region}'")]
    UnknownRegion { question: String, region: String },

    /// A drag-and-drop pair is not of the form `item=zone`.
    #[error("question '{question}': malformed pair '{pair}', expected item=zone")]
    MalformedPair { question: String, pair: String },

    /// A drag-and-drop key references an item missing from the choices.
    #[error("question '{question}': unknown item '{item}'")]
    UnknownItem { question: String, item: String },

    /// A drag-and-drop key references a zone missing from the choices.
    #[error("question '{question}': unknown zone '{zone}'")]
    UnknownZone { question: String, zone: String },

    /// A drag-and-drop item appears more than once in the key.
    #[error("question '{question}': item '{item}' is keyed more than once")]
    DuplicateItem { question: String, item: String },

    /// An essay rubric criterion could not be parsed.
    #[error("question '{question}': invalid rubric criterion '{criterion}': {reason}")]
    InvalidRubric {
        question: String,
        criterion: String,
        reason: String,
    },

    /// The question's point value is negative or not a number.
    #[error("question '{question}': invalid point value {points}")]
    InvalidPoints { question: String, points: f64 },

    /// Two questions in the same test share an id.
    #[error("duplicate question id '{0}'")]
    DuplicateQuestion(String),
}

impl PayloadError {
    /// Returns the id of the question the error refers to.
    pub fn question_id(&self) -> &str {
        match self {
            PayloadError::NoChoices { question }
            | PayloadError::NoCorrectAnswer { question }
            | PayloadError::UnknownChoice { question, .. }
            | PayloadError::InvalidRegion { question, .. }
            | PayloadError::UnknownRegion { question, .. }
            | PayloadError::MalformedPair { question, .. }
            | PayloadError::UnknownItem { question, .. }
            | PayloadError::UnknownZone { question, .. }
            | PayloadError::DuplicateItem { question, .. }
            | PayloadError::InvalidRubric { question, .. }
            | PayloadError::InvalidPoints { question, .. } => question,
            PayloadError::DuplicateQuestion(question) => question,
        }
    }
}
