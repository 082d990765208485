//! Test-set and submission file parsing.
//!
//! Loads tests from TOML files and directories, validates them, and reads
//! JSON submission exports.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{PartialCreditPolicy, Question, QuestionType, Submission, TestDefinition};
use crate::payload::{parse_question, split_list, AnswerKey};

/// Intermediate TOML structure for parsing test-set files.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    passing_score: Option<f64>,
    #[serde(default)]
    partial_credit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    choices: String,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parse a single TOML file into a `TestDefinition`.
pub fn parse_test_set(path: &Path) -> Result<TestDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test set file: {}", path.display()))?;

    parse_test_set_str(&content, path)
}

/// Parse a TOML string into a `TestDefinition` (useful for testing).
pub fn parse_test_set_str(content: &str, source_path: &Path) -> Result<TestDefinition> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let partial_credit: Option<PartialCreditPolicy> = parsed
        .test
        .partial_credit
        .map(|p| {
            p.parse::<PartialCreditPolicy>()
                .map_err(|e| anyhow::anyhow!("{}", e))
        })
        .transpose()?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| -> Result<Question> {
            let kind = q
                .kind
                .parse::<QuestionType>()
                .map_err(|e| anyhow::anyhow!("question '{}': {}", q.id, e))?;
            Ok(Question {
                id: q.id,
                kind,
                prompt: q.prompt,
                choices: q.choices,
                correct_answer: q.correct_answer,
                points: q.points,
                tags: q.tags,
                explanation: q.explanation,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TestDefinition {
        id: parsed.test.id,
        title: parsed.test.title,
        description: parsed.test.description,
        passing_score: parsed.test.passing_score,
        partial_credit,
        questions,
    })
}

/// Recursively load all `.toml` test-set files from a directory.
pub fn load_test_directory(dir: &Path) -> Result<Vec<TestDefinition>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test_set(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(tests)
}

/// Load a test-set file, or every test set under a directory.
pub fn load_test_sets(path: &Path) -> Result<Vec<TestDefinition>> {
    if path.is_dir() {
        load_test_directory(path)
    } else {
        Ok(vec![parse_test_set(path)?])
    }
}

/// A submission file holds one submission or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum SubmissionFile {
    Many(Vec<Submission>),
    One(Box<Submission>),
}

/// Parse JSON submission content (one object or an array).
pub fn parse_submission_str(content: &str, source_path: &Path) -> Result<Vec<Submission>> {
    let parsed: SubmissionFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse submission JSON: {}", source_path.display()))?;
    Ok(match parsed {
        SubmissionFile::Many(subs) => subs,
        SubmissionFile::One(sub) => vec![*sub],
    })
}

/// Read a JSON submission file.
pub fn parse_submission(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission file: {}", path.display()))?;
    parse_submission_str(&content, path)
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The test cannot be graded until this is fixed.
    Error,
    Warning,
}

/// A finding from test-set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub severity: Severity,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn warning(question_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.map(String::from),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Validate a test for payload errors and common authoring mistakes.
pub fn validate_test_set(test: &TestDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(score) = test.passing_score {
        if !(0.0..=100.0).contains(&score) {
            warnings.push(ValidationWarning {
                question_id: None,
                severity: Severity::Error,
                message: format!("passing_score must be between 0 and 100, got {score}"),
            });
        }
    }

    if test.questions.is_empty() {
        warnings.push(ValidationWarning::warning(None, "test has no questions"));
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for question in &test.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                severity: Severity::Error,
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &test.questions {
        let id = Some(question.id.as_str());

        if question.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::warning(id, "prompt is empty"));
        }

        let parsed = match parse_question(question) {
            Ok(parsed) => parsed,
            Err(e) => {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id.clone()),
                    severity: Severity::Error,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if parsed.points == 0.0 {
            warnings.push(ValidationWarning::warning(id, "question is worth 0 points"));
        }

        match &parsed.key {
            AnswerKey::Choice(key) if key.options.len() < 2 => {
                warnings.push(ValidationWarning::warning(id, "only one choice offered"));
            }
            AnswerKey::Choice(key) if key.correct.len() == key.options.len() => {
                warnings.push(ValidationWarning::warning(id, "every choice is marked correct"));
            }
            AnswerKey::Rubric(_) if !question.correct_answer.trim().is_empty() => {
                warnings.push(ValidationWarning::warning(
                    id,
                    "essay correct_answer is ignored; grade with rubric marks",
                ));
            }
            AnswerKey::DragDrop(_) if split_list(&question.choices).is_empty() => {
                warnings.push(ValidationWarning::warning(
                    id,
                    "choices are empty; items and zones come from the answer key",
                ));
            }
            _ => {}
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[test]
id = "cell-biology"
title = "Cell Biology Quiz"
description = "Organelles and energy"
passing_score = 70
partial_credit = "proportional"

[[questions]]
id = "q1"
type = "multiple_choice"
prompt = "Which organelle produces ATP?"
choices = "Nucleus|Mitochondria|Ribosome"
correct_answer = "Mitochondria"
points = 2

[[questions]]
id = "q2"
type = "short_answer"
prompt = "Name the pigment that captures light."
correct_answer = "chlorophyll"
"#;

    #[test]
    fn parse_valid_toml() {
        let test = parse_test_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(test.id, "cell-biology");
        assert_eq!(test.passing_score, Some(70.0));
        assert_eq!(test.partial_credit, Some(PartialCreditPolicy::Proportional));
        assert_eq!(test.questions.len(), 2);
        assert_eq!(test.questions[0].kind, QuestionType::MultipleChoice);
        assert_eq!(test.questions[0].points, Some(2.0));
        assert!(test.questions[1].points.is_none());
        assert!(validate_test_set(&test).is_empty());
    }

    #[test]
    fn parse_unknown_question_type() {
        let toml = r#"
[test]
id = "t"
title = "T"

[[questions]]
id = "q1"
type = "ranking"
"#;
        let err = parse_test_set_str(toml, &PathBuf::from("t.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question type"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_test_set_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_payload_errors() {
        let toml = r#"
[test]
id = "t"
title = "T"
passing_score = 140

[[questions]]
id = "q1"
type = "mcq"
prompt = "Capital of France?"
choices = "Paris|London"
correct_answer = "Lyon"

[[questions]]
id = "q1"
type = "essay"
prompt = "Discuss."
choices = "Thesis:5"
correct_answer = "anything"
"#;
        let test = parse_test_set_str(toml, &PathBuf::from("t.toml")).unwrap();
        let warnings = validate_test_set(&test);
        assert!(warnings
            .iter()
            .any(|w| w.is_error() && w.message.contains("matches no choice")));
        assert!(warnings
            .iter()
            .any(|w| w.is_error() && w.message.contains("duplicate")));
        assert!(warnings
            .iter()
            .any(|w| w.is_error() && w.message.contains("passing_score")));
        assert!(warnings
            .iter()
            .any(|w| !w.is_error() && w.message.contains("rubric marks")));
    }

    #[test]
    fn validate_authoring_warnings() {
        let toml = r#"
[test]
id = "t"
title = "T"

[[questions]]
id = "q1"
type = "multiple_choice"
choices = "Only"
correct_answer = "Only"
points = 0
"#;
        let test = parse_test_set_str(toml, &PathBuf::from("t.toml")).unwrap();
        let warnings = validate_test_set(&test);
        assert!(warnings.iter().all(|w| !w.is_error()));
        assert!(warnings.iter().any(|w| w.message.contains("prompt is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("0 points")));
        assert!(warnings.iter().any(|w| w.message.contains("only one choice")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cells.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[test").unwrap();

        let tests = load_test_directory(dir.path()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, "cell-biology");

        let single = load_test_sets(&dir.path().join("cells.toml")).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn submission_object_or_array() {
        let one = r#"{ "test_id": "t", "student_id": "a", "answers": [] }"#;
        let many = r#"[{ "test_id": "t", "student_id": "a" }, { "test_id": "t", "student_id": "b" }]"#;
        let path = PathBuf::from("s.json");
        assert_eq!(parse_submission_str(one, &path).unwrap().len(), 1);
        assert_eq!(parse_submission_str(many, &path).unwrap().len(), 2);
        assert!(parse_submission_str("{}", &path).is_err());
    }
}
