//! Grade report types with JSON persistence and regrade comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payload::ParsedTest;
use crate::results::{AttemptRecord, AttemptResult};
use crate::statistics::TestStats;

/// A complete grade report for one test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the test that was graded.
    pub test: TestSummary,
    /// Graded attempts.
    pub attempts: Vec<AttemptResult>,
    /// Aggregate statistics.
    pub stats: TestStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a test (without the answer keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub points_possible: f64,
    pub passing_score: f64,
}

impl TestSummary {
    pub fn new(test: &ParsedTest, passing_score: f64) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            question_count: test.questions.len(),
            points_possible: test.points_possible(),
            passing_score,
        }
    }
}

impl GradeReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Flat per-attempt records.
    pub fn records(&self) -> Vec<AttemptRecord> {
        self.attempts.iter().map(AttemptResult::to_record).collect()
    }

    /// Each student's best attempt.
    fn best_by_student(&self) -> HashMap<&str, &AttemptResult> {
        let mut best: HashMap<&str, &AttemptResult> = HashMap::new();
        for attempt in &self.attempts {
            let entry = best.entry(attempt.student_id.as_str()).or_insert(attempt);
            if attempt.percentage > entry.percentage {
                *entry = attempt;
            }
        }
        best
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.test.title));
        md.push_str(&format!(
            "**Attempts:** {} | **Mean:** {:.1}% | **Median:** {:.1}% | **Pass rate:** {:.1}% (passing {:.0}%)\n\n",
            self.stats.attempts,
            self.stats.mean_percentage,
            self.stats.median_percentage,
            self.stats.pass_rate * 100.0,
            self.test.passing_score,
        ));
        if self.stats.pending_review > 0 {
            md.push_str(&format!(
                "{} attempt(s) have essays awaiting review.\n\n",
                self.stats.pending_review
            ));
        }

        md.push_str("## Attempts\n\n");
        md.push_str("| Student | Score | Percentage | Result |\n");
        md.push_str("|---------|-------|------------|--------|\n");
        for a in &self.attempts {
            let result = match (a.passed, a.pending_review) {
                (_, true) => "pending",
                (true, false) => "pass",
                (false, false) => "fail",
            };
            md.push_str(&format!(
                "| {} | {:.2}/{:.2} | {:.1}% | {} |\n",
                a.student_id, a.earned, a.possible, a.percentage, result
            ));
        }
        md.push('\n');

        if !self.stats.questions.is_empty() {
            md.push_str("## Questions\n\n");
            md.push_str("| Question | Type | Facility | Full credit | Skipped | Discrimination |\n");
            md.push_str("|----------|------|----------|-------------|---------|----------------|\n");
            for q in &self.stats.questions {
                let discrimination = q
                    .discrimination
                    .map(|d| format!("{d:+.2}"))
                    .unwrap_or_else(|| "-".into());
                md.push_str(&format!(
                    "| {} | {} | {:.0}% | {:.0}% | {:.0}% | {} |\n",
                    q.question_id,
                    q.kind,
                    q.facility * 100.0,
                    q.full_credit_rate * 100.0,
                    q.unanswered_rate * 100.0,
                    discrimination
                ));
            }
        }

        md
    }

    /// Compare this report against a baseline, e.g. after an answer key fix.
    ///
    /// Students are matched by id using their best attempt. `threshold` is
    /// in percentage points.
    pub fn compare(&self, baseline: &GradeReport, threshold: f64) -> RegradeReport {
        let baseline_best = baseline.best_by_student();
        let current_best = self.best_by_student();

        let mut raised = Vec::new();
        let mut lowered = Vec::new();
        let mut status_changes = Vec::new();
        let mut unchanged = 0usize;
        let mut new_students = 0usize;

        for (student, current) in &current_best {
            let Some(before) = baseline_best.get(student) else {
                new_students += 1;
                continue;
            };

            if before.passed != current.passed {
                status_changes.push(StatusChange {
                    student_id: student.to_string(),
                    was_passing: before.passed,
                    now_passing: current.passed,
                });
            }

            let change = ScoreChange {
                student_id: student.to_string(),
                baseline_percentage: before.percentage,
                current_percentage: current.percentage,
                delta: current.percentage - before.percentage,
            };
            if change.delta > threshold {
                raised.push(change);
            } else if change.delta < -threshold {
                lowered.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_students = baseline_best
            .keys()
            .filter(|k| !current_best.contains_key(*k))
            .count();

        raised.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        lowered.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        status_changes.sort_by(|a, b| a.student_id.cmp(&b.student_id));

        RegradeReport {
            raised,
            lowered,
            status_changes,
            unchanged,
            new_students,
            removed_students,
        }
    }
}

/// Result of comparing two grade reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeReport {
    /// Students whose score went up.
    pub raised: Vec<ScoreChange>,
    /// Students whose score went down.
    pub lowered: Vec<ScoreChange>,
    /// Students who moved across the pass mark.
    pub status_changes: Vec<StatusChange>,
    /// Students with no significant change.
    pub unchanged: usize,
    /// Students in current but not baseline.
    pub new_students: usize,
    /// Students in baseline but not current.
    pub removed_students: usize,
}

/// A student's score before and after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub student_id: String,
    pub baseline_percentage: f64,
    pub current_percentage: f64,
    pub delta: f64,
}

/// A pass/fail flip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub student_id: String,
    pub was_passing: bool,
    pub now_passing: bool,
}

impl RegradeReport {
    /// Format the regrade report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} raised, {} lowered, {} unchanged, {} pass/fail change(s)\n\n",
            self.raised.len(),
            self.lowered.len(),
            self.unchanged,
            self.status_changes.len()
        ));

        for (title, changes) in [("Lowered", &self.lowered), ("Raised", &self.raised)] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Student | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1} |\n",
                    c.student_id, c.baseline_percentage, c.current_percentage, c.delta
                ));
            }
            md.push('\n');
        }

        if !self.status_changes.is_empty() {
            md.push_str("### Pass/fail changes\n\n");
            for s in &self.status_changes {
                let (from, to) = (pass_label(s.was_passing), pass_label(s.now_passing));
                md.push_str(&format!("- {}: {from} -> {to}\n", s.student_id));
            }
        }

        md
    }

    /// Returns true if any score moved or any student crossed the pass mark.
    pub fn has_changes(&self) -> bool {
        !self.raised.is_empty() || !self.lowered.is_empty() || !self.status_changes.is_empty()
    }
}

fn pass_label(passed: bool) -> &'static str {
    if passed {
        "pass"
    } else {
        "fail"
    }
}
