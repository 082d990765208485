//! Attempt analytics.
//!
//! Summarises a set of graded attempts: score spread, pass rate, a score
//! histogram, and classic item analysis per question (facility and
//! upper/lower discrimination).

use serde::{Deserialize, Serialize};

use crate::model::QuestionType;
use crate::payload::ParsedTest;
use crate::results::AttemptResult;
use crate::scoring::{round2, ScoreStatus};

/// Number of buckets in [`TestStats::distribution`].
pub const DISTRIBUTION_BUCKETS: usize = 10;

/// Statistics for one test across all graded attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestStats {
    pub attempts: usize,
    pub mean_percentage: f64,
    pub median_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
    /// Population standard deviation of percentages.
    pub std_dev: f64,
    /// Fraction of attempts that passed.
    pub pass_rate: f64,
    pub pending_review: usize,
    /// Attempt counts per 10-point band; the last band includes 100.
    pub distribution: Vec<usize>,
    /// Per-question statistics in test order.
    pub questions: Vec<QuestionStats>,
}

/// Item analysis for a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub kind: QuestionType,
    pub points: f64,
    /// Attempts that answered the question.
    pub answered: usize,
    /// Mean fraction of points earned across all attempts.
    pub facility: f64,
    /// Fraction of attempts with full credit.
    pub full_credit_rate: f64,
    /// Fraction of attempts that skipped the question.
    pub unanswered_rate: f64,
    /// Facility in the top third minus facility in the bottom third.
    /// `None` with fewer than two attempts.
    pub discrimination: Option<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Histogram bucket for a percentage.
pub fn bucket_for(percentage: f64) -> usize {
    ((percentage / 10.0).floor().max(0.0) as usize).min(DISTRIBUTION_BUCKETS - 1)
}

/// Compute statistics for `attempts` of `test`.
pub fn compute_test_stats(test: &ParsedTest, attempts: &[AttemptResult]) -> TestStats {
    let mut percentages: Vec<f64> = attempts.iter().map(|a| a.percentage).collect();
    percentages.sort_by(|a, b| a.total_cmp(b));

    let n = attempts.len();
    let mean_pct = mean(&percentages);
    let variance = mean(
        &percentages
            .iter()
            .map(|p| (p - mean_pct).powi(2))
            .collect::<Vec<_>>(),
    );

    let mut distribution = vec![0; DISTRIBUTION_BUCKETS];
    for p in &percentages {
        distribution[bucket_for(*p)] += 1;
    }

    // Attempts ordered weakest to strongest for the discrimination index.
    let mut ranked: Vec<&AttemptResult> = attempts.iter().collect();
    ranked.sort_by(|a, b| a.percentage.total_cmp(&b.percentage));
    let group = (n / 3).max(1);

    let questions = test
        .questions
        .iter()
        .map(|q| {
            let facility_of = |slice: &[&AttemptResult]| -> f64 {
                mean(
                    &slice
                        .iter()
                        .map(|a| a.question(&q.id).map(|s| s.fraction()).unwrap_or(0.0))
                        .collect::<Vec<_>>(),
                )
            };
            let status_rate = |status: ScoreStatus| -> f64 {
                if n == 0 {
                    return 0.0;
                }
                attempts
                    .iter()
                    .filter(|a| a.question(&q.id).is_some_and(|s| s.status == status))
                    .count() as f64
                    / n as f64
            };

            let unanswered_rate = status_rate(ScoreStatus::Unanswered);
            let discrimination = (n >= 2).then(|| {
                round2(facility_of(&ranked[n - group..]) - facility_of(&ranked[..group]))
            });

            QuestionStats {
                question_id: q.id.clone(),
                kind: q.kind,
                points: q.points,
                answered: attempts
                    .iter()
                    .filter(|a| {
                        a.question(&q.id)
                            .is_some_and(|s| s.status != ScoreStatus::Unanswered)
                    })
                    .count(),
                facility: round2(facility_of(&ranked[..])),
                full_credit_rate: round2(status_rate(ScoreStatus::Correct)),
                unanswered_rate: round2(unanswered_rate),
                discrimination,
            }
        })
        .collect();

    TestStats {
        attempts: n,
        mean_percentage: round2(mean_pct),
        median_percentage: round2(median(&percentages)),
        min_percentage: percentages.first().copied().unwrap_or(0.0),
        max_percentage: percentages.last().copied().unwrap_or(0.0),
        std_dev: round2(variance.sqrt()),
        pass_rate: if n == 0 {
            0.0
        } else {
            round2(attempts.iter().filter(|a| a.passed).count() as f64 / n as f64)
        },
        pending_review: attempts.iter().filter(|a| a.pending_review).count(),
        distribution,
        questions,
    }
}

impl TestStats {
    /// Questions ordered hardest first (lowest facility).
    pub fn hardest_questions(&self) -> Vec<&QuestionStats> {
        let mut sorted: Vec<&QuestionStats> = self.questions.iter().collect();
        sorted.sort_by(|a, b| a.facility.total_cmp(&b.facility));
        sorted
    }
}
