//! Central grading orchestrator.
//!
//! Loads a batch of submissions, grades them concurrently against one test,
//! and rolls the results up into a [`GradeReport`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::FormulateConfig;
use crate::model::TestDefinition;
use crate::payload::parse_test;
use crate::report::{GradeReport, TestSummary};
use crate::results::{grade_attempt, AttemptResult};
use crate::scoring::ScoringOptions;
use crate::statistics::compute_test_stats;
use crate::traits::SubmissionSource;

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_attempt_graded(&self, result: &AttemptResult);
    fn on_attempt_skipped(&self, student_id: &str, reason: &str);
    fn on_batch_complete(&self, total: usize, graded: usize, skipped: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_attempt_graded(&self, _: &AttemptResult) {}
    fn on_attempt_skipped(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The central grading engine.
pub struct GradingEngine {
    config: FormulateConfig,
}

impl GradingEngine {
    pub fn new(config: FormulateConfig) -> Self {
        Self { config }
    }

    /// Grade every submission from `source` that targets `test`.
    ///
    /// Submissions for other tests are skipped. Attempts in the report are
    /// ordered by student, then submission time.
    pub async fn run(
        &self,
        test: &TestDefinition,
        source: &dyn SubmissionSource,
        progress: &dyn ProgressReporter,
    ) -> Result<GradeReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        let parsed = Arc::new(
            parse_test(test).with_context(|| format!("test '{}' has invalid questions", test.id))?,
        );
        let options = ScoringOptions::resolve(&parsed, &self.config);
        let passing_score = parsed.passing_score.unwrap_or(self.config.passing_score);

        let submissions = source
            .load()
            .await
            .with_context(|| format!("failed to load submissions from {}", source.name()))?;
        tracing::info!(
            test = %parsed.id,
            source = source.name(),
            submissions = submissions.len(),
            "grading"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();
        let mut skipped = 0usize;
        let total = submissions.len();

        for submission in submissions {
            if submission.test_id != parsed.id {
                let reason = format!("submission is for test '{}'", submission.test_id);
                tracing::warn!(student = %submission.student_id, "{reason}, skipping");
                progress.on_attempt_skipped(&submission.student_id, &reason);
                skipped += 1;
                continue;
            }

            let test = Arc::clone(&parsed);
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let student_id = submission.student_id.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    let result = tokio::task::spawn_blocking(move || {
                        grade_attempt(&test, &submission, &options, passing_score)
                    })
                    .await?;
                    Ok::<_, anyhow::Error>(result)
                };
                (student_id, inner.await)
            });
        }

        let mut attempts = Vec::new();
        while let Some((student_id, result)) = futures.next().await {
            match result {
                Ok(attempt) => {
                    tracing::debug!(
                        student = %attempt.student_id,
                        percentage = attempt.percentage,
                        "attempt graded"
                    );
                    progress.on_attempt_graded(&attempt);
                    attempts.push(attempt);
                }
                Err(e) => {
                    tracing::error!("grading failed for {student_id}: {e:#}");
                    progress.on_attempt_skipped(&student_id, &e.to_string());
                    skipped += 1;
                }
            }
        }

        attempts.sort_by(|a, b| {
            a.student_id
                .cmp(&b.student_id)
                .then(a.submitted_at.cmp(&b.submitted_at))
        });

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, attempts.len(), skipped, elapsed);

        let stats = compute_test_stats(&parsed, &attempts);
        tracing::info!(
            test = %parsed.id,
            graded = attempts.len(),
            skipped,
            mean = stats.mean_percentage,
            "grading complete"
        );

        Ok(GradeReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            test: TestSummary::new(&parsed, passing_score),
            attempts,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
