//! Core trait definitions.
//!
//! Submissions reach the grader through [`SubmissionSource`], so the engine
//! does not care whether attempts come from a directory of exports, a
//! database dump, or memory.

use async_trait::async_trait;

use crate::model::Submission;

/// Trait for anything that can hand the grading engine a batch of attempts.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Human-readable source name (e.g. a directory path).
    fn name(&self) -> &str;

    /// Load every available submission.
    async fn load(&self) -> anyhow::Result<Vec<Submission>>;
}
