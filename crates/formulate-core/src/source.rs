//! Submission sources.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::Submission;
use crate::parser::parse_submission_str;
use crate::traits::SubmissionSource;

/// Reads submissions from a JSON file or every `*.json` file under a directory.
pub struct DirectorySource {
    path: PathBuf,
    name: String,
}

impl DirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

/// Collect `*.json` files under `dir`, sorted for stable ordering.
async fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .with_context(|| format!("failed to read directory: {}", current.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl SubmissionSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<Submission>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("submissions not found: {}", self.path.display()))?;

        if !metadata.is_dir() {
            let content = tokio::fs::read_to_string(&self.path)
                .await
                .with_context(|| format!("failed to read submission: {}", self.path.display()))?;
            return parse_submission_str(&content, &self.path);
        }

        let mut submissions = Vec::new();
        for path in collect_json_files(&self.path).await? {
            let parsed = match tokio::fs::read_to_string(&path).await {
                Ok(content) => parse_submission_str(&content, &path),
                Err(e) => Err(e.into()),
            };
            match parsed {
                Ok(batch) => submissions.extend(batch),
                Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
            }
        }

        tracing::debug!(
            source = %self.name,
            count = submissions.len(),
            "loaded submissions"
        );
        Ok(submissions)
    }
}

/// Serves a fixed set of submissions.
pub struct MemorySource {
    submissions: Vec<Submission>,
}

impl MemorySource {
    pub fn new(submissions: Vec<Submission>) -> Self {
        Self { submissions }
    }
}

#[async_trait]
impl SubmissionSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<Vec<Submission>> {
        Ok(self.submissions.clone())
    }
}
