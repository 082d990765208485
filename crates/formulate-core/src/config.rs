//! Grading configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::PartialCreditPolicy;

/// Top-level formulate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulateConfig {
    /// Default passing percentage for tests that don't set one.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    /// Default partial credit policy for tests that don't set one.
    #[serde(default)]
    pub partial_credit: PartialCreditPolicy,
    /// Match short-answer keywords case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Max attempts graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for grade reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_passing_score() -> f64 {
    60.0
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./formulate-results")
}

impl Default for FormulateConfig {
    fn default() -> Self {
        Self {
            passing_score: default_passing_score(),
            partial_credit: PartialCreditPolicy::default(),
            case_sensitive: false,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        // Substituted text is not rescanned.
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `formulate.toml` in the current directory
/// 2. `~/.config/formulate/config.toml`
///
/// Environment variable overrides: `FORMULATE_PASSING_SCORE`, `FORMULATE_OUTPUT_DIR`.
pub fn load_config() -> Result<FormulateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FormulateConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("formulate.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FormulateConfig::default(),
    };

    // Apply env var overrides
    if let Ok(score) = std::env::var("FORMULATE_PASSING_SCORE") {
        config.passing_score = score
            .trim()
            .parse()
            .with_context(|| format!("FORMULATE_PASSING_SCORE is not a number: {score}"))?;
    }
    if let Ok(dir) = std::env::var("FORMULATE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    config.validate()?;

    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config_str(content: &str) -> Result<FormulateConfig> {
    Ok(toml::from_str::<FormulateConfig>(content)?)
}

impl FormulateConfig {
    /// Reject settings the grader cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.passing_score),
            "passing_score must be between 0 and 100, got {}",
            self.passing_score
        );
        anyhow::ensure!(self.parallelism >= 1, "parallelism must be at least 1");
        Ok(())
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("formulate"))
}
