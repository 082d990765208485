//! The `formulate grade` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use formulate_core::config::load_config_from;
use formulate_core::engine::{GradingEngine, ProgressReporter};
use formulate_core::parser;
use formulate_core::report::GradeReport;
use formulate_core::results::AttemptResult;
use formulate_core::source::DirectorySource;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_attempt_graded(&self, result: &AttemptResult) {
        let verdict = match (result.passed, result.pending_review) {
            (_, true) => "PENDING",
            (true, false) => "PASS",
            (false, false) => "FAIL",
        };
        eprintln!(
            "  Graded: {} {:.2}/{:.2} ({:.1}%) {verdict}",
            result.student_id, result.earned, result.possible, result.percentage,
        );
    }

    fn on_attempt_skipped(&self, student_id: &str, reason: &str) {
        eprintln!("  Skipped: {student_id}: {reason}");
    }

    fn on_batch_complete(&self, total: usize, graded: usize, skipped: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded}/{total} graded, {skipped} skipped ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub struct GradeArgs {
    pub test: PathBuf,
    pub submissions: PathBuf,
    pub output: Option<PathBuf>,
    pub format: String,
    pub parallelism: Option<usize>,
    pub passing_score: Option<f64>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(parallelism) = args.parallelism {
        config.parallelism = parallelism;
    }
    if let Some(score) = args.passing_score {
        config.passing_score = score;
    }
    config.validate()?;

    let formats: Vec<&str> = if args.format == "all" {
        vec!["json", "markdown"]
    } else {
        args.format.split(',').map(str::trim).collect()
    };
    for fmt in &formats {
        anyhow::ensure!(
            matches!(*fmt, "json" | "markdown" | "md"),
            "unknown format '{fmt}', expected json, markdown, or all"
        );
    }

    let test = parser::parse_test_set(&args.test)?;
    let source = DirectorySource::new(&args.submissions);
    let engine = GradingEngine::new(config.clone());

    eprintln!(
        "formulate v{}: grading '{}' ({} questions) from {}",
        env!("CARGO_PKG_VERSION"),
        test.title,
        test.questions.len(),
        args.submissions.display()
    );
    eprintln!();

    let report = engine.run(&test, &source, &ConsoleReporter).await?;

    print_summary(&report);

    let output = args.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            _ => {
                let path = output.join(format!("report-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_summary(report: &GradeReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Student",
        "Score",
        "Percentage",
        "Correct",
        "Partial",
        "Unanswered",
        "Result",
    ]);

    for record in report.records() {
        let result = match (record.passed, record.pending_review) {
            (_, true) => "pending",
            (true, false) => "pass",
            (false, false) => "fail",
        };
        table.add_row(vec![
            Cell::new(&record.student_id),
            Cell::new(format!("{:.2}/{:.2}", record.earned, record.possible)),
            Cell::new(format!("{:.1}%", record.percentage)),
            Cell::new(record.correct),
            Cell::new(record.partial),
            Cell::new(record.unanswered),
            Cell::new(result),
        ]);
    }

    println!("{table}");
    println!(
        "Mean {:.1}% | Median {:.1}% | Pass rate {:.1}% (passing {:.0}%)",
        report.stats.mean_percentage,
        report.stats.median_percentage,
        report.stats.pass_rate * 100.0,
        report.test.passing_score,
    );
}
