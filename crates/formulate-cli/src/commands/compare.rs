//! The `formulate compare` command.

use std::path::PathBuf;

use anyhow::Result;

use formulate_core::report::GradeReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_change: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = GradeReport::load_json(&baseline_path)?;
    let current = GradeReport::load_json(&current_path)?;

    if baseline.test.id != current.test.id {
        eprintln!(
            "Warning: comparing different tests ('{}' vs '{}')",
            baseline.test.id, current.test.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} raised, {} lowered, {} unchanged",
                report.raised.len(),
                report.lowered.len(),
                report.unchanged
            );

            if !report.lowered.is_empty() {
                println!("\nLowered:");
                for c in &report.lowered {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1})",
                        c.student_id, c.baseline_percentage, c.current_percentage, c.delta
                    );
                }
            }

            if !report.raised.is_empty() {
                println!("\nRaised:");
                for c in &report.raised {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1})",
                        c.student_id, c.baseline_percentage, c.current_percentage, c.delta
                    );
                }
            }

            if !report.status_changes.is_empty() {
                println!("\nPass/fail changes:");
                for s in &report.status_changes {
                    let label = |p: bool| if p { "pass" } else { "fail" };
                    println!(
                        "  {} {} -> {}",
                        s.student_id,
                        label(s.was_passing),
                        label(s.now_passing)
                    );
                }
            }

            if report.new_students > 0 {
                println!("\n{} new student(s)", report.new_students);
            }
            if report.removed_students > 0 {
                println!("{} removed student(s)", report.removed_students);
            }
        }
    }

    if fail_on_change && report.has_changes() {
        std::process::exit(1);
    }

    Ok(())
}
