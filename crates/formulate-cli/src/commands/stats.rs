//! The `formulate stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use formulate_core::report::GradeReport;
use formulate_core::statistics::DISTRIBUTION_BUCKETS;

pub fn execute(report_path: PathBuf) -> Result<()> {
    let report = GradeReport::load_json(&report_path)?;
    let stats = &report.stats;

    println!("{} ({} attempts)", report.test.title, stats.attempts);
    println!(
        "Mean {:.1}% | Median {:.1}% | Min {:.1}% | Max {:.1}% | Std dev {:.2}",
        stats.mean_percentage,
        stats.median_percentage,
        stats.min_percentage,
        stats.max_percentage,
        stats.std_dev,
    );
    println!(
        "Pass rate {:.1}% (passing {:.0}%), {} pending review",
        stats.pass_rate * 100.0,
        report.test.passing_score,
        stats.pending_review
    );

    println!("\nDistribution:");
    for (i, count) in stats.distribution.iter().enumerate() {
        let low = i * 10;
        let high = if i == DISTRIBUTION_BUCKETS - 1 { 100 } else { low + 9 };
        println!("  {low:>3}-{high:<3} {:<20} {count}", "#".repeat((*count).min(20)));
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Question",
        "Type",
        "Points",
        "Answered",
        "Facility",
        "Full credit",
        "Discrimination",
    ]);
    for q in stats.hardest_questions() {
        table.add_row(vec![
            Cell::new(&q.question_id),
            Cell::new(q.kind),
            Cell::new(format!("{:.2}", q.points)),
            Cell::new(q.answered),
            Cell::new(format!("{:.0}%", q.facility * 100.0)),
            Cell::new(format!("{:.0}%", q.full_credit_rate * 100.0)),
            Cell::new(
                q.discrimination
                    .map(|d| format!("{d:+.2}"))
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
