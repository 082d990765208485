//! The `formulate validate` command.

use std::path::PathBuf;

use anyhow::Result;

use formulate_core::parser;

pub fn execute(test_path: PathBuf) -> Result<()> {
    let tests = parser::load_test_sets(&test_path)?;
    anyhow::ensure!(!tests.is_empty(), "no test sets found in {}", test_path.display());

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for test in &tests {
        println!("Test: {} ({} questions)", test.title, test.questions.len());

        for w in parser::validate_test_set(test) {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            if w.is_error() {
                println!("{prefix} ERROR: {}", w.message);
                total_errors += 1;
            } else {
                println!("{prefix} WARNING: {}", w.message);
                total_warnings += 1;
            }
        }
    }

    if total_errors + total_warnings == 0 {
        println!("All test sets valid.");
    } else {
        println!("\n{total_errors} error(s), {total_warnings} warning(s) found.");
    }

    anyhow::ensure!(total_errors == 0, "{total_errors} test set error(s)");
    Ok(())
}
