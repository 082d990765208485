//! formulate CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "formulate", version, about = "Quiz grading and attempt analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade submissions against a test
    Grade {
        /// Path to the .toml test set
        #[arg(long)]
        test: PathBuf,

        /// Submission JSON file or directory
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Max attempts graded concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Passing percentage for tests that don't set one
        #[arg(long)]
        passing_score: Option<f64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate test set TOML files
    Validate {
        /// Path to test set file or directory
        #[arg(long)]
        test: PathBuf,
    },

    /// Show per-question analytics from a saved report
    Stats {
        /// Grade report JSON
        #[arg(long)]
        report: PathBuf,
    },

    /// Compare two grade reports of the same test
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum change in percentage points that counts
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Exit code 1 if any score or pass status changed
        #[arg(long)]
        fail_on_change: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config, test set, and submission
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("formulate=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            test,
            submissions,
            output,
            format,
            parallelism,
            passing_score,
            config,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                test,
                submissions,
                output,
                format,
                parallelism,
                passing_score,
                config,
            })
            .await
        }
        Commands::Validate { test } => commands::validate::execute(test),
        Commands::Stats { report } => commands::stats::execute(report),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_change,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_change, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
