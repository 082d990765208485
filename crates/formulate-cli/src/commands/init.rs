//! The `formulate init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("formulate.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("test-sets")?;
    write_if_missing(Path::new("test-sets/example.toml"), EXAMPLE_TEST_SET)?;

    std::fs::create_dir_all("submissions")?;
    write_if_missing(Path::new("submissions/example.json"), EXAMPLE_SUBMISSION)?;

    println!("\nNext steps:");
    println!("  1. Edit test-sets/example.toml with your questions");
    println!("  2. Run: formulate validate --test test-sets/example.toml");
    println!("  3. Run: formulate grade --test test-sets/example.toml --submissions submissions");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# formulate configuration

# Passing percentage for tests that don't set one
passing_score = 60

# all_or_nothing, proportional, or proportional_with_penalty
partial_credit = "proportional_with_penalty"

# Match short-answer keywords case-sensitively
case_sensitive = false

parallelism = 4
output_dir = "./formulate-results"
"#;

const EXAMPLE_TEST_SET: &str = r#"[test]
id = "example"
title = "Example Quiz"
description = "One question of each type to get started"
passing_score = 60

[[questions]]
id = "capital"
type = "multiple_choice"
prompt = "What is the capital of France?"
choices = "Berlin|Paris|Madrid"
correct_answer = "Paris"

[[questions]]
id = "primes"
type = "multiple_choice"
prompt = "Select every prime number."
choices = "2|4|5|9"
correct_answer = "2|5"
points = 2

[[questions]]
id = "earth_flat"
type = "true_false"
prompt = "The Earth is flat."
correct_answer = "False"

[[questions]]
id = "photosynthesis"
type = "short_answer"
prompt = "What do plants need for photosynthesis?"
correct_answer = "sunlight/light|water|carbon dioxide/co2"
points = 3

[[questions]]
id = "find_center"
type = "hotspot"
prompt = "Click the center of the target."
choices = "bullseye:50,50,10|outer:0,0,100,100"
correct_answer = "bullseye"

[[questions]]
id = "match_capitals"
type = "drag_drop"
prompt = "Drag each city to its country."
choices = "Paris|Rome|Madrid => France|Italy|Spain"
correct_answer = "Paris=France|Rome=Italy|Madrid=Spain"
points = 3

[[questions]]
id = "reflection"
type = "essay"
prompt = "Explain why the sky is blue."
choices = "Accuracy:3|Clarity:2"
"#;

const EXAMPLE_SUBMISSION: &str = r#"[
  {
    "test_id": "example",
    "student_id": "student-1",
    "submitted_at": "2024-05-01T10:00:00Z",
    "answers": [
      { "question_id": "capital", "answer": "Paris" },
      { "question_id": "primes", "answer": "2|5" },
      { "question_id": "earth_flat", "answer": "false" },
      { "question_id": "photosynthesis", "answer": "Light, water and CO2" },
      { "question_id": "find_center", "answer": "52,48" },
      { "question_id": "match_capitals", "answer": "Paris=France|Rome=Italy|Madrid=Spain" },
      {
        "question_id": "reflection",
        "answer": "Rayleigh scattering favours short wavelengths.",
        "rubric_marks": { "Accuracy": 3, "Clarity": 1 }
      }
    ]
  },
  {
    "test_id": "example",
    "student_id": "student-2",
    "submitted_at": "2024-05-01T10:05:00Z",
    "answers": [
      { "question_id": "capital", "answer": "B" },
      { "question_id": "primes", "answer": "2|4" },
      { "question_id": "earth_flat", "answer": "True" },
      { "question_id": "photosynthesis", "answer": "sunlight" },
      { "question_id": "match_capitals", "answer": "Paris=France|Rome=Spain" },
      { "question_id": "reflection", "answer": "Because of the ocean." }
    ]
  }
]
"#;
