use criterion::{black_box, criterion_group, criterion_main, Criterion};

use formulate_core::payload::{parse_clicks, parse_placements, parse_test};

fn bench_answer_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("answer_parsing");

    let clicks = (0..50)
        .map(|i| format!("{i},{}", i * 2))
        .collect::<Vec<_>>()
        .join("|");
    let placements = (0..50)
        .map(|i| format!("item {i}=zone {}", i % 5))
        .collect::<Vec<_>>()
        .join("|");

    group.bench_function("50_clicks", |b| b.iter(|| parse_clicks(black_box(&clicks))));

    group.bench_function("50_placements", |b| {
        b.iter(|| parse_placements(black_box(&placements)))
    });

    group.finish();
}

fn bench_toml_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("toml_parsing");

    // Generate test-set TOML strings of various sizes
    let small_toml = generate_test_set_toml(5);
    let medium_toml = generate_test_set_toml(50);
    let large_toml = generate_test_set_toml(200);

    for (name, toml) in [
        ("5_questions", &small_toml),
        ("50_questions", &medium_toml),
        ("200_questions", &large_toml),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let test = formulate_core::parser::parse_test_set_str(
                    black_box(toml),
                    black_box("bench.toml".as_ref()),
                )
                .unwrap();
                parse_test(&test)
            })
        });
    }

    group.finish();
}

fn generate_test_set_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[test]
id = "bench"
title = "Benchmark"
passing_score = 60
"#,
    );
    for i in 0..n {
        let body = match i % 4 {
            0 => r#"type = "multiple_choice"
choices = "alpha|beta|gamma|delta"
correct_answer = "beta|delta""#
                .to_string(),
            1 => r#"type = "short_answer"
correct_answer = "osmosis|membrane/membranes""#
                .to_string(),
            2 => r#"type = "hotspot"
choices = "a:10,10,5|b:0,0,20,20|c:0,0,10,0,10,10"
correct_answer = "a|c""#
                .to_string(),
            _ => r#"type = "drag_drop"
choices = "one|two|three => left|right"
correct_answer = "one=left|two=right|three=left""#
                .to_string(),
        };
        s.push_str(&format!(
            r#"
[[questions]]
id = "q{i}"
prompt = "Question {i}"
tags = ["bench"]
{body}
"#
        ));
    }
    s
}

criterion_group!(benches, bench_answer_parsing, bench_toml_parsing);
criterion_main!(benches);
