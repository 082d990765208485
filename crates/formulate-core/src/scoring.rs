//! Per-question scoring.
//!
//! Compares a student's answer against a parsed [`AnswerKey`] and produces a
//! [`QuestionScore`]. Multi-part questions (multi-answer multiple choice,
//! keyword lists, hotspots, drag and drop) earn partial credit according to
//! the test's [`PartialCreditPolicy`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FormulateConfig;
use crate::model::{PartialCreditPolicy, QuestionType, SubmittedAnswer};
use crate::payload::{
    parse_clicks, parse_placements, parse_selection, AnswerKey, ChoiceKey, DragDropKey,
    HotspotKey, KeywordKey, ParsedQuestion, ParsedTest, Rubric,
};

/// Knobs that change how answers are matched and credited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringOptions {
    pub policy: PartialCreditPolicy,
    /// Match short-answer keywords case-sensitively.
    pub case_sensitive: bool,
}

impl ScoringOptions {
    /// Test-level settings win over configured defaults.
    pub fn resolve(test: &ParsedTest, config: &FormulateConfig) -> Self {
        Self {
            policy: test.partial_credit.unwrap_or(config.partial_credit),
            case_sensitive: config.case_sensitive,
        }
    }
}

/// Outcome of scoring one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Correct,
    Partial,
    Incorrect,
    Unanswered,
    /// Needs a teacher to apply the rubric.
    PendingReview,
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreStatus::Correct => write!(f, "correct"),
            ScoreStatus::Partial => write!(f, "partial"),
            ScoreStatus::Incorrect => write!(f, "incorrect"),
            ScoreStatus::Unanswered => write!(f, "unanswered"),
            ScoreStatus::PendingReview => write!(f, "pending review"),
        }
    }
}

impl ScoreStatus {
    /// Status for `earned` out of `possible`, compared after rounding.
    fn from_share(earned: f64, possible: f64) -> Self {
        if earned >= possible {
            ScoreStatus::Correct
        } else if earned > 0.0 {
            ScoreStatus::Partial
        } else {
            ScoreStatus::Incorrect
        }
    }
}

/// Points earned on a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub kind: QuestionType,
    pub earned: f64,
    pub possible: f64,
    pub status: ScoreStatus,
    /// Human-readable notes on what was missed or ignored.
    #[serde(default)]
    pub feedback: Vec<String>,
}

impl QuestionScore {
    /// Earned points as a fraction of possible points (0 when nothing is possible).
    pub fn fraction(&self) -> f64 {
        if self.possible > 0.0 {
            self.earned / self.possible
        } else {
            0.0
        }
    }

    fn empty(question: &ParsedQuestion, status: ScoreStatus) -> Self {
        Self {
            question_id: question.id.clone(),
            kind: question.kind,
            earned: 0.0,
            possible: question.points,
            status,
            feedback: Vec::new(),
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fraction of credit earned for `hits` correct parts out of `total`, with
/// `wrong` incorrect picks.
pub fn credit_fraction(policy: PartialCreditPolicy, hits: usize, wrong: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let fraction = match policy {
        PartialCreditPolicy::AllOrNothing => {
            if hits >= total && wrong == 0 {
                1.0
            } else {
                0.0
            }
        }
        PartialCreditPolicy::Proportional => hits as f64 / total as f64,
        PartialCreditPolicy::ProportionalWithPenalty => {
            hits.saturating_sub(wrong) as f64 / total as f64
        }
    };
    fraction.clamp(0.0, 1.0)
}

/// Lowercase (unless case-sensitive), turn every run of non-alphanumeric
/// characters into one space, and trim.
pub fn normalize_text(text: &str, case_sensitive: bool) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let joined = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        joined
    } else {
        joined.to_lowercase()
    }
}

/// Score one question. `answer` is `None` when the student skipped it.
pub fn score_question(
    question: &ParsedQuestion,
    answer: Option<&SubmittedAnswer>,
    options: &ScoringOptions,
) -> QuestionScore {
    let Some(answer) = answer.filter(|a| !a.is_blank()) else {
        return QuestionScore::empty(question, ScoreStatus::Unanswered);
    };

    let mut feedback = Vec::new();
    let fraction = match &question.key {
        AnswerKey::Choice(key) => score_choice(key, &answer.answer, options, &mut feedback),
        AnswerKey::Keywords(key) => score_keywords(key, &answer.answer, options, &mut feedback),
        AnswerKey::Hotspot(key) => score_hotspot(key, &answer.answer, options, &mut feedback),
        AnswerKey::DragDrop(key) => score_drag_drop(key, &answer.answer, options, &mut feedback),
        AnswerKey::Rubric(rubric) => {
            match score_rubric(rubric, answer, &mut feedback) {
                Some(fraction) => fraction,
                None => {
                    let mut score = QuestionScore::empty(question, ScoreStatus::PendingReview);
                    score.feedback.push("awaiting rubric review".into());
                    return score;
                }
            }
        }
    };

    let earned = round2(fraction * question.points).clamp(0.0, question.points);
    // Zero-point questions still report how the answer fared.
    let status = if question.points > 0.0 {
        ScoreStatus::from_share(earned, question.points)
    } else {
        ScoreStatus::from_share(fraction, 1.0)
    };

    tracing::trace!(question = %question.id, %status, earned, "scored question");

    QuestionScore {
        question_id: question.id.clone(),
        kind: question.kind,
        earned,
        possible: question.points,
        status,
        feedback,
    }
}

fn score_choice(
    key: &ChoiceKey,
    answer: &str,
    options: &ScoringOptions,
    feedback: &mut Vec<String>,
) -> f64 {
    let selection = parse_selection(key, answer);
    for rejected in &selection.rejected {
        feedback.push(format!("'{rejected}' is not one of the choices"));
    }

    let hits = selection
        .values
        .iter()
        .filter(|idx| key.correct.contains(*idx))
        .count();
    let wrong = selection.values.len() - hits + selection.rejected.len();

    for idx in &key.correct {
        if !selection.values.contains(idx) {
            feedback.push(format!("missed '{}'", key.options[*idx]));
        }
    }
    for idx in selection.values.iter().filter(|idx| !key.correct.contains(*idx)) {
        feedback.push(format!("'{}' is not correct", key.options[*idx]));
    }

    if key.is_multi() {
        credit_fraction(options.policy, hits, wrong, key.correct.len())
    } else if hits == 1 && wrong == 0 {
        1.0
    } else {
        0.0
    }
}

fn score_keywords(
    key: &KeywordKey,
    answer: &str,
    options: &ScoringOptions,
    feedback: &mut Vec<String>,
) -> f64 {
    let haystack = format!(" {} ", normalize_text(answer, options.case_sensitive));
    let mut hits = 0;
    for keyword in &key.keywords {
        let matched = keyword.alternatives.iter().any(|alt| {
            let needle = normalize_text(alt, options.case_sensitive);
            !needle.is_empty() && haystack.contains(&format!(" {needle} "))
        });
        if matched {
            hits += 1;
        } else {
            feedback.push(format!("missing keyword '{}'", keyword.label()));
        }
    }
    credit_fraction(options.policy, hits, 0, key.keywords.len())
}

fn score_hotspot(
    key: &HotspotKey,
    answer: &str,
    options: &ScoringOptions,
    feedback: &mut Vec<String>,
) -> f64 {
    let clicks = parse_clicks(answer);
    for rejected in &clicks.rejected {
        feedback.push(format!("could not read click '{rejected}'"));
    }

    let mut hit_regions = HashSet::new();
    let mut wrong = clicks.rejected.len();
    for click in &clicks.values {
        let inside: Vec<usize> = key
            .correct
            .iter()
            .copied()
            .filter(|idx| key.regions[*idx].shape.contains(*click))
            .collect();
        if inside.is_empty() {
            wrong += 1;
            feedback.push(format!(
                "click ({}, {}) is outside every correct region",
                click.x, click.y
            ));
        }
        hit_regions.extend(inside);
    }

    for idx in &key.correct {
        if !hit_regions.contains(idx) {
            feedback.push(format!("missed region '{}'", key.regions[*idx].name));
        }
    }

    credit_fraction(options.policy, hit_regions.len(), wrong, key.correct.len())
}

fn score_drag_drop(
    key: &DragDropKey,
    answer: &str,
    options: &ScoringOptions,
    feedback: &mut Vec<String>,
) -> f64 {
    let placements = parse_placements(answer);
    for rejected in &placements.rejected {
        feedback.push(format!("could not read placement '{rejected}'"));
    }

    let mut seen = HashSet::new();
    let mut hits = 0;
    let mut wrong = placements.rejected.len();
    for (item, zone) in &placements.values {
        let Some(item_idx) = key.item_index(item) else {
            wrong += 1;
            feedback.push(format!("'{item}' is not one of the items"));
            continue;
        };
        if !seen.insert(item_idx) {
            feedback.push(format!("duplicate placement of '{item}' ignored"));
            continue;
        }
        match key.zone_for(item_idx) {
            None => {
                wrong += 1;
                feedback.push(format!("'{}' should not be placed", key.items[item_idx]));
            }
            Some(expected) if key.zone_index(zone) == Some(expected) => hits += 1,
            Some(expected) => {
                wrong += 1;
                feedback.push(format!(
                    "'{}' belongs in '{}', not '{zone}'",
                    key.items[item_idx], key.zones[expected]
                ));
            }
        }
    }

    for (item_idx, _) in &key.pairs {
        if !seen.contains(item_idx) {
            feedback.push(format!("'{}' was not placed", key.items[*item_idx]));
        }
    }

    credit_fraction(options.policy, hits, wrong, key.pairs.len())
}

/// Returns `None` when the essay still needs a teacher's marks.
fn score_rubric(
    rubric: &Rubric,
    answer: &SubmittedAnswer,
    feedback: &mut Vec<String>,
) -> Option<f64> {
    if answer.rubric_marks.is_empty() {
        return None;
    }

    let mut awarded = 0.0;
    let mut marked = HashSet::new();
    for (name, mark) in &answer.rubric_marks {
        let Some(idx) = rubric.position(name) else {
            feedback.push(format!("unknown rubric criterion '{name}' ignored"));
            continue;
        };
        let criterion = &rubric.criteria[idx];
        if !marked.insert(idx) {
            feedback.push(format!(
                "duplicate mark '{name}' for '{}' ignored",
                criterion.name
            ));
            continue;
        }
        if !mark.is_finite() {
            feedback.push(format!("mark for '{}' is not a number", criterion.name));
            continue;
        }
        let clamped = mark.clamp(0.0, criterion.max);
        if clamped != *mark {
            feedback.push(format!(
                "mark for '{}' clamped to {clamped}",
                criterion.name
            ));
        }
        awarded += clamped;
    }

    let total = rubric.total();
    Some(if total > 0.0 { awarded / total } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use crate::payload::parse_question;

    fn parsed(kind: QuestionType, choices: &str, correct: &str, points: f64) -> ParsedQuestion {
        parse_question(&Question {
            id: "q".into(),
            kind,
            prompt: String::new(),
            choices: choices.into(),
            correct_answer: correct.into(),
            points: Some(points),
            tags: vec![],
            explanation: None,
        })
        .unwrap()
    }

    fn score(q: &ParsedQuestion, answer: &str, policy: PartialCreditPolicy) -> QuestionScore {
        let options = ScoringOptions {
            policy,
            case_sensitive: false,
        };
        score_question(q, Some(&SubmittedAnswer::new("q", answer)), &options)
    }

    const PENALTY: PartialCreditPolicy = PartialCreditPolicy::ProportionalWithPenalty;

    #[test]
    fn credit_fraction_policies() {
        use PartialCreditPolicy::*;
        assert_eq!(credit_fraction(AllOrNothing, 3, 0, 3), 1.0);
        assert_eq!(credit_fraction(AllOrNothing, 3, 1, 3), 0.0);
        assert_eq!(credit_fraction(AllOrNothing, 2, 0, 3), 0.0);
        assert_eq!(credit_fraction(Proportional, 2, 5, 4), 0.5);
        assert_eq!(credit_fraction(ProportionalWithPenalty, 3, 1, 4), 0.5);
        assert_eq!(credit_fraction(ProportionalWithPenalty, 1, 3, 4), 0.0);
        assert_eq!(credit_fraction(Proportional, 0, 0, 0), 0.0);
    }

    #[test]
    fn unanswered_and_blank() {
        let q = parsed(QuestionType::MultipleChoice, "a|b", "a", 2.0);
        let options = ScoringOptions::default();
        let skipped = score_question(&q, None, &options);
        assert_eq!(skipped.status, ScoreStatus::Unanswered);
        assert_eq!(skipped.possible, 2.0);
        let blank = score(&q, "   ", PENALTY);
        assert_eq!(blank.status, ScoreStatus::Unanswered);
        assert_eq!(blank.earned, 0.0);
    }

    #[test]
    fn single_answer_choice_is_all_or_nothing() {
        let q = parsed(QuestionType::MultipleChoice, "Paris|London|Berlin", "Paris", 2.0);
        let right = score(&q, "a", PartialCreditPolicy::Proportional);
        assert_eq!(right.status, ScoreStatus::Correct);
        assert_eq!(right.earned, 2.0);

        // picking everything never earns credit on a single-answer question
        let all = score(&q, "A|B|C", PartialCreditPolicy::Proportional);
        assert_eq!(all.status, ScoreStatus::Incorrect);
        assert_eq!(all.earned, 0.0);

        let wrong = score(&q, "London", PENALTY);
        assert_eq!(wrong.status, ScoreStatus::Incorrect);
        assert!(wrong.feedback.iter().any(|f| f.contains("missed 'Paris'")));
    }

    #[test]
    fn multi_answer_choice_partial_credit() {
        let q = parsed(QuestionType::MultipleChoice, "2|3|4|5|6", "2|3|5", 3.0);
        let partial = score(&q, "2|3", PENALTY);
        assert_eq!(partial.status, ScoreStatus::Partial);
        assert_eq!(partial.earned, 2.0);

        let with_wrong = score(&q, "2|3|4", PENALTY);
        assert_eq!(with_wrong.earned, 1.0);

        let generous = score(&q, "2|3|4", PartialCreditPolicy::Proportional);
        assert_eq!(generous.earned, 2.0);

        let strict = score(&q, "2|3", PartialCreditPolicy::AllOrNothing);
        assert_eq!(strict.earned, 0.0);

        let full = score(&q, "5|3|2", PartialCreditPolicy::AllOrNothing);
        assert_eq!(full.status, ScoreStatus::Correct);
    }

    #[test]
    fn unknown_selection_counts_as_wrong() {
        let q = parsed(QuestionType::MultipleChoice, "a|b|c", "a|b", 2.0);
        let s = score(&q, "a|b|zebra", PENALTY);
        assert_eq!(s.earned, 1.0);
        assert!(s.feedback.iter().any(|f| f.contains("zebra")));
    }

    #[test]
    fn true_false() {
        let q = parsed(QuestionType::TrueFalse, "", "True", 1.0);
        assert_eq!(score(&q, "true", PENALTY).status, ScoreStatus::Correct);
        assert_eq!(score(&q, "B", PENALTY).status, ScoreStatus::Incorrect);
    }

    #[test]
    fn keywords_match_on_word_boundaries() {
        let q = parsed(
            QuestionType::ShortAnswer,
            "",
            "photosynthesis|chlorophyll/chloroplast|light energy",
            3.0,
        );
        let s = score(&q, "Plants use PHOTOSYNTHESIS, powered by light-energy.", PENALTY);
        assert_eq!(s.earned, 2.0);
        assert_eq!(s.status, ScoreStatus::Partial);
        assert!(s.feedback.iter().any(|f| f.contains("chlorophyll")));

        let all = score(&q, "chloroplast photosynthesis light energy", PENALTY);
        assert_eq!(all.status, ScoreStatus::Correct);

        // substring of a longer word does not count
        let q = parsed(QuestionType::ShortAnswer, "", "cell", 1.0);
        assert_eq!(score(&q, "cellular respiration", PENALTY).earned, 0.0);
    }

    #[test]
    fn keywords_case_sensitive_option() {
        let q = parsed(QuestionType::ShortAnswer, "", "DNA", 1.0);
        let options = ScoringOptions {
            policy: PENALTY,
            case_sensitive: true,
        };
        let lower = score_question(&q, Some(&SubmittedAnswer::new("q", "dna")), &options);
        assert_eq!(lower.status, ScoreStatus::Incorrect);
        let upper = score_question(&q, Some(&SubmittedAnswer::new("q", "DNA helix")), &options);
        assert_eq!(upper.status, ScoreStatus::Correct);
    }

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize_text("  Hello,   World!! ", false), "hello world");
        assert_eq!(normalize_text("co-operate", true), "co operate");
    }

    #[test]
    fn hotspot_hits_and_stray_clicks() {
        let q = parsed(
            QuestionType::Hotspot,
            "heart:50,50,10|lung:0,0,20,40|liver:100,100,20,20",
            "heart|liver",
            2.0,
        );
        let both = score(&q, "52,48|110,110", PENALTY);
        assert_eq!(both.status, ScoreStatus::Correct);

        let one = score(&q, "50,50", PENALTY);
        assert_eq!(one.earned, 1.0);
        assert!(one.feedback.iter().any(|f| f.contains("liver")));

        // clicking the lung cancels the heart under the penalty policy
        let stray = score(&q, "50,50|5,5", PENALTY);
        assert_eq!(stray.earned, 0.0);

        let garbage = score(&q, "nowhere", PENALTY);
        assert_eq!(garbage.status, ScoreStatus::Incorrect);
    }

    #[test]
    fn hotspot_repeated_clicks_count_once() {
        let q = parsed(QuestionType::Hotspot, "a:0,0,10|b:100,100,10", "a|b", 2.0);
        let s = score(&q, "1,1|2,2|3,3", PartialCreditPolicy::Proportional);
        assert_eq!(s.earned, 1.0);
    }

    #[test]
    fn drag_drop_scoring() {
        let q = parsed(
            QuestionType::DragDrop,
            "apple|carrot|salmon|rock => Fruit|Vegetable|Fish",
            "apple=Fruit|carrot=Vegetable|salmon=Fish",
            3.0,
        );
        let perfect = score(&q, "apple=fruit|carrot=vegetable|salmon=fish", PENALTY);
        assert_eq!(perfect.status, ScoreStatus::Correct);
        assert_eq!(perfect.earned, 3.0);

        let swapped = score(&q, "apple=Fruit|carrot=Fish|salmon=Vegetable", PENALTY);
        assert_eq!(swapped.earned, 0.0);

        let swapped = score(&q, "apple=Fruit|carrot=Fish|salmon=Vegetable", PartialCreditPolicy::Proportional);
        assert_eq!(swapped.earned, 1.0);

        let distractor = score(&q, "apple=Fruit|carrot=Vegetable|rock=Fish", PENALTY);
        assert_eq!(distractor.earned, 1.0);
        assert!(distractor.feedback.iter().any(|f| f.contains("'rock' should not be placed")));
        assert!(distractor.feedback.iter().any(|f| f.contains("'salmon' was not placed")));
    }

    #[test]
    fn drag_drop_first_placement_wins() {
        let q = parsed(QuestionType::DragDrop, "", "a=X|b=Y", 2.0);
        let s = score(&q, "a=X|a=Y|b=Y", PENALTY);
        assert_eq!(s.status, ScoreStatus::Correct);
        assert!(s.feedback.iter().any(|f| f.contains("duplicate")));
    }

    #[test]
    fn essay_pending_until_marked() {
        let q = parsed(QuestionType::Essay, "Thesis:4|Evidence:4|Mechanics:2", "", 10.0);
        let pending = score(&q, "An essay about cells.", PENALTY);
        assert_eq!(pending.status, ScoreStatus::PendingReview);
        assert_eq!(pending.earned, 0.0);
        assert_eq!(pending.possible, 10.0);

        let mut answer = SubmittedAnswer::new("q", "An essay about cells.");
        answer.rubric_marks.insert("thesis".into(), 3.0);
        answer.rubric_marks.insert("Evidence".into(), 9.0);
        answer.rubric_marks.insert("Style".into(), 2.0);
        let marked = score_question(&q, Some(&answer), &ScoringOptions::default());
        assert_eq!(marked.earned, 7.0);
        assert_eq!(marked.status, ScoreStatus::Partial);
        assert!(marked.feedback.iter().any(|f| f.contains("clamped")));
        assert!(marked.feedback.iter().any(|f| f.contains("Style")));
    }

    #[test]
    fn essay_marks_scale_to_question_points() {
        let q = parsed(QuestionType::Essay, "Thesis:4|Evidence:4", "", 4.0);
        let mut answer = SubmittedAnswer::new("q", "text");
        answer.rubric_marks.insert("Thesis".into(), 4.0);
        answer.rubric_marks.insert("Evidence".into(), 2.0);
        let s = score_question(&q, Some(&answer), &ScoringOptions::default());
        assert_eq!(s.earned, 3.0);
    }

    #[test]
    fn essay_criterion_marked_once() {
        let q = parsed(QuestionType::Essay, "Thesis:4|Evidence:4", "", 8.0);
        let mut answer = SubmittedAnswer::new("q", "text");
        answer.rubric_marks.insert("Thesis".into(), 4.0);
        answer.rubric_marks.insert("thesis".into(), 4.0);
        let s = score_question(&q, Some(&answer), &ScoringOptions::default());
        assert_eq!(s.earned, 4.0);
        assert_eq!(s.status, ScoreStatus::Partial);
        assert_eq!(
            s.feedback
                .iter()
                .filter(|f| f.contains("duplicate mark"))
                .count(),
            1
        );
    }

    #[test]
    fn status_follows_rounded_points() {
        let q = parsed(QuestionType::Essay, "Overall:1000", "", 1.0);
        let mark = |value: f64| {
            let mut answer = SubmittedAnswer::new("q", "text");
            answer.rubric_marks.insert("Overall".into(), value);
            score_question(&q, Some(&answer), &ScoringOptions::default())
        };

        let nearly_full = mark(999.99);
        assert_eq!(nearly_full.earned, 1.0);
        assert_eq!(nearly_full.status, ScoreStatus::Correct);

        let sliver = mark(1.0);
        assert_eq!(sliver.earned, 0.0);
        assert_eq!(sliver.status, ScoreStatus::Incorrect);

        let half = mark(500.0);
        assert_eq!(half.earned, 0.5);
        assert_eq!(half.status, ScoreStatus::Partial);
    }

    #[test]
    fn zero_point_question_keeps_status() {
        let q = parsed(QuestionType::MultipleChoice, "a|b", "a", 0.0);
        let right = score(&q, "a", PENALTY);
        assert_eq!(right.earned, 0.0);
        assert_eq!(right.status, ScoreStatus::Correct);
        assert_eq!(score(&q, "b", PENALTY).status, ScoreStatus::Incorrect);
    }

    #[test]
    fn essay_blank_is_unanswered() {
        let q = parsed(QuestionType::Essay, "", "", 5.0);
        assert_eq!(score(&q, "", PENALTY).status, ScoreStatus::Unanswered);
    }

    #[test]
    fn earned_is_rounded() {
        let q = parsed(QuestionType::MultipleChoice, "a|b|c|d", "a|b|c", 1.0);
        let s = score(&q, "a", PENALTY);
        assert_eq!(s.earned, 0.33);
        assert!((s.fraction() - 0.33).abs() < 1e-9);
    }
}
