//! Question payload parser.
//!
//! Every question stores its options and answer key as delimited text. This
//! module turns those blobs into typed [`AnswerKey`]s once, when a test is
//! loaded, and provides the lenient parsers used on student answers.
//!
//! List entries are separated by `|` or by newlines. Entries are trimmed and
//! blank entries are dropped.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;
use crate::model::{PartialCreditPolicy, Question, QuestionType, TestDefinition};

/// Choices used by a true/false question that leaves `choices` blank.
pub const TRUE_FALSE_CHOICES: [&str; 2] = ["True", "False"];

/// Name of the single criterion given to essays without a rubric.
pub const OVERALL_CRITERION: &str = "Overall";

/// A test whose questions have all been parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTest {
    pub id: String,
    pub title: String,
    pub passing_score: Option<f64>,
    pub partial_credit: Option<PartialCreditPolicy>,
    pub questions: Vec<ParsedQuestion>,
}

impl ParsedTest {
    /// Total points available across all questions.
    pub fn points_possible(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&ParsedQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A question with its answer key in typed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub id: String,
    pub kind: QuestionType,
    /// Points available for this question.
    pub points: f64,
    pub key: AnswerKey,
}

/// The typed answer key for each question family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum AnswerKey {
    Choice(ChoiceKey),
    Keywords(KeywordKey),
    Hotspot(HotspotKey),
    DragDrop(DragDropKey),
    Rubric(Rubric),
}

// ---------------------------------------------------------------------------
// Multiple choice
// ---------------------------------------------------------------------------

/// Options and the indices of the correct ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceKey {
    pub options: Vec<String>,
    pub correct: BTreeSet<usize>,
}

impl ChoiceKey {
    /// Resolve a reference to an option index.
    ///
    /// Tries, in order: case-insensitive option text, a letter label
    /// (`A` is the first option), and a 1-based index.
    pub fn resolve(&self, reference: &str) -> Option<usize> {
        let reference = reference.trim();
        if let Some(idx) = position_ci(&self.options, reference) {
            return Some(idx);
        }

        let mut chars = reference.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                let idx = (c.to_ascii_uppercase() as u8 - b'A') as usize;
                if idx < self.options.len() {
                    return Some(idx);
                }
            }
        }

        reference
            .parse::<usize>()
            .ok()
            .filter(|&n| n >= 1 && n <= self.options.len())
            .map(|n| n - 1)
    }

    /// Whether more than one option is correct.
    pub fn is_multi(&self) -> bool {
        self.correct.len() > 1
    }
}

// ---------------------------------------------------------------------------
// Short answer
// ---------------------------------------------------------------------------

/// Required keywords for a short answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordKey {
    pub keywords: Vec<Keyword>,
}

/// One required keyword and its accepted spellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub alternatives: Vec<String>,
}

impl Keyword {
    /// The first spelling, used in feedback.
    pub fn label(&self) -> &str {
        self.alternatives.first().map(String::as_str).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Hotspot
// ---------------------------------------------------------------------------

/// A point on the question image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The area a region covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Circle { cx: f64, cy: f64, r: f64 },
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Polygon { vertices: Vec<Point> },
}

impl Shape {
    /// Whether the point lies inside the shape. Edges count as inside for
    /// circles and rectangles.
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Shape::Circle { cx, cy, r } => {
                let (dx, dy) = (p.x - cx, p.y - cy);
                dx * dx + dy * dy <= r * r
            }
            Shape::Rect { x, y, w, h } => p.x >= *x && p.x <= x + w && p.y >= *y && p.y <= y + h,
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return false;
                }
                // even-odd rule
                let mut inside = false;
                let mut j = vertices.len() - 1;
                for i in 0..vertices.len() {
                    let (a, b) = (vertices[i], vertices[j]);
                    if (a.y > p.y) != (b.y > p.y)
                        && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }
}

/// A named clickable area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(flatten)]
    pub shape: Shape,
}

/// Regions and the indices of those the student should click.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotKey {
    pub regions: Vec<Region>,
    pub correct: BTreeSet<usize>,
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// Items, zones, and the zone each keyed item belongs in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragDropKey {
    pub items: Vec<String>,
    pub zones: Vec<String>,
    /// `(item index, zone index)` pairs, one per keyed item.
    pub pairs: Vec<(usize, usize)>,
}

impl DragDropKey {
    pub fn item_index(&self, name: &str) -> Option<usize> {
        position_ci(&self.items, name)
    }

    pub fn zone_index(&self, name: &str) -> Option<usize> {
        position_ci(&self.zones, name)
    }

    /// The zone a keyed item belongs in, or `None` for distractors.
    pub fn zone_for(&self, item: usize) -> Option<usize> {
        self.pairs.iter().find(|(i, _)| *i == item).map(|(_, z)| *z)
    }
}

// ---------------------------------------------------------------------------
// Essay
// ---------------------------------------------------------------------------

/// Grading rubric for an essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    pub criteria: Vec<Criterion>,
}

impl Rubric {
    pub fn total(&self) -> f64 {
        self.criteria.iter().map(|c| c.max).sum()
    }

    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.position(name).map(|idx| &self.criteria[idx])
    }

    /// Index of the criterion `name` refers to, ignoring case.
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim().to_lowercase();
        self.criteria
            .iter()
            .position(|c| c.name.to_lowercase() == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split a delimited list on `|` and newlines.
pub fn split_list(s: &str) -> Vec<&str> {
    s.split(['|', '\n'])
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect()
}

fn position_ci(haystack: &[String], needle: &str) -> Option<usize> {
    let needle = needle.trim().to_lowercase();
    haystack.iter().position(|h| h.to_lowercase() == needle)
}

/// Parse every question of a test, rejecting duplicate ids.
pub fn parse_test(test: &TestDefinition) -> Result<ParsedTest, PayloadError> {
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(test.questions.len());
    for question in &test.questions {
        if !seen.insert(question.id.as_str()) {
            return Err(PayloadError::DuplicateQuestion(question.id.clone()));
        }
        questions.push(parse_question(question)?);
    }

    Ok(ParsedTest {
        id: test.id.clone(),
        title: test.title.clone(),
        passing_score: test.passing_score,
        partial_credit: test.partial_credit,
        questions,
    })
}

/// Parse one question's payload into an answer key.
pub fn parse_question(question: &Question) -> Result<ParsedQuestion, PayloadError> {
    if let Some(points) = question.points {
        if !points.is_finite() || points < 0.0 {
            return Err(PayloadError::InvalidPoints {
                question: question.id.clone(),
                points,
            });
        }
    }

    let key = match question.kind {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            AnswerKey::Choice(parse_choice_key(question)?)
        }
        QuestionType::ShortAnswer => AnswerKey::Keywords(parse_keyword_key(question)?),
        QuestionType::Hotspot => AnswerKey::Hotspot(parse_hotspot_key(question)?),
        QuestionType::DragDrop => AnswerKey::DragDrop(parse_drag_drop_key(question)?),
        QuestionType::Essay => AnswerKey::Rubric(parse_rubric(question)?),
    };

    let points = match (&key, question.points) {
        (_, Some(points)) => points,
        (AnswerKey::Rubric(rubric), None) => rubric.total(),
        (_, None) => 1.0,
    };

    Ok(ParsedQuestion {
        id: question.id.clone(),
        kind: question.kind,
        points,
        key,
    })
}

fn parse_choice_key(question: &Question) -> Result<ChoiceKey, PayloadError> {
    let mut options: Vec<String> = split_list(&question.choices)
        .into_iter()
        .map(String::from)
        .collect();
    if options.is_empty() && question.kind == QuestionType::TrueFalse {
        options = TRUE_FALSE_CHOICES.iter().map(|s| s.to_string()).collect();
    }
    if options.is_empty() {
        return Err(PayloadError::NoChoices {
            question: question.id.clone(),
        });
    }

    let mut key = ChoiceKey {
        options,
        correct: BTreeSet::new(),
    };
    for reference in split_list(&question.correct_answer) {
        let idx = key
            .resolve(reference)
            .ok_or_else(|| PayloadError::UnknownChoice {
                question: question.id.clone(),
                reference: reference.to_string(),
            })?;
        key.correct.insert(idx);
    }

    if key.correct.is_empty() {
        return Err(PayloadError::NoCorrectAnswer {
            question: question.id.clone(),
        });
    }
    Ok(key)
}

fn parse_keyword_key(question: &Question) -> Result<KeywordKey, PayloadError> {
    let keywords: Vec<Keyword> = split_list(&question.correct_answer)
        .into_iter()
        .map(|entry| Keyword {
            alternatives: entry
                .split('/')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect(),
        })
        .filter(|k| !k.alternatives.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(PayloadError::NoCorrectAnswer {
            question: question.id.clone(),
        });
    }
    Ok(KeywordKey { keywords })
}

fn parse_hotspot_key(question: &Question) -> Result<HotspotKey, PayloadError> {
    let mut regions: Vec<Region> = Vec::new();
    for entry in split_list(&question.choices) {
        let region = parse_region(&question.id, entry)?;
        if regions
            .iter()
            .any(|r| r.name.to_lowercase() == region.name.to_lowercase())
        {
            return Err(PayloadError::InvalidRegion {
                question: question.id.clone(),
                region: entry.to_string(),
                reason: "duplicate region name".into(),
            });
        }
        regions.push(region);
    }
    if regions.is_empty() {
        return Err(PayloadError::NoChoices {
            question: question.id.clone(),
        });
    }

    let mut correct = BTreeSet::new();
    for name in split_list(&question.correct_answer) {
        let needle = name.to_lowercase();
        let idx = regions
            .iter()
            .position(|r| r.name.to_lowercase() == needle)
            .ok_or_else(|| PayloadError::UnknownRegion {
                question: question.id.clone(),
                region: name.to_string(),
            })?;
        correct.insert(idx);
    }
    if correct.is_empty() {
        return Err(PayloadError::NoCorrectAnswer {
            question: question.id.clone(),
        });
    }

    Ok(HotspotKey { regions, correct })
}

fn parse_region(question_id: &str, entry: &str) -> Result<Region, PayloadError> {
    let invalid = |reason: &str| PayloadError::InvalidRegion {
        question: question_id.to_string(),
        region: entry.to_string(),
        reason: reason.to_string(),
    };

    let (name, coords) = entry
        .split_once(':')
        .ok_or_else(|| invalid("expected name:coordinates"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("region name is empty"));
    }

    let numbers = coords
        .split(',')
        .map(|n| n.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| invalid("coordinates must be numbers"))?;

    let shape = match numbers.as_slice() {
        &[cx, cy, r] => {
            if r <= 0.0 {
                return Err(invalid("radius must be positive"));
            }
            Shape::Circle { cx, cy, r }
        }
        &[x, y, w, h] => {
            if w <= 0.0 || h <= 0.0 {
                return Err(invalid("width and height must be positive"));
            }
            Shape::Rect { x, y, w, h }
        }
        n if n.len() >= 6 && n.len() % 2 == 0 => Shape::Polygon {
            vertices: n.chunks(2).map(|c| Point { x: c[0], y: c[1] }).collect(),
        },
        _ => {
            return Err(invalid(
                "expected 3 (circle), 4 (rect), or an even count of at least 6 (polygon) coordinates",
            ))
        }
    };

    Ok(Region {
        name: name.to_string(),
        shape,
    })
}

fn parse_drag_drop_key(question: &Question) -> Result<DragDropKey, PayloadError> {
    let choices = question.choices.trim();
    let (items_part, zones_part) = match choices.split_once("=>") {
        Some((items, zones)) => (items, Some(zones)),
        None => (choices, None),
    };

    let items: Vec<String> = split_list(items_part).into_iter().map(String::from).collect();
    let zones: Vec<String> = zones_part
        .map(|z| split_list(z).into_iter().map(String::from).collect())
        .unwrap_or_default();
    let derive_items = items.is_empty();
    let derive_zones = zones.is_empty();

    let mut key = DragDropKey {
        items,
        zones,
        pairs: Vec::new(),
    };

    for pair in split_list(&question.correct_answer) {
        let malformed = || PayloadError::MalformedPair {
            question: question.id.clone(),
            pair: pair.to_string(),
        };
        let (item, zone) = pair.split_once('=').ok_or_else(malformed)?;
        let (item, zone) = (item.trim(), zone.trim());
        if item.is_empty() || zone.is_empty() {
            return Err(malformed());
        }

        let item_idx = match key.item_index(item) {
            Some(idx) => idx,
            None if derive_items => {
                key.items.push(item.to_string());
                key.items.len() - 1
            }
            None => {
                return Err(PayloadError::UnknownItem {
                    question: question.id.clone(),
                    item: item.to_string(),
                })
            }
        };
        let zone_idx = match key.zone_index(zone) {
            Some(idx) => idx,
            None if derive_zones => {
                key.zones.push(zone.to_string());
                key.zones.len() - 1
            }
            None => {
                return Err(PayloadError::UnknownZone {
                    question: question.id.clone(),
                    zone: zone.to_string(),
                })
            }
        };

        if key.zone_for(item_idx).is_some() {
            return Err(PayloadError::DuplicateItem {
                question: question.id.clone(),
                item: item.to_string(),
            });
        }
        key.pairs.push((item_idx, zone_idx));
    }

    if key.pairs.is_empty() {
        return Err(PayloadError::NoCorrectAnswer {
            question: question.id.clone(),
        });
    }
    Ok(key)
}

fn parse_rubric(question: &Question) -> Result<Rubric, PayloadError> {
    let mut criteria = Vec::new();
    for entry in split_list(&question.choices) {
        let invalid = |reason: &str| PayloadError::InvalidRubric {
            question: question.id.clone(),
            criterion: entry.to_string(),
            reason: reason.to_string(),
        };
        let (name, max) = entry
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected criterion:points"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("criterion name is empty"));
        }
        let max = max
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|m| m.is_finite() && *m > 0.0)
            .ok_or_else(|| invalid("points must be a positive number"))?;
        criteria.push(Criterion {
            name: name.to_string(),
            max,
        });
    }

    if criteria.is_empty() {
        criteria.push(Criterion {
            name: OVERALL_CRITERION.to_string(),
            max: question.points.unwrap_or(1.0),
        });
    }
    Ok(Rubric { criteria })
}

// ---------------------------------------------------------------------------
// Student answers
// ---------------------------------------------------------------------------

/// Values parsed from a student's answer, plus the fragments that could not
/// be understood.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnswer<T> {
    pub values: Vec<T>,
    pub rejected: Vec<String>,
}

// No `T: Default` bound; `Point` has no natural default.
impl<T> Default for ParsedAnswer<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Resolve each selected option. Duplicates collapse.
pub fn parse_selection(key: &ChoiceKey, answer: &str) -> ParsedAnswer<usize> {
    let mut parsed = ParsedAnswer::default();
    for reference in split_list(answer) {
        match key.resolve(reference) {
            Some(idx) if !parsed.values.contains(&idx) => parsed.values.push(idx),
            Some(_) => {}
            None => parsed.rejected.push(reference.to_string()),
        }
    }
    parsed
}

/// Parse `x,y|x,y` clicks.
pub fn parse_clicks(answer: &str) -> ParsedAnswer<Point> {
    let mut parsed = ParsedAnswer::default();
    for click in split_list(answer) {
        let point = click.split_once(',').and_then(|(x, y)| {
            let x = x.trim().parse::<f64>().ok()?;
            let y = y.trim().parse::<f64>().ok()?;
            (x.is_finite() && y.is_finite()).then_some(Point { x, y })
        });
        match point {
            Some(p) => parsed.values.push(p),
            None => parsed.rejected.push(click.to_string()),
        }
    }
    parsed
}

/// Parse `item=zone|item=zone` placements, keeping raw names.
pub fn parse_placements(answer: &str) -> ParsedAnswer<(String, String)> {
    let mut parsed = ParsedAnswer::default();
    for pair in split_list(answer) {
        match pair.split_once('=') {
            Some((item, zone)) if !item.trim().is_empty() && !zone.trim().is_empty() => parsed
                .values
                .push((item.trim().to_string(), zone.trim().to_string())),
            _ => parsed.rejected.push(pair.to_string()),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionType, choices: &str, correct: &str) -> Question {
        Question {
            id: "q".into(),
            kind,
            prompt: String::new(),
            choices: choices.into(),
            correct_answer: correct.into(),
            points: None,
            tags: vec![],
            explanation: None,
        }
    }

    fn choice_key(q: &Question) -> ChoiceKey {
        match parse_question(q).unwrap().key {
            AnswerKey::Choice(k) => k,
            other => panic!("expected choice key, got {other:?}"),
        }
    }

    #[test]
    fn split_list_handles_pipes_and_newlines() {
        assert_eq!(split_list(" a | b\nc ||\n"), vec!["a", "b", "c"]);
        assert!(split_list("   ").is_empty());
    }

    #[test]
    fn choice_resolves_text_letter_and_index() {
        let q = question(QuestionType::MultipleChoice, "Paris|London|Berlin", "paris|C|2");
        let key = choice_key(&q);
        assert_eq!(key.correct, BTreeSet::from([0, 1, 2]));
        assert!(key.is_multi());
        assert_eq!(key.resolve("d"), None);
        assert_eq!(key.resolve("4"), None);
    }

    #[test]
    fn choice_text_wins_over_letter() {
        let q = question(QuestionType::MultipleChoice, "B|A", "A");
        assert_eq!(choice_key(&q).correct, BTreeSet::from([1]));
    }

    #[test]
    fn choice_unknown_reference_is_an_error() {
        let q = question(QuestionType::MultipleChoice, "Paris|London", "Lyon");
        assert!(matches!(
            parse_question(&q),
            Err(PayloadError::UnknownChoice { reference, .. }) if reference == "Lyon"
        ));
    }

    #[test]
    fn choice_requires_options_and_key() {
        let q = question(QuestionType::MultipleChoice, "", "A");
        assert!(matches!(parse_question(&q), Err(PayloadError::NoChoices { .. })));
        let q = question(QuestionType::MultipleChoice, "x|y", " ");
        assert!(matches!(parse_question(&q), Err(PayloadError::NoCorrectAnswer { .. })));
    }

    #[test]
    fn true_false_defaults_choices() {
        let q = question(QuestionType::TrueFalse, "", "false");
        let key = choice_key(&q);
        assert_eq!(key.options, vec!["True", "False"]);
        assert_eq!(key.correct, BTreeSet::from([1]));
    }

    #[test]
    fn keywords_with_alternatives() {
        let q = question(QuestionType::ShortAnswer, "", "photosynthesis | chlorophyll/chloroplast");
        let parsed = parse_question(&q).unwrap();
        let AnswerKey::Keywords(key) = parsed.key else {
            panic!("expected keywords");
        };
        assert_eq!(key.keywords.len(), 2);
        assert_eq!(key.keywords[1].alternatives, vec!["chlorophyll", "chloroplast"]);
        assert_eq!(key.keywords[1].label(), "chlorophyll");
        assert_eq!(parsed.points, 1.0);
    }

    #[test]
    fn hotspot_shapes() {
        let q = question(
            QuestionType::Hotspot,
            "heart:50,50,10|lung:0,0,20,40|liver:100,100,140,100,120,140",
            "heart|LIVER",
        );
        let AnswerKey::Hotspot(key) = parse_question(&q).unwrap().key else {
            panic!("expected hotspot");
        };
        assert_eq!(key.regions.len(), 3);
        assert_eq!(key.correct, BTreeSet::from([0, 2]));
        assert!(matches!(key.regions[1].shape, Shape::Rect { .. }));
        assert!(matches!(key.regions[2].shape, Shape::Polygon { .. }));
    }

    #[test]
    fn hotspot_rejects_bad_regions() {
        let bad = [
            "heart:1,2",
            "heart:1,2,0",
            "heart:0,0,-1,5",
            "heart:a,b,c",
            ":1,2,3",
            "heart",
            "heart:1,2,3,4,5",
        ];
        for region in bad {
            let q = question(QuestionType::Hotspot, region, "heart");
            assert!(
                matches!(parse_question(&q), Err(PayloadError::InvalidRegion { .. })),
                "{region} should be rejected"
            );
        }
        let q = question(QuestionType::Hotspot, "a:1,1,1|A:2,2,2", "a");
        assert!(matches!(parse_question(&q), Err(PayloadError::InvalidRegion { .. })));
        let q = question(QuestionType::Hotspot, "a:1,1,1", "b");
        assert!(matches!(parse_question(&q), Err(PayloadError::UnknownRegion { .. })));
    }

    #[test]
    fn shape_containment() {
        let circle = Shape::Circle { cx: 0.0, cy: 0.0, r: 5.0 };
        assert!(circle.contains(Point { x: 3.0, y: 4.0 }));
        assert!(!circle.contains(Point { x: 4.0, y: 4.0 }));

        let rect = Shape::Rect { x: 0.0, y: 0.0, w: 10.0, h: 5.0 };
        assert!(rect.contains(Point { x: 10.0, y: 5.0 }));
        assert!(!rect.contains(Point { x: 10.1, y: 2.0 }));

        let triangle = Shape::Polygon {
            vertices: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 10.0, y: 0.0 },
                Point { x: 0.0, y: 10.0 },
            ],
        };
        assert!(triangle.contains(Point { x: 2.0, y: 2.0 }));
        assert!(!triangle.contains(Point { x: 8.0, y: 8.0 }));
    }

    #[test]
    fn drag_drop_with_explicit_choices() {
        let q = question(
            QuestionType::DragDrop,
            "apple|carrot|salmon|rock => Fruit|Vegetable|Fish",
            "apple=fruit|Carrot=Vegetable|salmon=Fish",
        );
        let AnswerKey::DragDrop(key) = parse_question(&q).unwrap().key else {
            panic!("expected drag drop");
        };
        assert_eq!(key.items.len(), 4);
        assert_eq!(key.pairs, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(key.zone_for(3), None);
        assert_eq!(key.item_index("ROCK"), Some(3));
    }

    #[test]
    fn drag_drop_derives_from_key() {
        let q = question(QuestionType::DragDrop, "", "a=X|b=Y|c=X");
        let AnswerKey::DragDrop(key) = parse_question(&q).unwrap().key else {
            panic!("expected drag drop");
        };
        assert_eq!(key.items, vec!["a", "b", "c"]);
        assert_eq!(key.zones, vec!["X", "Y"]);
        assert_eq!(key.pairs, vec![(0, 0), (1, 1), (2, 0)]);
    }

    #[test]
    fn drag_drop_errors() {
        let q = question(QuestionType::DragDrop, "a|b => X", "a=Y");
        assert!(matches!(parse_question(&q), Err(PayloadError::UnknownZone { .. })));
        let q = question(QuestionType::DragDrop, "a|b => X", "c=X");
        assert!(matches!(parse_question(&q), Err(PayloadError::UnknownItem { .. })));
        let q = question(QuestionType::DragDrop, "a|b => X", "a=X|a=X");
        assert!(matches!(parse_question(&q), Err(PayloadError::DuplicateItem { .. })));
        let q = question(QuestionType::DragDrop, "a|b => X", "a X");
        assert!(matches!(parse_question(&q), Err(PayloadError::MalformedPair { .. })));
    }

    #[test]
    fn essay_rubric_sets_points() {
        let q = question(QuestionType::Essay, "Thesis:4|Evidence:4|Mechanics:2", "");
        let parsed = parse_question(&q).unwrap();
        assert_eq!(parsed.points, 10.0);
        let AnswerKey::Rubric(rubric) = parsed.key else {
            panic!("expected rubric");
        };
        assert_eq!(rubric.criterion("evidence").map(|c| c.max), Some(4.0));
    }

    #[test]
    fn essay_without_rubric_gets_overall() {
        let mut q = question(QuestionType::Essay, "", "");
        q.points = Some(5.0);
        let parsed = parse_question(&q).unwrap();
        let AnswerKey::Rubric(rubric) = parsed.key else {
            panic!("expected rubric");
        };
        assert_eq!(rubric.criteria.len(), 1);
        assert_eq!(rubric.criteria[0].name, OVERALL_CRITERION);
        assert_eq!(rubric.total(), 5.0);
    }

    #[test]
    fn essay_rejects_bad_criteria() {
        let q = question(QuestionType::Essay, "Thesis:zero", "");
        assert!(matches!(parse_question(&q), Err(PayloadError::InvalidRubric { .. })));
        let q = question(QuestionType::Essay, "Thesis:-2", "");
        assert!(matches!(parse_question(&q), Err(PayloadError::InvalidRubric { .. })));
    }

    #[test]
    fn negative_points_rejected() {
        let mut q = question(QuestionType::ShortAnswer, "", "x");
        q.points = Some(-1.0);
        assert!(matches!(parse_question(&q), Err(PayloadError::InvalidPoints { .. })));
    }

    #[test]
    fn parse_test_rejects_duplicate_ids() {
        let q = question(QuestionType::ShortAnswer, "", "x");
        let test = TestDefinition {
            id: "t".into(),
            title: "T".into(),
            description: String::new(),
            passing_score: None,
            partial_credit: None,
            questions: vec![q.clone(), q],
        };
        assert_eq!(
            parse_test(&test).unwrap_err(),
            PayloadError::DuplicateQuestion("q".into())
        );
    }

    #[test]
    fn student_answer_parsers() {
        let key = ChoiceKey {
            options: vec!["x".into(), "y".into()],
            correct: BTreeSet::from([0]),
        };
        let sel = parse_selection(&key, "x|A|z");
        assert_eq!(sel.values, vec![0]);
        assert_eq!(sel.rejected, vec!["z"]);

        let clicks = parse_clicks("1,2| 3.5 , 4 |oops|5");
        assert_eq!(
            clicks.values,
            vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.5, y: 4.0 }]
        );
        assert_eq!(clicks.rejected, vec!["oops", "5"]);

        let placed = parse_placements("a = X|b|=Y");
        assert_eq!(placed.values, vec![("a".to_string(), "X".to_string())]);
        assert_eq!(placed.rejected, vec!["b", "=Y"]);
    }

    #[test]
    fn empty_click_answer_has_no_points() {
        let clicks = parse_clicks("");
        assert_eq!(clicks, ParsedAnswer::<Point>::default());
        assert!(clicks.values.is_empty());
        assert!(clicks.rejected.is_empty());
    }
}
