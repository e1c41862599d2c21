//! Question record and the value types around it

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::fuzzy::{resolve_answer_text, ANSWER_MATCH_THRESHOLD};

/// Requested difficulty of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// Canonical representation of a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 4] = [AnswerLetter::A, AnswerLetter::B, AnswerLetter::C, AnswerLetter::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerLetter::A => "a",
            AnswerLetter::B => "b",
            AnswerLetter::C => "c",
            AnswerLetter::D => "d",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Accepts `b`, `B`, `(b)`, `b)`, `b.` and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(|c| c == ')' || c == '.')
            .trim();

        let mut chars = inner.chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        match letter.to_ascii_lowercase() {
            'a' => Some(AnswerLetter::A),
            'b' => Some(AnswerLetter::B),
            'c' => Some(AnswerLetter::C),
            'd' => Some(AnswerLetter::D),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnswerLetter::parse(s).ok_or_else(|| format!("Not an option letter: '{}'", s))
    }
}

/// The four options of a question, keyed by letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl QuestionOptions {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>, d: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
            d: d.into(),
        }
    }

    /// Exactly four entries, in order.
    pub fn from_list(list: Vec<String>) -> Option<Self> {
        let [a, b, c, d]: [String; 4] = list.try_into().ok()?;
        Some(Self { a, b, c, d })
    }

    pub fn get(&self, letter: AnswerLetter) -> &str {
        match letter {
            AnswerLetter::A => &self.a,
            AnswerLetter::B => &self.b,
            AnswerLetter::C => &self.c,
            AnswerLetter::D => &self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnswerLetter, &str)> {
        AnswerLetter::ALL.into_iter().map(move |l| (l, self.get(l)))
    }

    pub fn to_vec(&self) -> Vec<String> {
        vec![self.a.clone(), self.b.clone(), self.c.clone(), self.d.clone()]
    }
}

/// A single multiple-choice question as stored in the bank and cache.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    pub topic: String,
    pub year: Option<i32>,
    /// Empty when unknown (PDF-mined questions carry no difficulty).
    pub difficulty: String,
    pub question: String,
    pub options: QuestionOptions,
    pub correct_answer: AnswerLetter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Case-insensitive match on topic and difficulty.
    pub fn matches(&self, topic: &str, difficulty: &str) -> bool {
        self.topic.trim().to_lowercase() == topic.trim().to_lowercase()
            && self.difficulty.trim().to_lowercase() == difficulty.trim().to_lowercase()
    }

    pub fn correct_text(&self) -> &str {
        self.options.get(self.correct_answer)
    }

    pub fn is_correct(&self, letter: AnswerLetter) -> bool {
        self.correct_answer == letter
    }
}

/// Loosely-typed question as it arrives from JSON files, spreadsheets or the
/// generation service. Converted into a [`Question`] by normalizing options
/// and the answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, alias = "question_text")]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<RawOptions>,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default, alias = "answer")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOptions {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl RawOptions {
    fn normalize(self) -> Result<QuestionOptions, String> {
        match self {
            RawOptions::List(list) => {
                let len = list.len();
                QuestionOptions::from_list(list).ok_or_else(|| format!("expected 4 options, got {}", len))
            }
            RawOptions::Map(map) => {
                if map.len() != 4 {
                    return Err(format!("expected 4 options, got {}", map.len()));
                }
                let mut slots: [Option<String>; 4] = Default::default();
                for (key, text) in map {
                    let letter = AnswerLetter::parse(&key)
                        .ok_or_else(|| format!("unexpected option key '{}'", key))?;
                    slots[letter.index()] = Some(text);
                }
                let [a, b, c, d] = slots;
                match (a, b, c, d) {
                    (Some(a), Some(b), Some(c), Some(d)) => Ok(QuestionOptions { a, b, c, d }),
                    _ => Err("options must be keyed a, b, c, d".to_string()),
                }
            }
        }
    }
}

impl TryFrom<RawQuestion> for Question {
    type Error = String;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let question = raw
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or("missing question text")?;

        let options = match raw.options {
            Some(options) => options.normalize()?,
            None => match (raw.option_a, raw.option_b, raw.option_c, raw.option_d) {
                (Some(a), Some(b), Some(c), Some(d)) => QuestionOptions { a, b, c, d },
                _ => return Err("missing options".to_string()),
            },
        };

        let answer = raw.correct_answer.ok_or("missing correct answer")?;
        let correct_answer = AnswerLetter::parse(&answer)
            .or_else(|| resolve_answer_text(&answer, &options, ANSWER_MATCH_THRESHOLD))
            .ok_or_else(|| format!("answer '{}' does not match any option", answer.trim()))?;

        Ok(Question {
            topic: raw.topic.unwrap_or_default().trim().to_string(),
            year: raw.year,
            difficulty: raw.difficulty.unwrap_or_default().trim().to_lowercase(),
            question,
            options,
            correct_answer,
            explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
        })
    }
}

/// Years show up as numbers, numeric strings ("2019", "2019.0"), empty
/// strings or null depending on which tool wrote the file.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i32))
        }
        _ => None,
    })
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl Question {
    #[getter]
    fn topic(&self) -> String {
        self.topic.clone()
    }

    #[getter]
    fn year(&self) -> Option<i32> {
        self.year
    }

    #[getter]
    fn difficulty(&self) -> String {
        self.difficulty.clone()
    }

    #[getter]
    fn question(&self) -> String {
        self.question.clone()
    }

    #[getter]
    fn options(&self) -> Vec<String> {
        self.options.to_vec()
    }

    #[getter]
    fn correct_answer(&self) -> String {
        self.correct_answer.as_str().to_string()
    }

    #[getter]
    fn explanation(&self) -> Option<String> {
        self.explanation.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "Question(topic='{}', difficulty='{}', question='{}...')",
            self.topic,
            self.difficulty,
            self.question.chars().take(40).collect::<String>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Question, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn answer_letter_accepts_common_spellings() {
        assert_eq!(AnswerLetter::parse("b"), Some(AnswerLetter::B));
        assert_eq!(AnswerLetter::parse(" C "), Some(AnswerLetter::C));
        assert_eq!(AnswerLetter::parse("(d)"), Some(AnswerLetter::D));
        assert_eq!(AnswerLetter::parse("a)"), Some(AnswerLetter::A));
        assert_eq!(AnswerLetter::parse("e"), None);
        assert_eq!(AnswerLetter::parse("Paris"), None);
        assert_eq!(AnswerLetter::parse(""), None);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("MEDIUM".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert_eq!(" easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn bank_record_with_option_map_and_letter_answer() {
        let q = parse(json!({
            "topic": "Polity",
            "year": 2019,
            "difficulty": "Medium",
            "question": "Which article abolishes untouchability?",
            "options": {"a": "Article 14", "b": "Article 17", "c": "Article 21", "d": "Article 32"},
            "correct_answer": "B"
        }))
        .unwrap();

        assert_eq!(q.difficulty, "medium");
        assert_eq!(q.year, Some(2019));
        assert_eq!(q.correct_answer, AnswerLetter::B);
        assert_eq!(q.correct_text(), "Article 17");
    }

    #[test]
    fn generated_record_with_option_list_and_text_answer() {
        let q = parse(json!({
            "question": "What is the capital of France?",
            "options": ["London", "Berlin", "Paris", "Madrid"],
            "correct_answer": "Paris"
        }))
        .unwrap();

        assert_eq!(q.correct_answer, AnswerLetter::C);
        assert_eq!(q.topic, "");
        assert_eq!(q.difficulty, "");
        assert_eq!(q.year, None);
    }

    #[test]
    fn flat_csv_shaped_record_with_float_year() {
        let q = parse(json!({
            "topic": "Geography",
            "year": 2021.0,
            "question": "Largest river island?",
            "option_a": "Majuli",
            "option_b": "Sriharikota",
            "option_c": "Diu",
            "option_d": "Havelock",
            "correct_answer": "a"
        }))
        .unwrap();

        assert_eq!(q.year, Some(2021));
        assert_eq!(q.options.a, "Majuli");
        assert_eq!(q.correct_answer, AnswerLetter::A);
    }

    #[test]
    fn three_options_are_rejected() {
        let err = parse(json!({
            "question": "Pick one",
            "options": ["x", "y", "z"],
            "correct_answer": "x"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("expected 4 options"));
    }

    #[test]
    fn answer_naming_no_numbered_option_is_rejected() {
        let result = parse(json!({
            "question": "Which article abolishes untouchability?",
            "options": ["Article 14", "Article 17", "Article 21", "Article 32"],
            "correct_answer": "Article 19"
        }));
        assert!(result.unwrap_err().to_string().contains("does not match any option"));
    }

    #[test]
    fn unmatched_answer_text_is_rejected() {
        let result = parse(json!({
            "question": "Pick one",
            "options": ["alpha", "beta", "gamma", "delta"],
            "correct_answer": "omega point"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_canonical_shape() {
        let q = Question {
            topic: "Polity".into(),
            year: None,
            difficulty: "easy".into(),
            question: "Q?".into(),
            options: QuestionOptions::new("w", "x", "y", "z"),
            correct_answer: AnswerLetter::D,
            explanation: None,
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["options"], json!({"a": "w", "b": "x", "c": "y", "d": "z"}));
        assert_eq!(value["correct_answer"], json!("d"));
        assert!(value.get("explanation").is_none());

        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn matches_ignores_case() {
        let q = Question {
            topic: "Polity".into(),
            year: None,
            difficulty: "medium".into(),
            question: "Q?".into(),
            options: QuestionOptions::default(),
            correct_answer: AnswerLetter::A,
            explanation: None,
        };
        assert!(q.matches("POLITY", "Medium"));
        assert!(q.matches("polity", "medium"));
        assert!(!q.matches("Geography", "medium"));
    }
}
