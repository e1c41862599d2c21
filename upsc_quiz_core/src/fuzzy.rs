//! Fuzzy matching of free-text answers against option text
//!
//! Generated questions name the correct option by its text, and that text
//! does not always match the option verbatim ("Paris." vs "Paris").

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::{AnswerLetter, QuestionOptions};

/// Minimum similarity for an answer text to be pinned to an option.
pub const ANSWER_MATCH_THRESHOLD: f64 = 0.9;

fn normalize(s: &str) -> String {
    s.trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_lowercase()
}

/// Similarity in `[0, 1]`; `1.0` for an exact case-insensitive match.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }

    // Jaro-Winkler is kinder to small typos, Levenshtein to length drift
    normalized_levenshtein(&a, &b) * 0.4 + jaro_winkler(&a, &b) * 0.6
}

/// Letter of the option `answer` names.
///
/// An exact match (case, surrounding whitespace and a trailing period
/// ignored) wins. Otherwise a single option must clear `threshold`; answers
/// containing digits never match fuzzily, since options such as
/// "Article 14" and "Article 17" differ only there.
pub fn resolve_answer_text(answer: &str, options: &QuestionOptions, threshold: f64) -> Option<AnswerLetter> {
    let wanted = normalize(answer);
    if wanted.is_empty() {
        return None;
    }

    if let Some((letter, _)) = options.iter().find(|(_, text)| normalize(text) == wanted) {
        return Some(letter);
    }

    if wanted.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut candidates = options
        .iter()
        .filter(|(_, text)| similarity(answer, text) >= threshold)
        .map(|(letter, _)| letter);

    match (candidates.next(), candidates.next()) {
        (Some(letter), None) => Some(letter),
        _ => None,
    }
}
