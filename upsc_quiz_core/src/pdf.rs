//! Mining multiple-choice questions out of exam PDFs
//!
//! Text comes from the PDF text layer only; scanned pages produce nothing.
//! Segmentation is heuristic: questions are delimited by their
//! "Correct answer" lines, options by `(a)`-style markers.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::models::{AnswerLetter, Question, QuestionOptions};

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20(?:1[4-9]|2[0-3]))\b").unwrap());

static ANSWER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Correct answer[:\-]?\s*([a-dA-D])").unwrap());

static QUESTION_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Q\d+\.").unwrap());

static QUESTION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^Q\d+\.\s*(.*)").unwrap());

/// `(a)`, `a)`, `( a )` in any case, one pattern per letter.
static OPTION_MARKERS: Lazy<Vec<(AnswerLetter, Regex)>> = Lazy::new(|| {
    AnswerLetter::ALL
        .iter()
        .map(|l| (*l, Regex::new(&format!(r"(?i)\(?\s*{}\s*\)", l.as_str())).unwrap()))
        .collect()
});

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"###OPT_[a-d]###").unwrap());

/// Text layer of every page, each page preceded by a newline. Pages without
/// text are skipped; an unreadable document gives an empty string.
pub fn extract_text(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Cannot open PDF {}: {}", path.display(), e);
            return String::new();
        }
    };

    let mut full_text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                full_text.push('\n');
                full_text.push_str(&text);
            }
            Ok(_) => tracing::debug!("Page {} of {} has no text layer", page_number, path.display()),
            Err(e) => tracing::debug!("Skipping page {} of {}: {}", page_number, path.display(), e),
        }
    }

    full_text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace between two answer markers.
    Empty,
    /// Option markers split the block into this many options instead of four.
    OptionCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// Position of the block among all answer-delimited blocks.
    pub index: usize,
    pub answer: AnswerLetter,
    pub reason: RejectReason,
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub questions: Vec<Question>,
    pub rejected: Vec<RejectedBlock>,
}

/// Year tokens with their byte offsets, in text order.
fn year_timeline(text: &str) -> Vec<(usize, i32)> {
    YEAR_PATTERN
        .captures_iter(text)
        .filter_map(|c| {
            let m = c.get(1)?;
            Some((m.start(), m.as_str().parse().ok()?))
        })
        .collect()
}

/// Latest year heading at or before `offset`.
fn year_at(timeline: &[(usize, i32)], offset: usize) -> Option<i32> {
    let idx = timeline.partition_point(|(pos, _)| *pos <= offset);
    idx.checked_sub(1).map(|i| timeline[i].1)
}

fn clean_segment(s: &str) -> String {
    s.lines()
        .map(|line| line.trim().trim_start_matches('(').trim_end_matches('(').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_block(block: &str) -> Result<(String, QuestionOptions), RejectReason> {
    let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(RejectReason::Empty);
    }

    // Drop running headers and anything else before the numbered question
    let q_start = lines.iter().position(|l| QUESTION_LINE.is_match(l)).unwrap_or(0);
    let mut joined = lines[q_start..].join("\n");

    for (letter, marker) in OPTION_MARKERS.iter() {
        let placeholder = format!("###OPT_{}###", letter.as_str());
        joined = marker.replace_all(&joined, placeholder.as_str()).into_owned();
    }

    let parts: Vec<&str> = PLACEHOLDER.split(&joined).collect();
    if parts.len() != 5 {
        return Err(RejectReason::OptionCount(parts.len() - 1));
    }

    let stem_raw = parts[0].trim();
    let stem = match QUESTION_PREFIX.captures(stem_raw).and_then(|c| c.get(1)) {
        Some(rest) => clean_segment(rest.as_str()),
        None => clean_segment(stem_raw),
    };

    let options = QuestionOptions {
        a: clean_segment(parts[1]),
        b: clean_segment(parts[2]),
        c: clean_segment(parts[3]),
        d: clean_segment(parts[4]),
    };

    Ok((stem, options))
}

/// Split extracted exam text into four-option questions.
///
/// Each question block ends at a `Correct answer: <letter>` marker; text after
/// the last marker is ignored. A block is attributed to the latest 2014–2023
/// year token found at or before the block's start. Blocks that do not split
/// into a stem and exactly four options are reported in
/// [`ParseReport::rejected`].
pub fn parse_mcqs(text: &str, topic: &str) -> ParseReport {
    let timeline = year_timeline(text);
    let mut report = ParseReport::default();
    let mut block_start = 0;

    for (index, caps) in ANSWER_MARKER.captures_iter(text).enumerate() {
        let (Some(marker), Some(letter)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let block = &text[block_start..marker.start()];
        let year = year_at(&timeline, block_start);
        block_start = marker.end();

        let Some(answer) = AnswerLetter::parse(letter.as_str()) else {
            continue;
        };

        match parse_block(block) {
            Ok((stem, options)) => report.questions.push(Question {
                topic: topic.to_string(),
                year,
                difficulty: String::new(),
                question: stem,
                options,
                correct_answer: answer,
                explanation: None,
            }),
            Err(reason) => {
                tracing::debug!("Rejected block {} (answer {}): {:?}", index, answer, reason);
                report.rejected.push(RejectedBlock { index, answer, reason });
            }
        }
    }

    report
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "extract_text")]
pub fn py_extract_text(pdf_path: &str) -> String {
    extract_text(pdf_path)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "parse_mcqs")]
pub fn py_parse_mcqs(text: &str, topic: &str) -> (Vec<Question>, usize) {
    let report = parse_mcqs(text, topic);
    let rejected = report.rejected.len();
    (report.questions, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2019 Prelims\n\
        Running header\n\
        Q1. Which article abolishes untouchability?\n\
        (a) Article 14\n\
        (b) Article 17\n\
        (c) Article 21\n\
        (d) Article 32\n\
        Correct answer: b\n\
        2020 Prelims\n\
        Q2. Only two options here?\n\
        (a) Yes\n\
        (b) No\n\
        Correct answer: a\n\
        Q3. Largest river island?\n\
        a) Majuli\n\
        ( b ) Sriharikota\n\
        (C) Diu\n\
        d) Havelock\n\
        Correct answer:D\n\
        Page 4 footer";

    #[test]
    fn parses_well_formed_blocks_and_reports_the_rest() {
        let report = parse_mcqs(SAMPLE, "Polity");

        assert_eq!(report.questions.len(), 2);

        let q1 = &report.questions[0];
        assert_eq!(q1.topic, "Polity");
        assert_eq!(q1.question, "Which article abolishes untouchability?");
        assert_eq!(q1.options, QuestionOptions::new("Article 14", "Article 17", "Article 21", "Article 32"));
        assert_eq!(q1.correct_answer, AnswerLetter::B);
        assert_eq!(q1.difficulty, "");

        let q3 = &report.questions[1];
        assert_eq!(q3.question, "Largest river island?");
        assert_eq!(q3.options, QuestionOptions::new("Majuli", "Sriharikota", "Diu", "Havelock"));
        assert_eq!(q3.correct_answer, AnswerLetter::D);

        assert_eq!(
            report.rejected,
            vec![RejectedBlock { index: 1, answer: AnswerLetter::A, reason: RejectReason::OptionCount(2) }]
        );
    }

    #[test]
    fn year_is_latest_heading_before_block_start() {
        let report = parse_mcqs(SAMPLE, "Polity");
        // Q1's block starts at the 2019 heading; the 2020 heading sits inside
        // Q2's block, so it first applies to Q3.
        assert_eq!(report.questions[0].year, Some(2019));
        assert_eq!(report.questions[1].year, Some(2020));
    }

    #[test]
    fn years_outside_range_are_ignored() {
        let timeline = year_timeline("2013 then 2014, 2023 and 2024 or 120190");
        let years: Vec<i32> = timeline.iter().map(|(_, y)| *y).collect();
        assert_eq!(years, vec![2014, 2023]);
        assert_eq!(year_at(&timeline, 0), None);
    }

    #[test]
    fn preamble_without_question_number_is_kept() {
        let text = "Who wrote Gitanjali?\n(a) Tagore\n(b) Premchand\n(c) Kalidasa\n(d) Tulsidas\nCorrect answer-a";
        let report = parse_mcqs(text, "Culture");
        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].question, "Who wrote Gitanjali?");
        assert_eq!(report.questions[0].year, None);
    }

    #[test]
    fn three_options_are_dropped_not_crashed() {
        let text = "Q7. Pick one\n(a) Red\n(b) Green\n(c) Blue\nCorrect answer: c\n";
        let report = parse_mcqs(text, "Misc");
        assert!(report.questions.is_empty());
        assert_eq!(report.rejected[0].reason, RejectReason::OptionCount(3));
    }

    #[test]
    fn blank_block_is_rejected_as_empty() {
        let report = parse_mcqs("Correct answer: a\n   \nCorrect answer: b", "Misc");
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[1].reason, RejectReason::Empty);
    }

    #[test]
    fn text_without_markers_yields_nothing() {
        assert_eq!(parse_mcqs("Just some prose about 2019.", "Misc"), ParseReport::default());
    }

    /// Pages with `Some(text)` get one line of Courier text; `None` pages have
    /// no content stream at all.
    fn write_pdf(pages: &[Option<&str>]) -> std::path::PathBuf {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for page in pages {
            let mut page_dict = dictionary! { "Type" => "Page", "Parent" => pages_id };
            if let Some(text) = page {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![72.into(), 700.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                page_dict.set("Contents", content_id);
            }
            kids.push(Object::from(doc.add_object(page_dict)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let path = std::env::temp_dir().join(format!("pdf_test_{}.pdf", uuid::Uuid::new_v4()));
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn pages_are_joined_in_order_and_blank_pages_skipped() {
        let path = write_pdf(&[Some("First page"), None, Some("Third page")]);
        assert_eq!(extract_text(&path), "\nFirst page\n\nThird page\n");
    }

    #[test]
    fn missing_pdf_gives_empty_text() {
        assert_eq!(extract_text("/definitely/not/here.pdf"), "");
    }
}
