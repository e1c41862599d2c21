//! Offline batch conversion: exam PDFs to per-file CSVs, and CSV merging

use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Question;
use crate::pdf::{extract_text, parse_mcqs};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Per-PDF outcome of [`convert_pdf_dir`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPdf {
    pub source: PathBuf,
    pub csv_path: PathBuf,
    pub topic: String,
    pub rows: usize,
    pub rejected: usize,
}

#[derive(Serialize)]
struct QuestionRow<'a> {
    topic: &'a str,
    year: Option<i32>,
    question: &'a str,
    option_a: &'a str,
    option_b: &'a str,
    option_c: &'a str,
    option_d: &'a str,
    correct_answer: &'a str,
}

impl<'a> From<&'a Question> for QuestionRow<'a> {
    fn from(q: &'a Question) -> Self {
        Self {
            topic: &q.topic,
            year: q.year,
            question: &q.question,
            option_a: &q.options.a,
            option_b: &q.options.b,
            option_c: &q.options.c,
            option_d: &q.options.d,
            correct_answer: q.correct_answer.as_str(),
        }
    }
}

/// `medieval_history.pdf` -> `Medieval History`
pub fn topic_from_filename(path: impl AsRef<Path>) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .replace('_', " ");

    let mut topic = String::with_capacity(stem.len());
    let mut prev_is_letter = false;
    for ch in stem.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                topic.extend(ch.to_lowercase());
            } else {
                topic.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            topic.push(ch);
            prev_is_letter = false;
        }
    }
    topic
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, ext))
        .collect();
    files.sort();
    Ok(files)
}

/// Write questions in the flat CSV layout, UTF-8 with BOM.
pub fn write_questions_csv(path: &Path, questions: &[Question]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    if questions.is_empty() {
        writer.write_record([
            "topic",
            "year",
            "question",
            "option_a",
            "option_b",
            "option_c",
            "option_d",
            "correct_answer",
        ])?;
    }
    for q in questions {
        writer.serialize(QuestionRow::from(q))?;
    }
    writer.flush()?;
    Ok(())
}

/// Convert every PDF in `src_dir` into `<out_dir>/<stem>.csv`, using the file
/// name as topic.
pub fn convert_pdf_dir(src_dir: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<Vec<ConvertedPdf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let mut converted = Vec::new();
    for pdf_path in files_with_extension(src_dir.as_ref(), "pdf")? {
        tracing::info!("Processing: {}", pdf_path.display());

        let topic = topic_from_filename(&pdf_path);
        let text = extract_text(&pdf_path);
        let report = parse_mcqs(&text, &topic);

        let stem = pdf_path.file_stem().and_then(|s| s.to_str()).unwrap_or("questions");
        let csv_path = out_dir.join(format!("{}.csv", stem));
        write_questions_csv(&csv_path, &report.questions)?;

        tracing::info!(
            "Saved {} | rows: {}, rejected blocks: {}",
            csv_path.display(),
            report.questions.len(),
            report.rejected.len()
        );

        converted.push(ConvertedPdf {
            source: pdf_path,
            csv_path,
            topic,
            rows: report.questions.len(),
            rejected: report.rejected.len(),
        });
    }

    Ok(converted)
}

/// Concatenate every CSV in `dir` (except `master` itself) into `master`.
///
/// Columns are aligned by header name; the master header is the union of all
/// headers in first-seen order. Files that cannot be read are skipped.
/// Returns the number of data rows written.
pub fn merge_csv_dir(dir: impl AsRef<Path>, master: impl AsRef<Path>) -> Result<usize> {
    let master = master.as_ref();
    let master_key = canonical_target(master);

    let mut columns: Vec<String> = Vec::new();
    let mut tables: Vec<(Vec<String>, Vec<csv::StringRecord>)> = Vec::new();

    for path in files_with_extension(dir.as_ref(), "csv")? {
        if fs::canonicalize(&path).is_ok_and(|p| p == master_key) {
            continue;
        }
        match read_table(&path) {
            Ok((headers, records)) => {
                for h in &headers {
                    if !columns.contains(h) {
                        columns.push(h.clone());
                    }
                }
                tables.push((headers, records));
            }
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let mut file = File::create(master)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&columns)?;

    let mut total = 0;
    for (headers, records) in &tables {
        let position: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h.as_str(), i)).collect();
        for record in records {
            let row: Vec<&str> = columns
                .iter()
                .map(|c| position.get(c.as_str()).and_then(|&i| record.get(i)).unwrap_or(""))
                .collect();
            writer.write_record(&row)?;
            total += 1;
        }
    }
    writer.flush()?;

    tracing::info!("Master CSV saved: {} ({} rows)", master.display(), total);
    Ok(total)
}

/// Canonical form of a path that may not exist yet: its parent is resolved
/// and the file name joined back on.
fn canonical_target(path: &Path) -> PathBuf {
    if let Ok(p) = fs::canonicalize(path) {
        return p;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn read_table(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parse_question_file;
    use crate::models::{AnswerLetter, QuestionOptions};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("convert_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn topic_is_title_cased_file_stem() {
        assert_eq!(topic_from_filename("data/raw/pdf/medieval_history.pdf"), "Medieval History");
        assert_eq!(topic_from_filename("POLITY.pdf"), "Polity");
        assert_eq!(topic_from_filename("art_and_culture_2.PDF"), "Art And Culture 2");
    }

    #[test]
    fn questions_csv_can_be_imported_back() {
        let dir = temp_dir();
        let path = dir.join("polity.csv");
        let questions = vec![Question {
            topic: "Polity".into(),
            year: Some(2018),
            difficulty: String::new(),
            question: "Who is the ex-officio chairman of the Rajya Sabha?".into(),
            options: QuestionOptions::new("President", "Vice-President", "Speaker", "PM"),
            correct_answer: AnswerLetter::B,
            explanation: None,
        }];

        write_questions_csv(&path, &questions).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let report = parse_question_file(&path).unwrap();
        assert_eq!(report.questions, questions);
    }

    #[test]
    fn merge_aligns_columns_and_skips_master() {
        let dir = temp_dir();
        fs::write(dir.join("a.csv"), "topic,question\nPolity,Q1\nPolity,Q2\n").unwrap();
        fs::write(dir.join("b.csv"), "question,topic,year\nQ3,Geography,2020\n").unwrap();
        let master = dir.join("master.csv");
        fs::write(&master, "stale,data\n1,2\n").unwrap();

        let rows = merge_csv_dir(&dir, &master).unwrap();
        assert_eq!(rows, 3);

        let content = fs::read_to_string(&master).unwrap();
        let content = content.trim_start_matches('\u{feff}');
        assert_eq!(content, "topic,question,year\nPolity,Q1,\nPolity,Q2,\nGeography,Q3,2020\n");
    }

    #[test]
    fn master_spelled_differently_is_still_skipped() {
        let dir = temp_dir();
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.csv"), "topic,question\nPolity,Q1\n").unwrap();
        let master = dir.join("sub").join("..").join("master.csv");

        let counts: Vec<usize> = (0..3).map(|_| merge_csv_dir(&dir, &master).unwrap()).collect();
        assert_eq!(counts, vec![1, 1, 1]);

        let content = fs::read_to_string(dir.join("master.csv")).unwrap();
        assert_eq!(content.trim_start_matches('\u{feff}'), "topic,question\nPolity,Q1\n");
    }

    #[test]
    fn empty_pdf_dir_converts_nothing() {
        let src = temp_dir();
        let out = temp_dir();
        fs::write(src.join("notes.txt"), "not a pdf").unwrap();
        assert!(convert_pdf_dir(&src, &out).unwrap().is_empty());
    }
}
