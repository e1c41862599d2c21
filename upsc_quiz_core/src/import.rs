//! Question import from CSV or Excel into the bank

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;

use crate::bank::QuestionBank;
use crate::error::{QuizError, Result};
use crate::models::{Question, RawQuestion};

/// Questions read from a file, plus how many rows could not be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub questions: Vec<Question>,
    pub skipped: usize,
}

/// Dispatch on extension: `.csv`, or `.xlsx` / `.xls` (first sheet).
pub fn parse_question_file(path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => parse_csv(path),
        "xlsx" | "xls" => parse_excel(path),
        _ => Err(QuizError::InvalidInput(format!("Unsupported file format: .{}", extension))),
    }
}

/// Replace the bank with the questions in `input`. Returns the import report.
pub fn build_bank(input: impl AsRef<Path>, bank: &QuestionBank) -> Result<ImportReport> {
    let report = parse_question_file(input.as_ref())?;
    bank.save(&report.questions)?;
    tracing::info!(
        "Bank rebuilt at {}: {} questions ({} rows skipped)",
        bank.path().display(),
        report.questions.len(),
        report.skipped
    );
    Ok(report)
}

/// Column index mapping
#[derive(Debug, Default, Clone)]
struct ColumnMapping {
    topic: Option<usize>,
    year: Option<usize>,
    difficulty: Option<usize>,
    question: usize,
    options: [usize; 4],
    answer: usize,
    explanation: Option<usize>,
}

/// Detect column indices from header names
fn detect_columns(headers: &[String]) -> Result<ColumnMapping> {
    let mut topic = None;
    let mut year = None;
    let mut difficulty = None;
    let mut question = None;
    let mut options: [Option<usize>; 4] = [None; 4];
    let mut answer = None;
    let mut explanation = None;

    for (i, header) in headers.iter().enumerate() {
        match header.trim_start_matches('\u{feff}').trim().to_lowercase().as_str() {
            "topic" | "subject" => topic = Some(i),
            "year" => year = Some(i),
            "difficulty" | "level" => difficulty = Some(i),
            "question" | "question_text" => question = Some(i),
            "option_a" | "a" => options[0] = Some(i),
            "option_b" | "b" => options[1] = Some(i),
            "option_c" | "c" => options[2] = Some(i),
            "option_d" | "d" => options[3] = Some(i),
            "correct_answer" | "answer" => answer = Some(i),
            "explanation" => explanation = Some(i),
            _ => {} // Unknown columns ignored
        }
    }

    let question = question.ok_or_else(|| QuizError::InvalidInput("Missing required 'question' column".to_string()))?;
    let answer = answer.ok_or_else(|| QuizError::InvalidInput("Missing required 'correct_answer' column".to_string()))?;
    let [Some(a), Some(b), Some(c), Some(d)] = options else {
        return Err(QuizError::InvalidInput(
            "Missing option columns (option_a .. option_d)".to_string(),
        ));
    };

    Ok(ColumnMapping {
        topic,
        year,
        difficulty,
        question,
        options: [a, b, c, d],
        answer,
        explanation,
    })
}

/// Build a question from one row, given a cell accessor.
fn row_to_question<F>(mapping: &ColumnMapping, cell: F) -> std::result::Result<Question, String>
where
    F: Fn(usize) -> String,
{
    let optional = |idx: Option<usize>| idx.map(&cell).filter(|s| !s.is_empty());

    let raw = RawQuestion {
        topic: optional(mapping.topic),
        year: optional(mapping.year).and_then(|y| {
            y.parse::<i32>()
                .ok()
                .or_else(|| y.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i32))
        }),
        difficulty: optional(mapping.difficulty),
        question: Some(cell(mapping.question)),
        options: None,
        option_a: Some(cell(mapping.options[0])),
        option_b: Some(cell(mapping.options[1])),
        option_c: Some(cell(mapping.options[2])),
        option_d: Some(cell(mapping.options[3])),
        correct_answer: optional(Some(mapping.answer)),
        explanation: optional(mapping.explanation),
    };

    Question::try_from(raw)
}

fn parse_csv(path: &Path) -> Result<ImportReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let mapping = detect_columns(&headers)?;

    let mut report = ImportReport::default();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        match row_to_question(&mapping, cell) {
            Ok(q) => report.questions.push(q),
            Err(e) => {
                tracing::warn!("Skipping row {} of {}: {}", line + 2, path.display(), e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

fn parse_excel(path: &Path) -> Result<ImportReport> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| QuizError::Spreadsheet(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| QuizError::Spreadsheet("No sheets found in Excel file".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| QuizError::Spreadsheet(format!("Failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| QuizError::Spreadsheet("Empty file - no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(get_cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let mut report = ImportReport::default();
    for (line, row) in rows.enumerate() {
        let cell = |i: usize| row.get(i).map(get_cell_string).unwrap_or_default();
        match row_to_question(&mapping, cell) {
            Ok(q) => report.questions.push(q),
            Err(e) => {
                tracing::warn!("Skipping row {} of {}: {}", line + 2, path.display(), e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Helper to extract string from Excel cell
fn get_cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}
