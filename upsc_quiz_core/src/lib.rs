//! UPSC Quiz Core - question sourcing, PDF mining and result storage
//!
//! Quizzes are assembled from a per-request cache, a JSON question bank and,
//! when the bank runs short, an LLM-backed generator. Exam PDFs are mined
//! into the bank offline. Results go to SQLite and per-attempt CSV files.

pub mod bank;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod fuzzy;
pub mod generator;
pub mod import;
pub mod models;
pub mod pdf;
pub mod results;
pub mod selector;
pub mod session;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use bank::{filter_questions, QuestionBank};
pub use cache::{cache_file_name, QuizCache};
pub use config::Config;
pub use convert::{convert_pdf_dir, merge_csv_dir, topic_from_filename};
pub use error::QuizError;
pub use generator::{build_prompt, GroqGenerator, QuestionGenerator};
pub use import::{build_bank, parse_question_file, ImportReport};
pub use models::{AnswerLetter, Difficulty, Question, QuestionOptions};
pub use pdf::{extract_text, parse_mcqs, ParseReport, RejectReason, RejectedBlock};
pub use results::{percentage, HistoryEntry, ResultRecord, ResultStore, SavedResult};
pub use selector::{QuizSelector, Selection};
pub use session::{QuizAttempt, RecordedAnswer};

/// UPSC Quiz Python module
#[cfg(feature = "python")]
#[pymodule]
fn upsc_quiz_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    // Quiz selection
    m.add_function(wrap_pyfunction!(selector::py_select_questions_for_quiz, m)?)?;

    // Results
    m.add_function(wrap_pyfunction!(results::py_save_result, m)?)?;
    m.add_function(wrap_pyfunction!(results::py_load_user_history, m)?)?;

    // PDF mining
    m.add_function(wrap_pyfunction!(pdf::py_extract_text, m)?)?;
    m.add_function(wrap_pyfunction!(pdf::py_parse_mcqs, m)?)?;

    // Register classes
    m.add_class::<models::Question>()?;
    m.add_class::<results::HistoryEntry>()?;

    Ok(())
}
