//! JSON-backed question bank

use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Question;

/// The full, ordered collection of known questions, stored as one JSON array.
///
/// Writes always replace the whole file. Nothing deduplicates: generating
/// twice for the same topic appends near-duplicates.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    path: PathBuf,
}

impl QuestionBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means an empty bank. A file that is not a JSON array is
    /// an error, so a later rewrite cannot clobber it. Records that do not
    /// normalize into a question are skipped with a warning.
    pub fn load(&self) -> Result<Vec<Question>> {
        let records = self.load_records()?;
        let total = records.len();

        let questions: Vec<Question> = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| match serde_json::from_value::<Question>(record) {
                Ok(q) => Some(q),
                Err(e) => {
                    tracing::warn!("Skipping bank record {} in {}: {}", i, self.path.display(), e);
                    None
                }
            })
            .collect();

        tracing::debug!("Loaded {} of {} bank records from {}", questions.len(), total, self.path.display());
        Ok(questions)
    }

    /// Stored records as they are on disk, unusable ones included.
    fn load_records(&self) -> Result<Vec<Value>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, questions: &[Question]) -> Result<()> {
        write_json_pretty(&self.path, &questions)?;
        tracing::debug!("Wrote {} questions to {}", questions.len(), self.path.display());
        Ok(())
    }

    /// Appends to the stored bank and returns the new record count.
    ///
    /// Existing records are written back untouched, including any that
    /// `load` skips, so a fix to the file by hand is never lost.
    pub fn append(&self, new_questions: &[Question]) -> Result<usize> {
        let mut records = self.load_records()?;
        for q in new_questions {
            records.push(serde_json::to_value(q)?);
        }
        write_json_pretty(&self.path, &records)?;
        tracing::debug!("Appended {} questions to {}", new_questions.len(), self.path.display());
        Ok(records.len())
    }
}

/// First `limit` questions matching topic and difficulty, in bank order.
pub fn filter_questions(bank: &[Question], topic: &str, difficulty: &str, limit: usize) -> Vec<Question> {
    bank.iter()
        .filter(|q| q.matches(topic, difficulty))
        .take(limit)
        .cloned()
        .collect()
}

/// Pretty-printed JSON, creating parent directories as needed.
pub(crate) fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
