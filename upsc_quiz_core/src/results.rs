//! Quiz result storage - SQLite table plus one CSV per attempt

#[cfg(feature = "python")]
use pyo3::prelude::*;
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One completed (or abandoned) quiz. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub user_id: String,
    pub topic: String,
    pub difficulty: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedResult {
    pub record: ResultRecord,
    pub csv_path: PathBuf,
}

/// A row of a user's history, newest first when loaded.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub topic: String,
    pub difficulty: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
}

/// `score / total * 100` rounded to two decimals; zero for an empty quiz.
pub fn percentage(score: u32, total_questions: u32) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let raw = f64::from(score) / f64::from(total_questions) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// `<user>_<topic>_<difficulty>_<YYYY-MM-DD>.csv` with spaces replaced.
/// Same user, topic and difficulty on the same day share a file.
pub fn result_file_name(user_id: &str, topic: &str, difficulty: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}_{}.csv",
        user_id.replace(' ', "_"),
        topic.replace(' ', "_"),
        difficulty.replace(' ', "_"),
        date.format("%Y-%m-%d")
    )
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    db_path: PathBuf,
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(db_path: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            results_dir: results_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.db_path, &config.results_dir)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Create folders and the results table if not present.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.results_dir)?;
        self.open()?;
        Ok(())
    }

    /// Opens a fresh connection with the schema in place.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS quiz_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                topic TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                score INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                percentage REAL NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;
        Ok(conn)
    }

    /// Save one quiz attempt to SQLite and its own CSV file.
    pub fn save_result(
        &self,
        user_id: &str,
        topic: &str,
        difficulty: &str,
        score: u32,
        total_questions: u32,
    ) -> Result<SavedResult> {
        self.save_result_at(user_id, topic, difficulty, score, total_questions, Local::now().naive_local())
    }

    /// [`save_result`](Self::save_result) with an explicit clock.
    pub fn save_result_at(
        &self,
        user_id: &str,
        topic: &str,
        difficulty: &str,
        score: u32,
        total_questions: u32,
        now: NaiveDateTime,
    ) -> Result<SavedResult> {
        let record = ResultRecord {
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            difficulty: difficulty.to_string(),
            score,
            total_questions,
            percentage: percentage(score, total_questions),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO quiz_results (user_id, topic, difficulty, score, total_questions, percentage, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.user_id,
                record.topic,
                record.difficulty,
                record.score,
                record.total_questions,
                record.percentage,
                record.timestamp
            ],
        )?;

        fs::create_dir_all(&self.results_dir)?;
        let csv_path = self
            .results_dir
            .join(result_file_name(user_id, topic, difficulty, now.date()));
        write_result_csv(&csv_path, &record)?;

        tracing::info!(
            "Saved result for {}: {}/{} ({}%) -> {}",
            record.user_id,
            record.score,
            record.total_questions,
            record.percentage,
            csv_path.display()
        );

        Ok(SavedResult { record, csv_path })
    }

    /// All attempts by `user_id`, newest first. No database yet means no history.
    pub fn load_user_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        if !self.db_path.exists() {
            return Ok(Vec::new());
        }

        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, topic, difficulty, score, total_questions, percentage
             FROM quiz_results
             WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(HistoryEntry {
                timestamp: row.get(0)?,
                topic: row.get(1)?,
                difficulty: row.get(2)?,
                score: row.get(3)?,
                total_questions: row.get(4)?,
                percentage: row.get(5)?,
            })
        })?;

        let history = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(history)
    }
}

/// UTF-8 with BOM, header row, one data row. Overwrites.
fn write_result_csv(path: &Path, record: &ResultRecord) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "save_result")]
pub fn py_save_result(
    user_id: &str,
    topic: &str,
    difficulty: &str,
    score: u32,
    total_questions: u32,
) -> PyResult<(f64, String)> {
    let store = ResultStore::from_config(&Config::from_env());
    let saved = store.save_result(user_id, topic, difficulty, score, total_questions)?;
    Ok((saved.record.percentage, saved.csv_path.display().to_string()))
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "load_user_history")]
pub fn py_load_user_history(user_id: &str) -> PyResult<Vec<HistoryEntry>> {
    let store = ResultStore::from_config(&Config::from_env());
    Ok(store.load_user_history(user_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(8, 10), 80.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(7, 7), 100.0);
    }

    #[test]
    fn percentage_of_empty_quiz_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn file_name_replaces_spaces() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            result_file_name("student 1", "Modern History", "hard", date),
            "student_1_Modern_History_hard_2024-03-09.csv"
        );
    }

    #[test]
    fn history_without_database_is_empty() {
        let root = std::env::temp_dir().join(format!("results_test_{}", uuid::Uuid::new_v4()));
        let store = ResultStore::new(root.join("db.sqlite"), root.join("results"));
        assert!(store.load_user_history("nobody").unwrap().is_empty());
        assert!(!store.db_path().exists());
    }
}
