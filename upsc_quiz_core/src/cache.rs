//! Per-request quiz snapshots

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::bank::write_json_pretty;
use crate::error::Result;
use crate::models::Question;

/// `<topic lowercase, spaces to underscores>_<difficulty lowercase>_<count>.json`
pub fn cache_file_name(topic: &str, difficulty: &str, count: usize) -> String {
    format!(
        "{}_{}_{}.json",
        topic.to_lowercase().replace(' ', "_"),
        difficulty.to_lowercase(),
        count
    )
}

/// One JSON file per (topic, difficulty, count). An entry, once written, is
/// returned as-is for that key no matter how the bank changes afterwards.
#[derive(Debug, Clone)]
pub struct QuizCache {
    dir: PathBuf,
}

impl QuizCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, topic: &str, difficulty: &str, count: usize) -> PathBuf {
        self.dir.join(cache_file_name(topic, difficulty, count))
    }

    /// Missing and unreadable entries are both a miss; the next save
    /// overwrites an unreadable one.
    pub fn load(&self, topic: &str, difficulty: &str, count: usize) -> Vec<Question> {
        let path = self.path_for(topic, difficulty, count);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Cannot open cache entry {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, topic: &str, difficulty: &str, count: usize, questions: &[Question]) -> Result<PathBuf> {
        let path = self.path_for(topic, difficulty, count);
        write_json_pretty(&path, questions)?;
        tracing::debug!("Cached {} questions at {}", questions.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerLetter, QuestionOptions};
    use std::fs;

    fn temp_cache() -> QuizCache {
        QuizCache::new(std::env::temp_dir().join(format!("cache_test_{}", uuid::Uuid::new_v4())))
    }

    #[test]
    fn file_name_is_derived_from_key() {
        assert_eq!(cache_file_name("Medieval History", "Hard", 15), "medieval_history_hard_15.json");
        assert_eq!(cache_file_name("Polity", "easy", 5), "polity_easy_5.json");
    }

    #[test]
    fn save_then_load_same_key() {
        let cache = temp_cache();
        let questions = vec![Question {
            topic: "Polity".into(),
            year: Some(2020),
            difficulty: "easy".into(),
            question: "Who appoints the CAG?".into(),
            options: QuestionOptions::new("President", "PM", "Parliament", "CJI"),
            correct_answer: AnswerLetter::A,
            explanation: Some("Article 148".into()),
        }];

        cache.save("Polity", "easy", 1, &questions).unwrap();

        assert_eq!(cache.load("polity", "EASY", 1), questions);
        assert!(cache.load("Polity", "easy", 2).is_empty());
    }

    #[test]
    fn unreadable_entry_is_a_miss() {
        let cache = temp_cache();
        let path = cache.path_for("Polity", "easy", 3);
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(&path, "[{\"broken\": ").unwrap();

        assert!(cache.load("Polity", "easy", 3).is_empty());
    }
}
