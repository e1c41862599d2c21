//! Process-wide configuration, loaded once at start-up

use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BANK_PATH: &str = "data/processed/questions_bank.json";
pub const DEFAULT_CACHE_DIR: &str = "cache/generated";
pub const DEFAULT_DB_PATH: &str = "data/db.sqlite";
pub const DEFAULT_RESULTS_DIR: &str = "data/results";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Immutable after construction; components clone what they need.
#[derive(Debug, Clone)]
pub struct Config {
    pub bank_path: PathBuf,
    pub cache_dir: PathBuf,
    pub db_path: PathBuf,
    pub results_dir: PathBuf,
    /// Absent key disables generation rather than failing.
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub groq_model: String,
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let groq_api_key = env::var("GROQ_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let request_timeout = env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self {
            bank_path: path_var("QUIZ_BANK_PATH", DEFAULT_BANK_PATH),
            cache_dir: path_var("QUIZ_CACHE_DIR", DEFAULT_CACHE_DIR),
            db_path: path_var("QUIZ_DB_PATH", DEFAULT_DB_PATH),
            results_dir: path_var("QUIZ_RESULTS_DIR", DEFAULT_RESULTS_DIR),
            groq_api_key,
            groq_api_url: env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_GROQ_API_URL.to_string()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            request_timeout,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Same defaults as `from_env`, but every data path rooted at `root`.
    /// Used by tests and by callers that keep all state under one directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            bank_path: root.join(DEFAULT_BANK_PATH),
            cache_dir: root.join(DEFAULT_CACHE_DIR),
            db_path: root.join(DEFAULT_DB_PATH),
            results_dir: root.join(DEFAULT_RESULTS_DIR),
            groq_api_key: None,
            groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            rust_log: "info".to_string(),
        }
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_root_places_all_state_under_root() {
        let config = Config::with_root("/tmp/quiz");
        assert_eq!(config.bank_path, PathBuf::from("/tmp/quiz/data/processed/questions_bank.json"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/quiz/cache/generated"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/quiz/data/db.sqlite"));
        assert_eq!(config.results_dir, PathBuf::from("/tmp/quiz/data/results"));
        assert!(config.groq_api_key.is_none());
    }
}
