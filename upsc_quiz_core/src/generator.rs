//! Question generation through an OpenAI-compatible chat-completions service

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

use crate::config::Config;
use crate::models::{Difficulty, Question};

/// Source of fresh questions when the bank runs short.
///
/// Implementations never fail outward: anything that goes wrong yields an
/// empty vector.
pub trait QuestionGenerator {
    fn generate(&self, topic: &str, difficulty: Difficulty, count: usize) -> Vec<Question>;
}

/// Prompt sent to the service. Deterministic for a given input.
pub fn build_prompt(topic: &str, difficulty: Difficulty, count: usize) -> String {
    format!(
        "Generate {count} {difficulty} multiple-choice question about {topic}.\n\n\
         Return ONLY a JSON object with these exact fields:\n\
         - 'question': A clear, specific question\n\
         - 'options': An array of exactly 4 possible answers\n\
         - 'correct_answer': One of the options that is the correct answer\n\n\
         If more than one question is requested, return a JSON array of such objects.\n\n\
         Example format:\n\
         {{\n    \"question\": \"What is the capital of France?\",\n    \
         \"options\": [\"London\", \"Berlin\", \"Paris\", \"Madrid\"],\n    \
         \"correct_answer\": \"Paris\"\n}}\n\n\
         Your response:",
        count = count,
        difficulty = difficulty,
        topic = topic,
    )
}

enum GenerationError {
    MissingCredentials,
    ClientUnavailable,
    Http(reqwest::Error),
    Status(reqwest::StatusCode, String),
    NoContent,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::MissingCredentials => write!(f, "no API key configured"),
            GenerationError::ClientUnavailable => write!(f, "HTTP client could not be built"),
            GenerationError::Http(e) => write!(f, "request failed: {}", e),
            GenerationError::Status(status, body) => write!(f, "service returned {}: {}", status, body),
            GenerationError::NoContent => write!(f, "response carried no message content"),
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Http(err)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Groq (or any OpenAI-compatible) chat-completions client.
pub struct GroqGenerator {
    client: Option<Client>,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl GroqGenerator {
    pub fn new(config: &Config) -> Self {
        let client = match Client::builder().timeout(config.request_timeout).build() {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::error!("Failed to build HTTP client, generation disabled: {}", e);
                None
            }
        };

        Self {
            client,
            api_key: config.groq_api_key.clone(),
            api_url: config.groq_api_url.clone(),
            model: config.groq_model.clone(),
        }
    }

    fn request_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingCredentials)?;
        let client = self.client.as_ref().ok_or(GenerationError::ClientUnavailable)?;

        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let res = client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(GenerationError::Status(status, body));
        }

        let body: ChatResponse = res.json()?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.and_then(|m| m.content).or(c.text))
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::NoContent)
    }
}

impl QuestionGenerator for GroqGenerator {
    fn generate(&self, topic: &str, difficulty: Difficulty, count: usize) -> Vec<Question> {
        if count == 0 {
            return Vec::new();
        }

        let prompt = build_prompt(topic, difficulty, count);
        tracing::info!("Requesting {} {} questions on '{}' from {}", count, difficulty, topic, self.model);

        match self.request_content(&prompt) {
            Ok(content) => {
                let questions = parse_generated(&content, count);
                tracing::info!("Generation produced {} usable questions", questions.len());
                questions
            }
            Err(e) => {
                tracing::warn!("Question generation skipped: {}", e);
                Vec::new()
            }
        }
    }
}

/// Turns the service's reply into at most `limit` questions.
///
/// Accepts a single object, an array of objects, or an object wrapping a
/// `questions` array, optionally inside a Markdown code fence. Items that do
/// not normalize into a four-option question with a resolvable answer are
/// dropped.
pub fn parse_generated(content: &str, limit: usize) -> Vec<Question> {
    let Some(value) = parse_json_payload(content) else {
        tracing::warn!("Generated content is not JSON");
        return Vec::new();
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert("questions".to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        _ => {
            tracing::warn!("Generated JSON has an unexpected shape");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Question>(item) {
            Ok(q) => Some(q),
            Err(e) => {
                tracing::warn!("Dropping generated question: {}", e);
                None
            }
        })
        .take(limit)
        .collect()
}

fn parse_json_payload(content: &str) -> Option<Value> {
    let body = strip_code_fence(content);
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }

    // Prose around the payload: fall back to the outermost bracketed span
    let start = body.find(|c| c == '[' || c == '{')?;
    let end = body.rfind(|c| c == ']' || c == '}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line
    let rest = rest.find('\n').map_or("", |i| &rest[i + 1..]);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerLetter;

    #[test]
    fn prompt_embeds_request() {
        let prompt = build_prompt("Modern History", Difficulty::Hard, 3);
        assert!(prompt.starts_with("Generate 3 hard multiple-choice question about Modern History."));
        assert!(prompt.contains("'options': An array of exactly 4 possible answers"));
        assert!(prompt.contains("\"correct_answer\": \"Paris\""));
        assert_eq!(prompt, build_prompt("Modern History", Difficulty::Hard, 3));
    }

    #[test]
    fn single_object_becomes_one_question() {
        let content = r#"{"question": "Capital of France?", "options": ["London", "Berlin", "Paris", "Madrid"], "correct_answer": "Paris"}"#;
        let questions = parse_generated(content, 5);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, AnswerLetter::C);
    }

    #[test]
    fn array_in_code_fence_is_truncated_to_limit() {
        let content = "```json\n[\n\
            {\"question\": \"One?\", \"options\": [\"1\", \"2\", \"3\", \"4\"], \"correct_answer\": \"1\"},\n\
            {\"question\": \"Two?\", \"options\": [\"1\", \"2\", \"3\", \"4\"], \"correct_answer\": \"2\"},\n\
            {\"question\": \"Three?\", \"options\": [\"1\", \"2\", \"3\", \"4\"], \"correct_answer\": \"3\"}\n\
            ]\n```";
        let questions = parse_generated(content, 2);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].question, "Two?");
        assert_eq!(questions[1].correct_answer, AnswerLetter::B);
    }

    #[test]
    fn wrapped_questions_array_and_bad_items() {
        let content = r#"Sure! {"questions": [
            {"question": "Good?", "options": ["a1", "b1", "c1", "d1"], "correct_answer": "d1"},
            {"question": "Too few?", "options": ["x", "y"], "correct_answer": "x"}
        ]} Hope this helps."#;
        let questions = parse_generated(content, 10);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, AnswerLetter::D);
    }

    #[test]
    fn non_json_or_scalar_yields_nothing() {
        assert!(parse_generated("I cannot help with that.", 3).is_empty());
        assert!(parse_generated("42", 3).is_empty());
    }

    #[test]
    fn missing_credentials_yield_nothing() {
        let config = Config::with_root(std::env::temp_dir());
        let generator = GroqGenerator::new(&config);
        assert!(generator.generate("Polity", Difficulty::Easy, 2).is_empty());
    }
}
