//! Quiz assembly: cache, then bank, then generation

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::bank::{filter_questions, QuestionBank};
use crate::cache::QuizCache;
use crate::config::Config;
use crate::error::Result;
use crate::generator::{GroqGenerator, QuestionGenerator};
use crate::models::{Difficulty, Question};

/// Finalized question list for one quiz request.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub questions: Vec<Question>,
    /// How many came from the bank or cache rather than fresh generation.
    pub from_bank: usize,
}

impl Selection {
    pub fn generated(&self) -> usize {
        self.questions.len().saturating_sub(self.from_bank)
    }
}

pub struct QuizSelector<G> {
    bank: QuestionBank,
    cache: QuizCache,
    generator: G,
}

impl QuizSelector<GroqGenerator> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            QuestionBank::new(&config.bank_path),
            QuizCache::new(&config.cache_dir),
            GroqGenerator::new(config),
        )
    }
}

impl<G: QuestionGenerator> QuizSelector<G> {
    pub fn new(bank: QuestionBank, cache: QuizCache, generator: G) -> Self {
        Self { bank, cache, generator }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn cache(&self) -> &QuizCache {
        &self.cache
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Assemble `count` questions for topic/difficulty.
    ///
    /// * A non-empty cache entry for the exact key wins outright.
    /// * Otherwise the first `count` bank matches are used. If they suffice, or
    ///   `preloaded_only` is set, that list (possibly short) is cached and
    ///   returned.
    /// * Otherwise the generator is asked for exactly the shortfall; whatever
    ///   it returns is appended to the bank, and bank matches plus generated
    ///   questions are cached and returned.
    ///
    /// Every call that misses the cache writes the cache entry; generation
    /// also rewrites the bank.
    pub fn select_questions_for_quiz(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
        preloaded_only: bool,
    ) -> Result<Selection> {
        let level = difficulty.as_str();

        let cached = self.cache.load(topic, level, count);
        if !cached.is_empty() {
            tracing::info!("Cache hit for {} / {} / {}: {} questions", topic, level, count, cached.len());
            let from_bank = cached.len();
            return Ok(Selection { questions: cached, from_bank });
        }

        let bank = self.bank.load()?;
        let from_bank = filter_questions(&bank, topic, level, count);

        if from_bank.len() >= count || preloaded_only {
            if from_bank.len() < count {
                tracing::warn!(
                    "Only {} of {} questions available for {} / {}; quiz shortened (no generation)",
                    from_bank.len(),
                    count,
                    topic,
                    level
                );
            }
            self.cache.save(topic, level, count, &from_bank)?;
            let n = from_bank.len();
            return Ok(Selection { questions: from_bank, from_bank: n });
        }

        let missing = count - from_bank.len();
        tracing::info!("Bank has {} of {} for {} / {}; generating {}", from_bank.len(), count, topic, level, missing);

        let mut generated = self.generator.generate(topic, difficulty, missing);
        generated.truncate(missing);
        for q in &mut generated {
            if q.topic.trim().is_empty() {
                q.topic = topic.to_string();
            }
            if q.difficulty.trim().is_empty() {
                q.difficulty = level.to_string();
            }
        }

        if generated.is_empty() {
            tracing::warn!("Generator returned no questions for {} / {}", topic, level);
        }

        self.bank.append(&generated)?;

        let n = from_bank.len();
        let mut questions = from_bank;
        questions.extend(generated);
        self.cache.save(topic, level, count, &questions)?;

        Ok(Selection { questions, from_bank: n })
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "select_questions_for_quiz")]
#[pyo3(signature = (topic, difficulty, n_questions, preloaded_only = false))]
pub fn py_select_questions_for_quiz(
    topic: &str,
    difficulty: &str,
    n_questions: usize,
    preloaded_only: bool,
) -> PyResult<(Vec<Question>, usize)> {
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|e: String| pyo3::exceptions::PyValueError::new_err(e))?;

    let selector = QuizSelector::from_config(&Config::from_env());
    let selection = selector.select_questions_for_quiz(topic, difficulty, n_questions, preloaded_only)?;
    Ok((selection.questions, selection.from_bank))
}
