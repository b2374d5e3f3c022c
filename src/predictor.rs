//! Prediction fetching
//!
//! Sends a drawing to the model, retries failed attempts with a linear
//! backoff and turns the loosely formatted reply into a [`WordList`].

use crate::ai::ModelService;
use crate::models::{ImagePayload, WordList};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// Upper bound on words enforced by [`WordValidation::Strict`].
pub const MAX_WORDS: usize = 10;

const JSON_FENCE_OPEN: &str = "```json\n";
const JSON_FENCE_CLOSE: &str = "\n```";

/// Attempt budget of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The wait after failed attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` (1-based) failed, or `None` when it was
    /// the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.base_delay.saturating_mul(attempt))
        }
    }
}

/// How much of the model's array is checked before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordValidation {
    /// Any JSON array is accepted as-is.
    #[default]
    Permissive,
    /// At most [`MAX_WORDS`] elements, each a single whitespace-free word.
    Strict,
}

/// Waits between attempts. Injected so tests can observe or skip delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Fetches word predictions for drawings. Shared read-only across requests.
pub struct Predictor {
    model: Arc<dyn ModelService>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    validation: WordValidation,
}

impl Predictor {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self {
            model,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
            validation: WordValidation::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_validation(mut self, validation: WordValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Ask the model for the most likely words in `image`.
    ///
    /// Every failure (provider error, unparseable or non-array reply) costs
    /// one attempt. Once the budget is spent the caller only sees
    /// [`Error::ProviderUnavailable`].
    pub async fn fetch_prediction(&self, image: &ImagePayload) -> Result<WordList> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!(
                "Attempt {}/{}: Sending image to Gemini AI for analysis...",
                attempt, max_attempts
            );

            let err = match self.attempt(image).await {
                Ok(words) => {
                    info!("Attempt {} returned {} words", attempt, words.len());
                    return Ok(words);
                }
                Err(e) => e,
            };

            warn!("Attempt {} failed: {}", attempt, err);

            match self.policy.delay_after(attempt) {
                Some(delay) if attempt < max_attempts => {
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                _ => {
                    error!("All {} attempts failed, giving up", attempt);
                    return Err(Error::ProviderUnavailable {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
            }
        }
    }

    async fn attempt(&self, image: &ImagePayload) -> Result<WordList> {
        let prompt = prompts::compose(image);
        let reply = self.model.invoke(&prompt).await?;
        extract_word_list(&reply, self.validation)
    }
}

/// Body of the first ```` ```json ```` fence in `reply`, or the whole trimmed
/// reply when there is none.
pub fn extract_json_block(reply: &str) -> &str {
    let trimmed = reply.trim();

    trimmed
        .find(JSON_FENCE_OPEN)
        .and_then(|open| {
            let body_start = open + JSON_FENCE_OPEN.len();
            trimmed[body_start..]
                .find(JSON_FENCE_CLOSE)
                .map(|len| &trimmed[body_start..body_start + len])
        })
        .unwrap_or(trimmed)
}

/// Parse a raw model reply into a word list.
pub fn extract_word_list(reply: &str, validation: WordValidation) -> Result<WordList> {
    let block = extract_json_block(reply);

    let value: serde_json::Value = serde_json::from_str(block)
        .map_err(|e| Error::MalformedReply(format!("reply is not valid JSON: {}", e)))?;

    let words = match value {
        serde_json::Value::Array(words) => words,
        other => {
            return Err(Error::MalformedReply(format!(
                "expected a JSON array, got {}",
                json_type_name(&other)
            )))
        }
    };

    if validation == WordValidation::Strict {
        validate_words(&words)?;
    }

    Ok(WordList(words))
}

fn validate_words(words: &[serde_json::Value]) -> Result<()> {
    if words.len() > MAX_WORDS {
        return Err(Error::MalformedReply(format!(
            "expected at most {} words, got {}",
            MAX_WORDS,
            words.len()
        )));
    }

    for word in words {
        match word.as_str() {
            Some(w) if !w.is_empty() && !w.contains(char::is_whitespace) => {}
            _ => {
                return Err(Error::MalformedReply(format!(
                    "not a single word: {}",
                    word
                )))
            }
        }
    }

    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
