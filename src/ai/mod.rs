//! AI service integration for drawing prediction
//!
//! Provides the model-provider seam used by the prediction fetcher, the
//! Gemini implementation of it, and a scripted mock for tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiPredictionClient;
pub use mock::MockModelClient;

use crate::prompts::Prompt;
use crate::Result;
use async_trait::async_trait;

/// A generative model that answers a composed prompt with raw text.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn invoke(&self, prompt: &Prompt) -> Result<String>;
}
