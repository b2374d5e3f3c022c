use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::mime::parse_image_payload;
use crate::ai::ModelService;
use crate::models::Config;
use crate::prompts::Prompt;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Gemini-backed model used for drawing prediction.
pub struct GeminiPredictionClient {
    http: GeminiHttpClient,
    temperature: f32,
}

impl GeminiPredictionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
            temperature: 0.0,
        }
    }

    /// Build the process-wide client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: GeminiHttpClient::new(
                config.gemini_api_key.clone(),
                config.model.clone(),
                config.request_timeout,
            )
            .with_retries(config.provider_max_retries, Duration::from_millis(1000)),
            temperature: config.temperature,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_retries(mut self, max_retries: usize, retry_base: Duration) -> Self {
        self.http = self.http.with_retries(max_retries, retry_base);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(&self, prompt: &Prompt) -> GenerateContentRequest {
        let image_part = match parse_image_payload(prompt.image.as_str()) {
            Some(image) => Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            },
            None => {
                tracing::debug!("Image payload is not base64, sending it as text");
                Part::Text {
                    text: prompt.image.as_str().to_string(),
                }
            }
        };

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.system.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![image_part],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
            }),
        }
    }
}

#[async_trait]
impl ModelService for GeminiPredictionClient {
    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        tracing::debug!(
            "Sending drawing ({} chars) to Gemini model {}",
            prompt.image.as_str().len(),
            self.model()
        );

        let request = self.build_request(prompt);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        response
            .first_text()
            .ok_or_else(|| Error::AiProvider("No text in Gemini response".to_string()))
    }
}
