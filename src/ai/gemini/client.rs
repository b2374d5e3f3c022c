use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::RetryIf;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client with its own transient-failure retries.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    max_retries: usize,
    retry_base: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-1.5-flash`);
    /// a `models/` prefix is stripped.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
            max_retries: 2,
            retry_base: Duration::from_millis(1000),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Retries layered under each call: `max_retries` extra tries with
    /// exponential backoff starting at `retry_base`.
    pub fn with_retries(mut self, max_retries: usize, retry_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base = retry_base;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn retry_delays(&self) -> impl Iterator<Item = Duration> {
        let base = self.retry_base;
        (0..self.max_retries).map(move |i| base.saturating_mul(2u32.saturating_pow(i as u32)))
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls Gemini's `generateContent` endpoint.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        RetryIf::spawn(
            self.retry_delays(),
            || self.post_to_url(&url, request),
            |e: &Error| {
                let retry = e.is_transient();
                if retry {
                    tracing::warn!("Transient Gemini failure, retrying: {}", e);
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_prefix_is_stripped() {
        let client = GeminiHttpClient::new(
            "key".to_string(),
            "models/gemini-1.5-flash".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_retry_delays_double() {
        let client = GeminiHttpClient::new(
            "key".to_string(),
            "gemini-1.5-flash".to_string(),
            Duration::from_secs(1),
        )
        .with_retries(3, Duration::from_millis(500));

        let delays: Vec<Duration> = client.retry_delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
            ]
        );
    }

    #[test]
    fn test_zero_retries_means_single_try() {
        let client = GeminiHttpClient::new(
            "key".to_string(),
            "gemini-1.5-flash".to_string(),
            Duration::from_secs(1),
        )
        .with_retries(0, Duration::from_millis(500));
        assert_eq!(client.retry_delays().count(), 0);
    }
}
