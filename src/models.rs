//! Data models and structures
//!
//! Defines the request/response bodies of the relay, the per-request image
//! and word list types, and the environment-driven configuration.

use crate::predictor::{RetryPolicy, WordValidation};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error message returned when a request carries no usable image.
pub const NO_IMAGE_MESSAGE: &str = "No image provided";

/// Error message returned when the model could not produce a word list.
pub const UNAVAILABLE_MESSAGE: &str = "Gemini AI is unavailable. Try again later.";

/// String-encoded image as sent by the client (a `data:` URL or bare base64).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(data: String) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidInput(NO_IMAGE_MESSAGE.to_string()));
        }
        Ok(Self(data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Candidate words in the order the model ranked them.
///
/// Elements are kept as raw JSON values: unless strict validation is
/// enabled, the model's array is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordList(pub Vec<serde_json::Value>);

impl WordList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parsed `/upload` body.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub image: Option<serde_json::Value>,
}

impl UploadRequest {
    /// Read the `image` field of a JSON body. Bodies that are not objects
    /// (arrays, strings, numbers) carry no fields and therefore no image.
    pub fn from_json(body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(mut fields) => Self {
                image: fields.remove("image"),
            },
            _ => Self::default(),
        }
    }

    /// Only a non-empty string counts as an image; `null`, `false`, `""` and
    /// any other JSON type are rejected.
    pub fn into_payload(self) -> Result<ImagePayload> {
        match self.image {
            Some(serde_json::Value::String(data)) => ImagePayload::new(data),
            _ => Err(Error::InvalidInput(NO_IMAGE_MESSAGE.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub words: WordList,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub temperature: f32,
    pub provider_max_retries: usize,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub word_validation: WordValidation,
    pub body_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let strict_words = parse_var(&lookup, "STRICT_WORDS", false)?;

        Ok(Self {
            gemini_api_key,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 5000)?,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            temperature: parse_var(&lookup, "GEMINI_TEMPERATURE", 0.0)?,
            provider_max_retries: parse_var(&lookup, "GEMINI_MAX_RETRIES", 2)?,
            request_timeout: Duration::from_secs(parse_var(&lookup, "GEMINI_TIMEOUT_SECS", 30)?),
            max_attempts: parse_var(&lookup, "PREDICT_MAX_ATTEMPTS", 3)?,
            backoff_base: Duration::from_millis(parse_var(&lookup, "PREDICT_BACKOFF_MS", 2000)?),
            word_validation: if strict_words {
                WordValidation::Strict
            } else {
                WordValidation::Permissive
            },
            body_limit: parse_var(&lookup, "BODY_LIMIT_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.backoff_base,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", key, raw, e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "key")])).unwrap();

        assert_eq!(config.gemini_api_key, "key");
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.provider_max_retries, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.word_validation, WordValidation::Permissive);
        assert_eq!(config.body_limit, 10 * 1024 * 1024);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(2000),
            }
        );
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("PORT", "8080"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_MAX_RETRIES", "0"),
            ("PREDICT_MAX_ATTEMPTS", "5"),
            ("PREDICT_BACKOFF_MS", "10"),
            ("STRICT_WORDS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.provider_max_retries, 0);
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(10));
        assert_eq!(config.word_validation, WordValidation::Strict);
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "key"), ("PORT", "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_upload_request_accepts_non_empty_string() {
        let request = UploadRequest::from_json(serde_json::json!({
            "image": "data:image/png;base64,iVBORw0KGgo="
        }));
        let payload = request.into_payload().unwrap();
        assert_eq!(payload.as_str(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_upload_request_rejects_falsy_images() {
        for body in [r#"{}"#, r#"{"image": null}"#, r#"{"image": ""}"#, r#"{"image": false}"#] {
            let request = UploadRequest::from_json(serde_json::from_str(body).unwrap());
            let err = request.into_payload().unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "body {}", body);
        }
    }

    #[test]
    fn test_upload_request_ignores_non_object_bodies() {
        for body in [r#"[]"#, r#"["iVBORw0KGgo="]"#, r#""iVBORw0KGgo=""#, r#"42"#] {
            let request = UploadRequest::from_json(serde_json::from_str(body).unwrap());
            assert!(request.image.is_none(), "body {}", body);
            assert!(matches!(
                request.into_payload(),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_word_list_serializes_as_plain_array() {
        let response = UploadResponse {
            words: WordList(vec![serde_json::json!("cat"), serde_json::json!("dog")]),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"words":["cat","dog"]}"#
        );
    }
}
