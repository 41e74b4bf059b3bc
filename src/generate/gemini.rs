//! Gemini-style generative backend over the REST API.
//!
//! Failure classing: connection errors, timeouts, 429 and 5xx responses are
//! transient (the same credential may work on retry); every other rejection
//! is permanent and dispatch should move on to the next credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::generate::GenerationBackend;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiBackend {
    base_url: String,
    client: reqwest::Client,
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(default, rename = "supportedGenerationMethods")]
    supported_generation_methods: Vec<String>,
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn list_models(&self, credential: &SecretString) -> Result<Vec<String>, GenerateError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", credential.expose_secret())])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Permanent(format!("malformed models response: {e}")))?;

        Ok(parsed
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    async fn generate(
        &self,
        model: &str,
        credential: &SecretString,
        prompt: &str,
    ) -> Result<String, GenerateError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", credential.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Permanent(format!("malformed generate response: {e}")))?;

        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, GenerateError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        Err(GenerateError::Permanent(
            "response contained no candidate text".to_string(),
        ))
    } else {
        Ok(text)
    }
}

/// Network-level failures are worth retrying with the same credential.
fn classify_request_error(e: reqwest::Error) -> GenerateError {
    if e.is_timeout() || e.is_connect() {
        GenerateError::Transient(e.to_string())
    } else {
        GenerateError::Permanent(e.to_string())
    }
}

/// 429 and 5xx mean the backend is overloaded; anything else (bad request,
/// bad key, quota) will not improve on retry.
fn classify_status(status: StatusCode, body: &str) -> GenerateError {
    let detail = format!("{status}: {}", body.chars().take(200).collect::<String>());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        GenerateError::Transient(detail)
    } else {
        GenerateError::Permanent(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_transient());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, "").is_transient());
        assert!(!classify_status(StatusCode::FORBIDDEN, "quota").is_transient());
    }

    #[test]
    fn extracts_candidate_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Market "}, {"text": "briefing."}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Market briefing.");
    }

    #[test]
    fn empty_candidates_is_permanent_failure() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        let err = extract_text(parsed).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn model_listing_filters_generation_capable() {
        let json = r#"{
            "models": [
                {"name": "models/gemini-1.5-flash",
                 "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/embedding-001",
                 "supportedGenerationMethods": ["embedContent"]}
            ]
        }"#;
        let parsed: ModelsResponse = serde_json::from_str(json).unwrap();
        let names: Vec<String> = parsed
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect();
        assert_eq!(names, vec!["gemini-1.5-flash"]);
    }

    #[tokio::test]
    async fn unreachable_backend_is_transient() {
        let backend = GeminiBackend::with_base_url("http://127.0.0.1:1/v1beta");
        let err = backend
            .generate("gemini-1.5-flash", &SecretString::from("key"), "hi")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
