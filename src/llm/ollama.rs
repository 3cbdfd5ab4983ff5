//! Ollama API client implementation
//!
//! Talks to a local (or remote) Ollama server through `POST /api/generate`
//! with streaming disabled, so each call returns the whole response.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::llm::client::{Generator, LlmError};
use crate::llm::types::{ErrorResponse, GenerateRequest, GenerateResponse};

/// Host used when neither the config nor `OLLAMA_HOST` names one
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

const DEFAULT_PORT: u16 = 11434;

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::with_host(None)
    }
}

impl OllamaConfig {
    /// Config for `host`, falling back to `$OLLAMA_HOST` and then the default
    pub fn with_host(host: Option<&str>) -> Self {
        Self {
            host: resolve_host(host, std::env::var("OLLAMA_HOST").ok()),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Pick the first non-empty host and normalize it to `scheme://host:port`.
pub fn resolve_host(configured: Option<&str>, env: Option<String>) -> String {
    let non_empty = |raw: &str| Some(raw.trim().to_string()).filter(|h| !h.is_empty());
    configured
        .and_then(non_empty)
        .or_else(|| env.as_deref().and_then(non_empty))
        .map(|raw| normalize_host(&raw))
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

fn normalize_host(raw: &str) -> String {
    let raw = raw.trim_end_matches('/');
    // A bare host means Ollama's own port; an explicit scheme means its standard one.
    let (scheme, rest, default_port) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme, rest, scheme_port(scheme)),
        None => ("http", raw, Some(DEFAULT_PORT)),
    };
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    match default_port {
        Some(port) if !authority.contains(':') => format!("{}://{}:{}{}", scheme, authority, port, path),
        _ => format!("{}://{}{}", scheme, authority, path),
    }
}

fn scheme_port(scheme: &str) -> Option<u16> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.host)
    }

    async fn send_request(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let response = self.client.post(self.generate_url()).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest::new(model, prompt);
        debug!("POST {} model={} prompt_len={}", self.generate_url(), model, prompt.len());

        let response = self.send_request(&request).await?;
        debug!(
            "Ollama response: {} bytes, prompt_eval={:?} eval={:?}",
            response.response.len(),
            response.prompt_eval_count,
            response.eval_count
        );
        Ok(response.response)
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient").field("host", &self.config.host).finish()
    }
}
