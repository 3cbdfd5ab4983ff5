//! Wire types for the Ollama generate API

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerateRequest {
    /// A single-shot (non-streaming) request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

/// Non-streaming response of `POST /api/generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Error body returned by Ollama on failure
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest::new("gemma2", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"model": "gemma2", "prompt": "hello", "stream": false}));
    }

    #[test]
    fn test_response_minimal() {
        let response: GenerateResponse = serde_json::from_str(r#"{"response": "```go\nx\n```"}"#).unwrap();
        assert_eq!(response.response, "```go\nx\n```");
        assert!(!response.done);
        assert!(response.eval_count.is_none());
    }

    #[test]
    fn test_response_full() {
        let body = r#"{"model":"gemma2","created_at":"2024-07-01T00:00:00Z","response":"hi","done":true,"prompt_eval_count":12,"eval_count":3}"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.model, "gemma2");
        assert!(response.done);
        assert_eq!(response.prompt_eval_count, Some(12));
        assert_eq!(response.eval_count, Some(3));
    }

    #[test]
    fn test_error_response() {
        let err: ErrorResponse = serde_json::from_str(r#"{"error":"model \"nope\" not found"}"#).unwrap();
        assert!(err.error.contains("not found"));
    }
}
