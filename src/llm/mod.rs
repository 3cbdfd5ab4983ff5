//! LLM layer - the generation trait, the Ollama backend and a scripted mock

pub mod client;
pub mod ollama;
pub mod types;

pub use client::{Generator, LlmError, MockGenerator, RecordedCall};
pub use ollama::{DEFAULT_HOST, OllamaClient, OllamaConfig, resolve_host};
pub use types::{GenerateRequest, GenerateResponse};
