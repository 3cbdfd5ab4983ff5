//! xof - generate code with a local model until a verification script passes
//!
//! A refine loop asks the model for code, extracts the fenced block in the
//! output file's language, writes it, runs the project's verification
//! script and feeds any failure back into the next prompt.

pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod markdown;
pub mod prompt;
pub mod runner;
pub mod script;

pub use error::{Result, XofError};
