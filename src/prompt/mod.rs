//! Prompt System - compose generation and review prompts

mod builder;

pub use builder::{ContextFile, PromptBuilder, REVIEW_INSTRUCTION, Refinement, SYSTEM_INSTRUCTION};
