//! Domain types for xof
//!
//! - CodeBlock: a language tag paired with raw code, as extracted from a
//!   model response or read from a context file
//! - LoopOutcome: what a successful refine loop reports back

pub mod code_block;
pub mod outcome;

pub use code_block::{CodeBlock, LANGUAGE_EXTENSIONS, language_for_extension, language_for_path};
pub use outcome::LoopOutcome;
