//! Markdown code block extraction.
//!
//! A model response is parsed into a block tree and walked in document
//! order; every fenced code block becomes a CodeBlock.

pub mod extract;
pub mod tree;

pub use extract::{extract_code_blocks, fence_language, select_last};
pub use tree::{Node, parse};
