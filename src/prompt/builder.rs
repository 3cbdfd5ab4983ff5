//! Prompt Builder - compose generation prompts from fixed instructions,
//! file context, the user prompt and (on retries) the refine addendum.

use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::CodeBlock;

/// Instruction placed at the top of every generation prompt
pub const SYSTEM_INSTRUCTION: &str =
    "You are a senior software engineer who writes clean and precise code with detailed comments. Return code ONLY.";

/// Instruction placed at the top of every review prompt
pub const REVIEW_INSTRUCTION: &str =
    "You are a senior software engineer. Review the following code and error. Provide actionable suggestions:";

const CONTEXT_HEADER: &str = "Given the following files:";

/// A context file rendered into the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub path: PathBuf,
    pub block: CodeBlock,
}

impl ContextFile {
    /// Read `path`; the fence language comes from its extension
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            path: path.to_path_buf(),
            block: CodeBlock::from_file(path)?,
        })
    }
}

/// What a failed iteration hands to the next prompt
#[derive(Debug, Clone, Copy)]
pub struct Refinement<'a> {
    /// Code generated by the failed iteration
    pub code: &'a CodeBlock,
    /// Rendered failure report
    pub failure: &'a str,
    /// Review comments, when the review strategy is in use
    pub review: Option<&'a str>,
}

/// Assembles the prompt text for each iteration
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    prompt: String,
    context: Vec<ContextFile>,
}

impl PromptBuilder {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Vec<ContextFile>) -> Self {
        self.context = context;
        self
    }

    /// Read every path as a context file, in order
    pub fn load_context(paths: &[PathBuf]) -> std::io::Result<Vec<ContextFile>> {
        paths.iter().map(ContextFile::load).collect()
    }

    /// Full generation prompt; `refinement` is `None` on the first iteration.
    pub fn build(&self, refinement: Option<&Refinement<'_>>) -> String {
        let mut parts = vec![SYSTEM_INSTRUCTION.to_string()];
        if let Some(context) = self.context_section() {
            parts.push(context);
        }
        if !self.prompt.is_empty() {
            parts.push(self.prompt.clone());
        }
        if let Some(refinement) = refinement {
            parts.push(refine_addendum(refinement));
        }

        let prompt = parts.join("\n\n");
        debug!(
            "Built prompt: {} bytes, {} context file(s), refine={}",
            prompt.len(),
            self.context.len(),
            refinement.is_some()
        );
        prompt
    }

    /// Prompt asking for actionable suggestions on failed code
    pub fn review(&self, code: &CodeBlock, failure: &str) -> String {
        [REVIEW_INSTRUCTION.to_string(), code.to_string(), failure.to_string()].join("\n\n")
    }

    fn context_section(&self) -> Option<String> {
        if self.context.is_empty() {
            return None;
        }
        let mut section = String::from(CONTEXT_HEADER);
        section.push('\n');
        for file in &self.context {
            section.push_str(&format!("\n# {}:\n{}\n", file.path.display(), file.block));
        }
        Some(section)
    }
}

fn refine_addendum(refinement: &Refinement<'_>) -> String {
    let mut parts = vec![
        "The previous code failed.".to_string(),
        format!("Code:\n{}", refinement.code),
        refinement.failure.to_string(),
    ];
    if let Some(review) = refinement.review {
        parts.push(format!("Review comments:\n{}", review));
    }
    parts.push("Fix the code and return the fixed code ONLY.".to_string());
    parts.join("\n\n")
}
