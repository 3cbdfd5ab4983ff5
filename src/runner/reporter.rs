//! Operator-facing progress output for the refine loop.
//!
//! Every event is emitted as soon as it happens, so an operator sees each
//! attempt's code and result before the next attempt starts.

use colored::*;

use crate::domain::CodeBlock;
use crate::script::ScriptResult;

/// Receives refine loop events as they happen.
pub trait Reporter: Send + Sync {
    /// A code block was selected from the response for `attempt`
    fn generated(&self, attempt: u32, code: &CodeBlock);

    /// The response for `attempt` had no block tagged `language`
    fn missing_code(&self, attempt: u32, language: &str, response: &str);

    /// The verification script finished for `attempt`
    fn verified(&self, attempt: u32, result: &ScriptResult);
}

/// Prints banners and captured output to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn generated(&self, attempt: u32, code: &CodeBlock) {
        println!("{} {}", "=== generated code ===".cyan().bold(), format!("(attempt {})", attempt).dimmed());
        println!("{}", code);
    }

    fn missing_code(&self, attempt: u32, language: &str, response: &str) {
        println!(
            "{} {}",
            format!("=== no {} code block found ===", language).yellow().bold(),
            format!("(attempt {})", attempt).dimmed()
        );
        println!("{}", response);
    }

    fn verified(&self, _attempt: u32, result: &ScriptResult) {
        if result.passed() {
            println!("{}", "=== PASSED with output ===".green().bold());
        } else {
            println!("{}", "=== FAILED with output ===".red().bold());
        }
        let report = result.report();
        if !report.is_empty() {
            println!("{}", report);
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl Reporter for NoOpReporter {
    fn generated(&self, _attempt: u32, _code: &CodeBlock) {}

    fn missing_code(&self, _attempt: u32, _language: &str, _response: &str) {}

    fn verified(&self, _attempt: u32, _result: &ScriptResult) {}
}
