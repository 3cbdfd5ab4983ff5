//! Verification script execution.
//!
//! - ScriptExecutor: writes a script body to a temp file and runs it with bash
//! - ScriptResult: captured stdout/stderr plus an optional ScriptError, and
//!   the failure report fed back into refine prompts

mod executor;
mod result;

pub use executor::{SHEBANG, ScriptExecutor};
pub use result::{ScriptError, ScriptResult, error_report};
