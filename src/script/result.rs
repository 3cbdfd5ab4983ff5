//! Script execution results and their failure report.

use std::fmt;

use thiserror::Error;

/// Why a script run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Creating, writing, syncing or closing the temp script failed
    #[error("failed to prepare script: {0}")]
    Setup(String),

    /// The shell could not be started
    #[error("failed to start script: {0}")]
    Spawn(String),

    /// Waiting on the child failed
    #[error("failed to wait for script: {0}")]
    Wait(String),

    /// Non-zero exit
    #[error("process exits with {0}")]
    Exit(i32),

    /// Killed by a signal, no exit code
    #[error("process terminated by a signal")]
    Terminated,

    /// Caller cancelled the run
    #[error("script cancelled")]
    Cancelled,

    /// Exceeded the configured wall clock limit
    #[error("script timed out after {0}ms")]
    TimedOut(u64),
}

impl ScriptError {
    /// Errors that say nothing about the code under test.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ScriptError::Setup(_) | ScriptError::Spawn(_) | ScriptError::Wait(_) | ScriptError::Cancelled
        )
    }
}

/// Captured output of one script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptResult {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<ScriptError>,
}

impl ScriptResult {
    /// A result carrying only an error, with no captured output
    pub fn failed(error: ScriptError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Verification passes only with no error and a silent stderr.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.stderr.is_empty()
    }

    /// Failure report: labeled fenced sections for each non-empty part.
    pub fn report(&self) -> String {
        let mut sections = Vec::with_capacity(3);
        if let Some(error) = &self.error {
            sections.push(section("Error", &error.to_string()));
        }
        if !self.stdout.is_empty() {
            sections.push(section("Stdout", &self.stdout));
        }
        if !self.stderr.is_empty() {
            sections.push(section("Stderr", &self.stderr));
        }
        sections.join("\n\n")
    }
}

impl fmt::Display for ScriptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Report for a failure that never reached a script run.
pub fn error_report(message: &str) -> String {
    section("Error", message)
}

fn section(label: &str, body: &str) -> String {
    if body.ends_with('\n') {
        format!("{}:\n```\n{}```", label, body)
    } else {
        format!("{}:\n```\n{}\n```", label, body)
    }
}
