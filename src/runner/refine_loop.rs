//! Refine loop - generate code, run the verification script, feed the
//! failure back and try again until the script passes or the attempt
//! budget runs out.
//!
//! Each iteration walks BUILD_PROMPT, GENERATE, SELECT_BLOCK, PERSIST and
//! EXECUTE. Only the most recent code and its failure report carry over to
//! the next iteration; every prompt is built fresh.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, RefineStrategy};
use crate::domain::{CodeBlock, LoopOutcome};
use crate::error::{Result, XofError};
use crate::llm::Generator;
use crate::markdown::{extract_code_blocks, select_last};
use crate::prompt::{PromptBuilder, Refinement};
use crate::script::{ScriptError, ScriptExecutor, ScriptResult, error_report};

use super::reporter::Reporter;

/// Settings for one refine loop run.
#[derive(Debug, Clone)]
pub struct RefineLoopConfig {
    /// Backend model identifier
    pub model: String,
    /// File the selected code is written to
    pub output: PathBuf,
    /// Language tag a code block must carry to be selected
    pub language: String,
    /// Verification script body; empty always passes
    pub script: String,
    /// Iteration budget
    pub attempt: i64,
    pub refine: RefineStrategy,
}

impl RefineLoopConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model().to_string(),
            output: config.output_path(),
            language: config.language(),
            script: config.script.clone(),
            attempt: config.attempt,
            refine: config.refine,
        }
    }
}

/// A failed iteration, carried into the next prompt.
struct Failure {
    code: CodeBlock,
    report: String,
}

/// Drives generate/verify iterations against a `Generator`.
pub struct RefineLoop<G, R>
where
    G: Generator,
    R: Reporter,
{
    generator: Arc<G>,
    reporter: R,
    executor: ScriptExecutor,
    prompts: PromptBuilder,
    config: RefineLoopConfig,
}

impl<G, R> RefineLoop<G, R>
where
    G: Generator,
    R: Reporter,
{
    pub fn new(generator: Arc<G>, reporter: R, prompts: PromptBuilder, config: RefineLoopConfig) -> Self {
        Self {
            generator,
            reporter,
            executor: ScriptExecutor::new(),
            prompts,
            config,
        }
    }

    /// Build a loop from a loaded config, reading its context files now.
    pub fn from_config(config: &Config, generator: Arc<G>, reporter: R) -> Result<Self> {
        let files = config.context_files()?;
        info!("Loading {} context file(s)", files.len());
        let prompts = PromptBuilder::new(config.prompt.clone()).with_context(PromptBuilder::load_context(&files)?);

        let mut executor = ScriptExecutor::new();
        if !config.dir.as_os_str().is_empty() {
            executor = executor.with_working_dir(&config.dir);
        }
        if let Some(timeout) = config.timeout() {
            executor = executor.with_timeout(timeout);
        }

        Ok(Self::new(generator, reporter, prompts, RefineLoopConfig::from_config(config)).with_executor(executor))
    }

    pub fn with_executor(mut self, executor: ScriptExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &RefineLoopConfig {
        &self.config
    }

    /// Run until the verification script passes or the budget is spent.
    ///
    /// Backend failures, output write failures and script infrastructure
    /// failures abort immediately. Cancellation aborts with
    /// `XofError::Cancelled`.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<LoopOutcome> {
        let attempts = self.config.attempt;
        if attempts <= 0 {
            warn!("Attempt budget is {}; nothing to do", attempts);
            return Err(XofError::Exhausted { attempts });
        }
        let budget = u32::try_from(attempts).unwrap_or(u32::MAX);

        let language = self.config.language.as_str();
        let mut generations = 0u32;
        let mut previous: Option<Failure> = None;

        for attempt in 1..=budget {
            info!("Attempt {}/{}: generating {} code", attempt, budget, language);

            let review = match (&previous, self.config.refine) {
                (Some(failure), RefineStrategy::Review) => {
                    debug!("Requesting review of attempt {}", attempt - 1);
                    generations += 1;
                    Some(self.generate(cancel, &self.prompts.review(&failure.code, &failure.report)).await?)
                }
                _ => None,
            };

            let prompt = match &previous {
                Some(failure) => self.prompts.build(Some(&Refinement {
                    code: &failure.code,
                    failure: &failure.report,
                    review: review.as_deref(),
                })),
                None => self.prompts.build(None),
            };

            generations += 1;
            let response = self.generate(cancel, &prompt).await?;

            let blocks = extract_code_blocks(&response);
            let Some(code) = select_last(&blocks, language).cloned() else {
                warn!(
                    "Attempt {}: no {} block among {} block(s) in the response",
                    attempt,
                    language,
                    blocks.len()
                );
                self.reporter.missing_code(attempt, language, &response);
                previous = Some(Failure {
                    report: error_report(&format!("no {} code block found in the response", language)),
                    code: CodeBlock::new("", response),
                });
                continue;
            };
            self.reporter.generated(attempt, &code);

            debug!("Writing {} bytes to {}", code.content().len(), self.config.output.display());
            code.write_to(&self.config.output)?;

            let result = self.verify(cancel).await?;
            self.reporter.verified(attempt, &result);

            if result.passed() {
                info!("Attempt {} passed after {} generation call(s)", attempt, generations);
                return Ok(LoopOutcome {
                    attempts: attempt,
                    generations,
                    code,
                });
            }

            info!("Attempt {} failed verification", attempt);
            previous = Some(Failure {
                report: result.report(),
                code,
            });
        }

        warn!("Giving up after {} attempt(s)", attempts);
        Err(XofError::Exhausted { attempts })
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Cancellation requested during generation");
                Err(XofError::Cancelled)
            }
            response = self.generator.generate(&self.config.model, prompt) => {
                response.map_err(|e| {
                    warn!("Generation failed (retryable={}): {}", e.is_retryable(), e);
                    XofError::Llm(e)
                })
            }
        }
    }

    async fn verify(&self, cancel: &CancellationToken) -> Result<ScriptResult> {
        if self.config.script.trim().is_empty() {
            debug!("No verification script; treating as passed");
            return Ok(ScriptResult::default());
        }

        let result = self.executor.run(cancel, &self.config.script).await;
        match &result.error {
            Some(ScriptError::Cancelled) => Err(XofError::Cancelled),
            Some(err) if err.is_infrastructure() => Err(XofError::Script(err.clone())),
            _ => Ok(result),
        }
    }
}
