use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod cli;

use cli::{Cli, Commands};
use xof::config::Config;
use xof::llm::{OllamaClient, OllamaConfig};
use xof::markdown::extract_code_blocks;
use xof::runner::{ConsoleReporter, RefineLoop};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xof")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("xof.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Pipe(target));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None | Some(Commands::Run) => handle_run_command(cli).await,
        Some(Commands::Extract { file, lang }) => handle_extract_command(file, lang.as_deref()),
    }
}

async fn handle_run_command(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut config = Config::locate(cli.config.as_ref(), &cwd).context("Failed to load configuration")?;

    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(attempt) = cli.attempt {
        config.attempt = attempt;
    }
    config.validate()?;

    let client = OllamaClient::new(OllamaConfig::with_host(config.host.as_deref()))
        .context("Failed to create Ollama client")?;
    info!(
        "Generating {} with model {} via {}",
        config.output_path().display(),
        config.model(),
        client.host()
    );

    let runner = RefineLoop::from_config(&config, Arc::new(client), ConsoleReporter)?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            watcher.cancel();
        }
    });

    let outcome = runner.run(&cancel).await?;
    println!(
        "{} {} written after {} attempt(s)",
        "Done:".green().bold(),
        config.output_path().display(),
        outcome.attempts
    );
    Ok(())
}

fn handle_extract_command(file: &Path, lang: Option<&str>) -> Result<()> {
    info!("Extracting code blocks from {}", file.display());

    let document = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?
    };

    let blocks = extract_code_blocks(&document);
    let selected: Vec<_> = blocks
        .iter()
        .filter(|b| lang.is_none_or(|l| b.language() == l))
        .collect();

    if selected.is_empty() {
        eyre::bail!("no code blocks found in {}", file.display());
    }
    for block in selected {
        println!("{}\n", block);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging first
    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli).await.context("Application failed")?;

    Ok(())
}
