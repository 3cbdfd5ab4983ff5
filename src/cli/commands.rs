//! CLI command definitions using clap.
//!
//! - run (default): generate and verify code per the nearest xof.yaml
//! - extract: print the fenced code blocks of a markdown file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xof - generate code with a local model until a verification script passes
#[derive(Parser, Debug)]
#[command(name = "xof")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (default: nearest xof.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured model
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Override the configured attempt budget
    #[arg(short, long, global = true, allow_negative_numbers = true)]
    pub attempt: Option<i64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the refine loop (the default)
    Run,

    /// Print the fenced code blocks of a markdown file
    Extract {
        /// Markdown file to read ("-" for stdin)
        file: PathBuf,

        /// Only print blocks tagged with this language
        #[arg(short, long)]
        lang: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args runs the refine loop
        let cli = Cli::try_parse_from(["xof"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.model.is_none());
        assert!(cli.attempt.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["xof", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["xof", "-c", "/path/to/xof.yaml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/xof.yaml")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from(["xof", "--model", "llama3", "--attempt", "5", "run"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert_eq!(cli.attempt, Some(5));
        assert_eq!(cli.command, Some(Commands::Run));
    }

    #[test]
    fn test_cli_negative_attempt() {
        let cli = Cli::try_parse_from(["xof", "-a", "-1"]).unwrap();
        assert_eq!(cli.attempt, Some(-1));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["xof", "run", "-v", "-m", "gemma2"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.model.as_deref(), Some("gemma2"));
    }

    #[test]
    fn test_extract_command() {
        let cli = Cli::try_parse_from(["xof", "extract", "answer.md", "--lang", "rust"]).unwrap();
        match cli.command {
            Some(Commands::Extract { file, lang }) => {
                assert_eq!(file, PathBuf::from("answer.md"));
                assert_eq!(lang.as_deref(), Some("rust"));
            }
            _ => panic!("Expected extract command"),
        }
    }

    #[test]
    fn test_extract_requires_file() {
        assert!(Cli::try_parse_from(["xof", "extract"]).is_err());
    }

    #[test]
    fn test_invalid_attempt() {
        assert!(Cli::try_parse_from(["xof", "--attempt", "many"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
