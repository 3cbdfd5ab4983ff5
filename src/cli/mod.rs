//! CLI module for xof - command-line interface and subcommands.

pub mod commands;

pub use commands::{Cli, Commands};
