//! Configuration for xof.
//!
//! A single `xof.yaml` per project, found by walking up from the working
//! directory. Paths inside it are relative to the file's own directory.

pub use self::project::{Config, RefineStrategy};

mod project;

/// Config file name searched for by `Config::lookup`.
pub const DEFAULT_CONFIG_NAME: &str = "xof.yaml";

/// Model used when the config does not name one.
pub const DEFAULT_MODEL: &str = "gemma2";
