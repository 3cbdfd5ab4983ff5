//! Project configuration loaded from `xof.yaml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::language_for_path;
use crate::error::{Result, XofError};

use super::{DEFAULT_CONFIG_NAME, DEFAULT_MODEL};

/// How a failed iteration is turned into the next prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefineStrategy {
    /// Embed the failing code and its report, one generate call per iteration
    #[default]
    Direct,
    /// Ask for review comments first, then embed them as well
    Review,
}

/// Settings for one refine loop invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Backend model identifier; empty means the default model.
    pub model: String,

    /// Ollama host; falls back to `$OLLAMA_HOST`.
    pub host: Option<String>,

    /// Where generated code is written, relative to the config directory.
    pub output: PathBuf,

    /// User prompt text.
    pub prompt: String,

    /// Verification script body run with bash; empty always passes.
    pub script: String,

    /// Iteration budget; zero or negative never generates anything.
    pub attempt: i64,

    /// Glob patterns for context files, relative to the config directory.
    pub context: Vec<String>,

    /// Refinement strategy.
    pub refine: RefineStrategy,

    /// Per-script wall clock limit in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Directory of the config file; relative paths resolve against it.
    #[serde(skip)]
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: None,
            output: PathBuf::new(),
            prompt: String::new(),
            script: String::new(),
            attempt: 0,
            context: Vec::new(),
            refine: RefineStrategy::default(),
            timeout_ms: None,
            dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. `xof.yaml` in `start_dir` or the nearest ancestor
    pub fn locate(config_path: Option<&PathBuf>, start_dir: &Path) -> Result<Self> {
        match config_path {
            Some(path) => Self::load(path),
            None => Self::load(Self::lookup(start_dir)?),
        }
    }

    /// Parse a config file and remember its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let content = fs::read_to_string(&path)
            .map_err(|e| XofError::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let mut config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)?
        };
        config.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Walk from `start_dir` up to the filesystem root looking for `xof.yaml`.
    pub fn lookup(start_dir: &Path) -> Result<PathBuf> {
        let start = std::path::absolute(start_dir)?;
        for dir in start.ancestors() {
            let candidate = dir.join(DEFAULT_CONFIG_NAME);
            if candidate.is_file() {
                log::debug!("Found {} in {}", DEFAULT_CONFIG_NAME, dir.display());
                return Ok(candidate);
            }
        }
        Err(XofError::Config(format!("no {} found", DEFAULT_CONFIG_NAME)))
    }

    /// Reject configs the loop cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(XofError::Config("output must be set".to_string()));
        }
        Ok(())
    }

    /// Model to use, defaulting when unset.
    pub fn model(&self) -> &str {
        if self.model.is_empty() { DEFAULT_MODEL } else { &self.model }
    }

    /// Absolute output path.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.output)
    }

    /// Language tag the generated code block must carry.
    pub fn language(&self) -> String {
        language_for_path(&self.output_path())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Expand the context patterns into absolute file paths.
    ///
    /// Patterns are expanded in order; each pattern's matches come back
    /// sorted. Directories are skipped.
    pub fn context_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for pattern in &self.context {
            let full = self.dir.join(pattern);
            let matches: Vec<PathBuf> = glob::glob(&full.to_string_lossy())?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();
            if matches.is_empty() {
                log::warn!("Context pattern '{}' matched no files", pattern);
            }
            files.extend(matches);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.attempt, 0);
        assert_eq!(config.refine, RefineStrategy::Direct);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_load_full() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "xof.yaml",
            r#"
model: llama3
host: http://gpu:11434
output: main.go
prompt: Write a hello world program
script: go run main.go
attempt: 3
context:
  - "*.go"
refine: review
timeout_ms: 5000
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.model(), "llama3");
        assert_eq!(config.host.as_deref(), Some("http://gpu:11434"));
        assert_eq!(config.output_path(), dir.path().join("main.go"));
        assert_eq!(config.language(), "go");
        assert_eq!(config.script, "go run main.go");
        assert_eq!(config.attempt, 3);
        assert_eq!(config.refine, RefineStrategy::Review);
        assert_eq!(config.timeout(), Some(Duration::from_millis(5000)));
        assert_eq!(config.dir, dir.path());
    }

    #[test]
    fn test_load_partial_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "output: app.rs\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.language(), "rust");
        assert!(config.context.is_empty());
    }

    #[test]
    fn test_empty_model_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "model: \"\"\noutput: a.py\n");
        assert_eq!(Config::load(&path).unwrap().model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "");
        let config = Config::load(&path).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "attempt: [not, a, number]\n");
        assert!(matches!(Config::load(&path), Err(XofError::Yaml(_))));
    }

    #[test]
    fn test_load_unknown_strategy() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "refine: rewrite\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(XofError::Config(_))));
    }

    #[test]
    fn test_absolute_output_kept() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("out.sh");
        let path = write(dir.path(), "xof.yaml", &format!("output: {}\n", target.display()));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output_path(), target);
        assert_eq!(config.language(), "bash");
    }

    #[test]
    fn test_lookup_walks_up() {
        let dir = TempDir::new().unwrap();
        let config_path = write(dir.path(), "xof.yaml", "output: main.rs\n");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::lookup(&nested).unwrap(), config_path);
        let config = Config::locate(None, &nested).unwrap();
        assert_eq!(config.dir, dir.path());
    }

    #[test]
    fn test_lookup_prefers_nearest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "xof.yaml", "output: outer.rs\n");
        let inner = write(dir.path(), "sub/xof.yaml", "output: inner.rs\n");

        assert_eq!(Config::lookup(&dir.path().join("sub")).unwrap(), inner);
    }

    #[test]
    fn test_locate_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "custom.yaml", "output: x.js\n");
        let config = Config::locate(Some(&path), Path::new("/")).unwrap();
        assert_eq!(config.language(), "javascript");
    }

    #[test]
    fn test_context_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.rs", "b");
        write(dir.path(), "src/a.rs", "a");
        write(dir.path(), "README.md", "readme");
        fs::create_dir_all(dir.path().join("src/nested.rs")).unwrap();
        let path = write(dir.path(), "xof.yaml", "output: main.rs\ncontext:\n  - README.md\n  - \"src/*.rs\"\n");

        let files = Config::load(&path).unwrap().context_files().unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("README.md"),
                dir.path().join("src/a.rs"),
                dir.path().join("src/b.rs"),
            ]
        );
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_context_no_matches() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "output: main.rs\ncontext: [\"*.zig\"]\n");
        assert!(Config::load(&path).unwrap().context_files().unwrap().is_empty());
    }

    #[test]
    fn test_context_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "xof.yaml", "output: main.rs\ncontext: [\"src/[\"]\n");
        let result = Config::load(&path).unwrap().context_files();
        assert!(matches!(result, Err(XofError::Glob(_))));
    }
}
