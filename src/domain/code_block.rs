//! CodeBlock value type.
//!
//! A CodeBlock pairs a language tag (possibly empty) with the raw bytes of
//! the code. It renders as a fenced markdown block for prompts and can be
//! written to or read back from disk without changing a byte.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// File extensions whose language tag differs from the extension itself.
///
/// Extensions not listed here map to themselves (`go` -> `go`).
pub const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("js", "javascript"),
    ("py", "python"),
    ("sh", "bash"),
];

/// Normalize a file extension to the language tag a model would use.
pub fn language_for_extension(ext: &str) -> String {
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| lang.to_string())
        .unwrap_or_else(|| ext.to_string())
}

/// Language tag expected for a file, derived from its extension.
pub fn language_for_path(path: &Path) -> String {
    let ext = path.extension().map(|e| e.to_string_lossy()).unwrap_or_default();
    language_for_extension(&ext)
}

/// A fenced code block: language tag plus raw content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CodeBlock {
    language: String,
    content: Vec<u8>,
}

impl CodeBlock {
    /// Create a code block from a language tag and raw content
    pub fn new(language: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            language: language.into(),
            content: content.into(),
        }
    }

    /// Read a file as a code block, tagging it by extension
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        Ok(Self::new(language_for_path(path), content))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Replace the file at `path` with this block's content and flush it to disk.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = fs::File::create(path.as_ref())?;
        file.write_all(&self.content)?;
        file.sync_all()
    }

    /// Backtick fence long enough that no run inside the content closes it.
    fn fence(&self) -> String {
        let mut longest = 0;
        let mut run = 0;
        for &b in &self.content {
            if b == b'`' {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        "`".repeat((longest + 1).max(3))
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fence = self.fence();
        let text = self.text();
        write!(f, "{}{}\n{}", fence, self.language, text)?;
        if !text.is_empty() && !text.ends_with('\n') {
            writeln!(f)?;
        }
        write!(f, "{}", fence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_language_for_extension_mapped() {
        assert_eq!(language_for_extension("rs"), "rust");
        assert_eq!(language_for_extension("py"), "python");
        assert_eq!(language_for_extension("js"), "javascript");
        assert_eq!(language_for_extension("sh"), "bash");
    }

    #[test]
    fn test_language_for_extension_passthrough() {
        assert_eq!(language_for_extension("go"), "go");
        assert_eq!(language_for_extension("RS"), "RS");
        assert_eq!(language_for_extension(""), "");
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("/tmp/src/main.rs")), "rust");
        assert_eq!(language_for_path(Path::new("main.go")), "go");
        assert_eq!(language_for_path(Path::new("Makefile")), "");
    }

    #[test]
    fn test_display_adds_newline_before_fence() {
        let block = CodeBlock::new("rust", "fn main() {}");
        assert_eq!(block.to_string(), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_display_keeps_trailing_newline() {
        let block = CodeBlock::new("go", "package main\n");
        assert_eq!(block.to_string(), "```go\npackage main\n```");
    }

    #[test]
    fn test_display_untagged_empty() {
        let block = CodeBlock::new("", "");
        assert_eq!(block.to_string(), "```\n```");
    }

    #[test]
    fn test_display_lengthens_fence_around_backticks() {
        let block = CodeBlock::new("markdown", "```rust\nx\n```\n");
        let rendered = block.to_string();
        assert!(rendered.starts_with("````markdown\n"));
        assert!(rendered.ends_with("\n````"));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(CodeBlock::new("rust", "a"), CodeBlock::new("rust", b"a".to_vec()));
        assert_ne!(CodeBlock::new("rust", "a"), CodeBlock::new("python", "a"));
    }

    #[test]
    fn test_write_then_read_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.rs");
        let block = CodeBlock::new("rust", "fn main() {\n    println!(\"hi\");\n}\n\n\n");

        block.write_to(&path).unwrap();
        let read_back = CodeBlock::from_file(&path).unwrap();

        assert_eq!(read_back, block);
        assert_eq!(read_back.content(), block.content());
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.py");
        fs::write(&path, "a much longer previous file body\n").unwrap();

        CodeBlock::new("python", "print(1)\n").write_to(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "print(1)\n");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = TempDir::new().unwrap();
        assert!(CodeBlock::from_file(dir.path().join("missing.rs")).is_err());
    }
}
