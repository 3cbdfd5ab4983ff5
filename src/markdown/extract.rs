//! Walks a parsed markdown tree and collects fenced code blocks.

use log::debug;

use super::tree::{self, Node};
use crate::domain::CodeBlock;

/// Language tag of a fence: the first word of its info string.
pub fn fence_language(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}

/// Extract every fenced code block from a markdown document, in document order.
///
/// Documents without fences yield an empty vector. Fences nested in block
/// quotes and list items are included.
pub fn extract_code_blocks(document: &str) -> Vec<CodeBlock> {
    let root = tree::parse(document);
    let mut blocks = Vec::new();
    let mut stack = vec![&root];

    while let Some(node) = stack.pop() {
        if let Node::FencedCode { info, content } = node {
            blocks.push(CodeBlock::new(fence_language(info), content.as_str()));
        }
        // Reversed so the leftmost child is visited next.
        stack.extend(node.children().iter().rev());
    }

    debug!("Extracted {} code block(s)", blocks.len());
    blocks
}

/// The last block tagged `language`; later blocks supersede earlier ones.
pub fn select_last<'a>(blocks: &'a [CodeBlock], language: &str) -> Option<&'a CodeBlock> {
    blocks.iter().rev().find(|b| b.language() == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT_RESPONSE: &str = r#"Sure! Here is the struct you asked for:

```go
# my_struct_is_awesome.go
package util

type MyStruct struct {
  A string
  B int
}
```

This struct has two fields:

* `A` is a string
* `B` is an int
"#;

    #[test]
    fn test_extract_single_block() {
        let blocks = extract_code_blocks(PROMPT_RESPONSE);
        assert_eq!(
            blocks,
            vec![CodeBlock::new(
                "go",
                "# my_struct_is_awesome.go\npackage util\n\ntype MyStruct struct {\n  A string\n  B int\n}\n"
            )]
        );
    }

    #[test]
    fn test_extract_no_blocks() {
        assert!(extract_code_blocks("").is_empty());
        assert!(extract_code_blocks("# Heading\n\nJust prose, `inline` code only.\n").is_empty());
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let doc = "```a\n1\n```\n\n> ```b\n> 2\n> ```\n\n- item\n\n  ```c\n  3\n  ```\n\n```d\n4\n```\n";
        let langs: Vec<String> = extract_code_blocks(doc)
            .iter()
            .map(|b| b.language().to_string())
            .collect();
        assert_eq!(langs, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_extract_counts_every_fence() {
        let doc = (0..5).map(|n| format!("text {n}\n\n```\n{n}\n```\n\n")).collect::<String>();
        let blocks = extract_code_blocks(&doc);
        assert_eq!(blocks.len(), 5);
        for (n, block) in blocks.iter().enumerate() {
            assert_eq!(block.text(), format!("{n}\n"));
            assert_eq!(block.language(), "");
        }
    }

    #[test]
    fn test_extract_skips_indented_code() {
        let doc = "    not fenced\n\n```rust\nfenced\n```\n";
        let blocks = extract_code_blocks(doc);
        assert_eq!(blocks, vec![CodeBlock::new("rust", "fenced\n")]);
    }

    #[test]
    fn test_extract_is_repeatable() {
        assert_eq!(extract_code_blocks(PROMPT_RESPONSE), extract_code_blocks(PROMPT_RESPONSE));
    }

    #[test]
    fn test_extract_survives_runaway_quote_markers() {
        let doc = format!("{}\n\n```bash\necho ok\n```\n", ">".repeat(100_000));
        let blocks = extract_code_blocks(&doc);
        assert_eq!(blocks, vec![CodeBlock::new("bash", "echo ok\n")]);
    }

    #[test]
    fn test_fence_language_first_word() {
        assert_eq!(fence_language("rust"), "rust");
        assert_eq!(fence_language("python title=\"x.py\""), "python");
        assert_eq!(fence_language(""), "");
    }

    #[test]
    fn test_language_is_case_sensitive() {
        let blocks = extract_code_blocks("```Rust\nfn a() {}\n```\n");
        assert!(select_last(&blocks, "rust").is_none());
        assert!(select_last(&blocks, "Rust").is_some());
    }

    #[test]
    fn test_select_last_prefers_later_block() {
        let doc = "```rust\nfirst\n```\n```python\nother\n```\n```rust\nsecond\n```\n";
        let blocks = extract_code_blocks(doc);
        let chosen = select_last(&blocks, "rust").unwrap();
        assert_eq!(chosen.text(), "second\n");
    }

    #[test]
    fn test_select_last_no_match() {
        let blocks = extract_code_blocks("```js\nx\n```\n");
        assert!(select_last(&blocks, "rust").is_none());
    }
}
