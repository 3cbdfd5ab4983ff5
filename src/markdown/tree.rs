//! Block-level markdown tree.
//!
//! Only the block structure matters here: containers (block quotes, lists)
//! are parsed recursively so fences nested inside them are found, and leaf
//! blocks keep just enough text to be useful. Inline markup is not parsed.
//!
//! Lines are carried with their original terminators so fenced code content
//! is reproduced byte for byte.

/// A block node. The variant is the node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document(Vec<Node>),
    BlockQuote(Vec<Node>),
    List { ordered: bool, items: Vec<Node> },
    ListItem(Vec<Node>),
    Heading { level: u8, text: String },
    Paragraph(String),
    FencedCode { info: String, content: String },
    IndentedCode(String),
    ThematicBreak,
}

impl Node {
    /// Child nodes in document order (empty for leaf blocks).
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(children) | Node::BlockQuote(children) | Node::ListItem(children) => children,
            Node::List { items, .. } => items,
            Node::Heading { .. }
            | Node::Paragraph(_)
            | Node::FencedCode { .. }
            | Node::IndentedCode(_)
            | Node::ThematicBreak => &[],
        }
    }
}

/// Deepest container nesting parsed as structure; markers below it are paragraph text.
const MAX_NESTING: usize = 32;

/// Parse a markdown document into a block tree.
pub fn parse(document: &str) -> Node {
    let lines: Vec<&str> = document.split_inclusive('\n').collect();
    Node::Document(parse_blocks(&lines, 0))
}

fn parse_blocks(lines: &[&str], depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut i = 0;
    let containers = depth < MAX_NESTING;

    while i < lines.len() {
        let line = lines[i];

        if is_blank(line) {
            i += 1;
        } else if let Some(fence) = Fence::open(line) {
            let (node, next) = fence.collect(lines, i + 1);
            nodes.push(node);
            i = next;
        } else if indent_width(line) >= 4 {
            let (node, next) = collect_indented(lines, i);
            nodes.push(node);
            i = next;
        } else if let Some(node) = atx_heading(line) {
            nodes.push(node);
            i += 1;
        } else if is_thematic_break(line) {
            nodes.push(Node::ThematicBreak);
            i += 1;
        } else if containers && quote_content(line).is_some() {
            let mut inner = Vec::new();
            while let Some(content) = lines.get(i).and_then(|l| quote_content(l)) {
                inner.push(content);
                i += 1;
            }
            nodes.push(Node::BlockQuote(parse_blocks(&inner, depth + 1)));
        } else if let Some(marker) = ListMarker::parse(line).filter(|_| containers) {
            let (node, next) = collect_list(lines, i, marker, depth);
            nodes.push(node);
            i = next;
        } else {
            let (node, next) = collect_paragraph(lines, i, containers);
            nodes.push(node);
            i = next;
        }
    }

    nodes
}

/// Line without its terminator.
fn body(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_blank(line: &str) -> bool {
    body(line).trim().is_empty()
}

/// Leading whitespace width in columns, tabs advancing to the next multiple of 4.
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - (width % 4),
            _ => break,
        }
    }
    width
}

/// Drop up to `columns` columns of leading whitespace, keeping the rest of the line.
fn strip_columns(line: &str, columns: usize) -> &str {
    let mut width = 0;
    for (idx, c) in line.char_indices() {
        if width >= columns {
            return &line[idx..];
        }
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - (width % 4),
            _ => return &line[idx..],
        }
    }
    &line[line.len()..]
}

struct Fence {
    indent: usize,
    marker: u8,
    len: usize,
    info: String,
}

impl Fence {
    fn open(line: &str) -> Option<Fence> {
        let text = body(line);
        let indent = indent_width(text);
        if indent > 3 {
            return None;
        }
        let rest = text.trim_start_matches([' ', '\t']);
        let marker = *rest.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = rest.bytes().take_while(|&b| b == marker).count();
        if len < 3 {
            return None;
        }
        let info = rest[len..].trim();
        if marker == b'`' && info.contains('`') {
            return None;
        }
        Some(Fence {
            indent,
            marker,
            len,
            info: info.to_string(),
        })
    }

    fn closes(&self, line: &str) -> bool {
        let text = body(line);
        if indent_width(text) > 3 {
            return false;
        }
        let rest = text.trim_start_matches([' ', '\t']);
        let run = rest.bytes().take_while(|&b| b == self.marker).count();
        run >= self.len && rest[run..].trim().is_empty()
    }

    /// Consume content lines from `start` through the closing fence (or the end of input).
    fn collect(self, lines: &[&str], start: usize) -> (Node, usize) {
        let mut content = String::new();
        let mut i = start;
        while i < lines.len() {
            if self.closes(lines[i]) {
                i += 1;
                break;
            }
            content.push_str(strip_columns(lines[i], self.indent));
            i += 1;
        }
        (
            Node::FencedCode {
                info: self.info,
                content,
            },
            i,
        )
    }
}

fn collect_indented(lines: &[&str], start: usize) -> (Node, usize) {
    let mut end = start;
    let mut i = start;
    while i < lines.len() && (is_blank(lines[i]) || indent_width(lines[i]) >= 4) {
        i += 1;
        if !is_blank(lines[i - 1]) {
            end = i;
        }
    }
    let content = lines[start..end].iter().map(|l| strip_columns(l, 4)).collect();
    (Node::IndentedCode(content), end)
}

fn atx_heading(line: &str) -> Option<Node> {
    let text = body(line);
    if indent_width(text) > 3 {
        return None;
    }
    let rest = text.trim_start_matches([' ', '\t']);
    let level = rest.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    let text = after.trim().trim_end_matches('#').trim_end();
    Some(Node::Heading {
        level: level as u8,
        text: text.to_string(),
    })
}

fn is_thematic_break(line: &str) -> bool {
    let text = body(line);
    if indent_width(text) > 3 {
        return false;
    }
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3 && matches!(chars[0], '-' | '*' | '_') && chars.iter().all(|&c| c == chars[0])
}

/// Level of a setext underline (`===` -> 1, `---` -> 2).
fn setext_level(line: &str) -> Option<u8> {
    let text = body(line);
    if indent_width(text) > 3 {
        return None;
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.bytes().all(|b| b == b'=') {
        Some(1)
    } else if trimmed.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

/// Content of a block quote line with the `>` marker and one optional space removed.
fn quote_content(line: &str) -> Option<&str> {
    if indent_width(line) > 3 {
        return None;
    }
    let rest = line.trim_start_matches([' ', '\t']).strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListMarker {
    ordered: bool,
    delimiter: char,
    content_indent: usize,
    content_offset: usize,
}

impl ListMarker {
    fn parse(line: &str) -> Option<ListMarker> {
        let text = body(line);
        let indent = indent_width(text);
        if indent > 3 {
            return None;
        }
        let lead = text.len() - text.trim_start_matches([' ', '\t']).len();
        let rest = &text[lead..];

        let (ordered, delimiter, marker_len) = match rest.chars().next()? {
            c @ ('-' | '+' | '*') => (false, c, 1),
            c if c.is_ascii_digit() => {
                let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                if digits > 9 {
                    return None;
                }
                match rest[digits..].chars().next()? {
                    d @ ('.' | ')') => (true, d, digits + 1),
                    _ => return None,
                }
            }
            _ => return None,
        };

        let after = &rest[marker_len..];
        if after.is_empty() {
            return Some(ListMarker {
                ordered,
                delimiter,
                content_indent: indent + marker_len + 1,
                content_offset: text.len(),
            });
        }
        if !after.starts_with([' ', '\t']) {
            return None;
        }
        let spaces = after.len() - after.trim_start_matches(' ').len();
        let (spaces, skip) = if spaces >= 5 || spaces == 0 { (1, 1) } else { (spaces, spaces) };
        Some(ListMarker {
            ordered,
            delimiter,
            content_indent: indent + marker_len + spaces,
            content_offset: lead + marker_len + skip,
        })
    }

    fn same_list(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.delimiter == other.delimiter
    }
}

fn collect_list(lines: &[&str], start: usize, marker: ListMarker, depth: usize) -> (Node, usize) {
    let mut items = Vec::new();
    let mut i = start;

    loop {
        let Some(current) = lines.get(i).and_then(|l| ListMarker::parse(l)) else {
            break;
        };
        if !current.same_list(&marker) {
            break;
        }

        let mut item_lines = vec![&lines[i][current.content_offset..]];
        let mut end = i + 1;
        let mut j = i + 1;
        while j < lines.len() {
            let line = lines[j];
            if is_blank(line) {
                item_lines.push(strip_columns(line, current.content_indent));
            } else if indent_width(line) >= current.content_indent {
                item_lines.push(strip_columns(line, current.content_indent));
                end = j + 1;
            } else {
                break;
            }
            j += 1;
        }
        item_lines.truncate(end - i);
        items.push(Node::ListItem(parse_blocks(&item_lines, depth + 1)));

        // Blank lines between items keep the list going.
        i = end;
        while i < lines.len() && is_blank(lines[i]) {
            i += 1;
        }
        if !lines.get(i).and_then(|l| ListMarker::parse(l)).is_some_and(|m| m.same_list(&marker)) {
            i = end;
            break;
        }
    }

    (
        Node::List {
            ordered: marker.ordered,
            items,
        },
        i,
    )
}

fn interrupts_paragraph(line: &str, containers: bool) -> bool {
    Fence::open(line).is_some()
        || atx_heading(line).is_some()
        || is_thematic_break(line)
        || (containers && quote_content(line).is_some())
        || (containers && ListMarker::parse(line).is_some_and(|m| m.content_offset < body(line).len()))
}

fn collect_paragraph(lines: &[&str], start: usize, containers: bool) -> (Node, usize) {
    let mut text: Vec<&str> = vec![body(lines[start]).trim()];
    let mut i = start + 1;

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            break;
        }
        if let Some(level) = setext_level(line) {
            return (
                Node::Heading {
                    level,
                    text: text.join("\n"),
                },
                i + 1,
            );
        }
        if interrupts_paragraph(line, containers) {
            break;
        }
        text.push(body(line).trim());
        i += 1;
    }

    (Node::Paragraph(text.join("\n")), i)
}
