//! Location tracking in raw text
//!
//! Turns byte offsets reported by the tokenizer into line/column
//! positions, the nearest enclosing element, and a snippet of surrounding
//! text for diagnostics.

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;

use crate::diagnostics::ErrorLocation;

/// Characters of context kept on each side of an offset
const CONTEXT_RADIUS: usize = 40;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z_][\w:.\-]*)(?:\s[^<>]*?)?(/?)>").expect("tag pattern is valid")
});

/// Computes locations in one source text
#[derive(Debug, Clone)]
pub struct LocationTracker<'a> {
    text: &'a str,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
    /// Tag scan, built on the first element lookup
    tags: OnceCell<TagIndex>,
}

/// One scan of the tags in a text
///
/// The open-element stack after each tag is a node in a parent-linked
/// arena, so any offset resolves with a binary search and a walk up.
#[derive(Debug, Clone, Default)]
struct TagIndex {
    /// End offset of each tag, ascending
    ends: Vec<usize>,
    /// Innermost open element after each tag
    tops: Vec<Option<usize>>,
    /// Element name and parent node
    nodes: Vec<(String, Option<usize>)>,
}

impl TagIndex {
    fn build(text: &str) -> Self {
        let mut index = Self::default();
        let mut top = None;
        for caps in TAG_RE.captures_iter(text) {
            let name = &caps[2];
            if !caps[1].is_empty() {
                // Close the nearest open element of that name, if any
                let mut cursor = top;
                while let Some(node) = cursor {
                    let (open, parent) = &index.nodes[node];
                    if open == name {
                        top = *parent;
                        break;
                    }
                    cursor = *parent;
                }
            } else if caps[3].is_empty() {
                index.nodes.push((name.to_string(), top));
                top = Some(index.nodes.len() - 1);
            }
            index.ends.push(caps.get(0).map_or(0, |m| m.end()));
            index.tops.push(top);
        }
        index
    }

    fn open_at(&self, offset: usize) -> Vec<String> {
        let seen = self.ends.partition_point(|&end| end <= offset);
        let mut cursor = seen.checked_sub(1).and_then(|i| self.tops[i]);
        let mut stack = Vec::new();
        while let Some(node) = cursor {
            let (name, parent) = &self.nodes[node];
            stack.push(name.clone());
            cursor = *parent;
        }
        stack.reverse();
        stack
    }
}

impl<'a> LocationTracker<'a> {
    /// Index the line starts of a text
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            text,
            line_starts,
            tags: OnceCell::new(),
        }
    }

    /// 1-indexed line and column (in characters) of a byte offset
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = self.clamp(offset);
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_index];
        let column = self.text[line_start..offset].chars().count() + 1;
        (line_index + 1, column)
    }

    /// Byte offset of a 1-indexed line and column
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let rest = &self.text[start..];
        let mut chars = rest.char_indices();
        let byte = if column <= 1 {
            0
        } else {
            chars.nth(column - 1).map_or(rest.len(), |(i, _)| i)
        };
        Some(start + byte)
    }

    /// Open elements enclosing an offset, outermost first
    ///
    /// Tags ending at or before the offset count; closed ones are dropped.
    pub fn open_elements(&self, offset: usize) -> Vec<String> {
        let offset = self.clamp(offset);
        self.tags
            .get_or_init(|| TagIndex::build(self.text))
            .open_at(offset)
    }

    /// Nearest enclosing element: the last unmatched opening tag
    pub fn enclosing_element(&self, offset: usize) -> Option<String> {
        self.open_elements(offset).pop()
    }

    /// Slash-separated path of open elements
    pub fn element_path(&self, offset: usize) -> Option<String> {
        let stack = self.open_elements(offset);
        if stack.is_empty() {
            None
        } else {
            Some(stack.join("/"))
        }
    }

    /// Text around an offset, with newlines flattened
    pub fn context(&self, offset: usize) -> String {
        let offset = self.clamp(offset);
        let start = self.floor_char_boundary(offset.saturating_sub(CONTEXT_RADIUS));
        let end = self.floor_char_boundary((offset + CONTEXT_RADIUS).min(self.text.len()));
        self.text[start..end]
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect()
    }

    /// Full location for a byte offset
    pub fn locate(&self, offset: usize) -> ErrorLocation {
        let (line, column) = self.line_column(offset);
        ErrorLocation {
            line: Some(line),
            column: Some(column),
            offset: Some(self.clamp(offset)),
            path: self.element_path(offset),
            element: self.enclosing_element(offset),
            attribute: None,
            context: Some(self.context(offset)),
        }
    }

    fn clamp(&self, offset: usize) -> usize {
        self.floor_char_boundary(offset.min(self.text.len()))
    }

    fn floor_char_boundary(&self, mut offset: usize) -> usize {
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
