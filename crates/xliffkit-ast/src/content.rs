//! Segment content and inline markup
//!
//! Source and target text is stored as an ordered run of plain text and
//! inline elements so that embedded codes keep their position on a round
//! trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text of a source, target or alternate translation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    /// Text and inline elements in document order
    pub parts: Vec<ContentPart>,
}

/// One piece of segment content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPart {
    /// Plain text
    Text(String),
    /// An embedded markup span
    Inline(InlineElement),
}

/// Inline element kinds across all dialects
///
/// 1.2 and MQXLIFF use `g x bx ex bpt ept ph it sub mrk`;
/// 2.0 uses `cp ph pc sc ec mrk sm em`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineKind {
    G,
    X,
    Bx,
    Ex,
    Bpt,
    Ept,
    Ph,
    It,
    Sub,
    Mrk,
    Cp,
    Pc,
    Sc,
    Ec,
    Sm,
    Em,
}

/// A markup span inside source or target text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineElement {
    /// Element kind
    pub kind: InlineKind,
    /// Element id (`id` attribute)
    pub id: Option<String>,
    /// Content type (`ctype` in 1.2, `type` in 2.0)
    pub ctype: Option<String>,
    /// Remaining attributes, in name order
    pub attributes: BTreeMap<String, String>,
    /// Nested content (paired elements and native-code holders)
    pub content: Vec<ContentPart>,
}

impl InlineKind {
    /// Kinds valid in 1.2 and MQXLIFF documents
    pub const XLIFF12: [InlineKind; 10] = [
        InlineKind::G,
        InlineKind::X,
        InlineKind::Bx,
        InlineKind::Ex,
        InlineKind::Bpt,
        InlineKind::Ept,
        InlineKind::Ph,
        InlineKind::It,
        InlineKind::Sub,
        InlineKind::Mrk,
    ];

    /// Kinds valid in 2.0 documents
    pub const XLIFF20: [InlineKind; 8] = [
        InlineKind::Cp,
        InlineKind::Ph,
        InlineKind::Pc,
        InlineKind::Sc,
        InlineKind::Ec,
        InlineKind::Mrk,
        InlineKind::Sm,
        InlineKind::Em,
    ];

    /// Element name as written in markup
    pub fn tag(self) -> &'static str {
        match self {
            InlineKind::G => "g",
            InlineKind::X => "x",
            InlineKind::Bx => "bx",
            InlineKind::Ex => "ex",
            InlineKind::Bpt => "bpt",
            InlineKind::Ept => "ept",
            InlineKind::Ph => "ph",
            InlineKind::It => "it",
            InlineKind::Sub => "sub",
            InlineKind::Mrk => "mrk",
            InlineKind::Cp => "cp",
            InlineKind::Pc => "pc",
            InlineKind::Sc => "sc",
            InlineKind::Ec => "ec",
            InlineKind::Sm => "sm",
            InlineKind::Em => "em",
        }
    }

    /// Look up a kind by element name
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "g" => InlineKind::G,
            "x" => InlineKind::X,
            "bx" => InlineKind::Bx,
            "ex" => InlineKind::Ex,
            "bpt" => InlineKind::Bpt,
            "ept" => InlineKind::Ept,
            "ph" => InlineKind::Ph,
            "it" => InlineKind::It,
            "sub" => InlineKind::Sub,
            "mrk" => InlineKind::Mrk,
            "cp" => InlineKind::Cp,
            "pc" => InlineKind::Pc,
            "sc" => InlineKind::Sc,
            "ec" => InlineKind::Ec,
            "sm" => InlineKind::Sm,
            "em" => InlineKind::Em,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether nested text of this kind is translatable text
    ///
    /// Native-code holders (`bpt ept ph it` in 1.2) carry original markup,
    /// not translatable text.
    pub fn contributes_text(self) -> bool {
        matches!(self, InlineKind::G | InlineKind::Mrk | InlineKind::Pc)
    }

    /// Whether the kind never has content
    pub fn is_standalone(self) -> bool {
        matches!(
            self,
            InlineKind::X
                | InlineKind::Bx
                | InlineKind::Ex
                | InlineKind::Cp
                | InlineKind::Sc
                | InlineKind::Ec
                | InlineKind::Sm
                | InlineKind::Em
        )
    }
}

impl InlineElement {
    /// Create an inline element with no attributes or content
    pub fn new(kind: InlineKind) -> Self {
        Self {
            kind,
            id: None,
            ctype: None,
            attributes: BTreeMap::new(),
            content: Vec::new(),
        }
    }

    /// Set the element id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the content type
    pub fn with_ctype(mut self, ctype: impl Into<String>) -> Self {
        self.ctype = Some(ctype.into());
        self
    }

    /// Set an extra attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a nested content part
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.content.push(part);
        self
    }

    /// Translatable text carried by this element
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.kind == InlineKind::Cp {
            if let Some(ch) = self
                .attributes
                .get("hex")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .and_then(char::from_u32)
            {
                out.push(ch);
            }
            return;
        }
        if self.kind.contributes_text() {
            collect_parts_text(&self.content, out);
        }
    }
}

impl Content {
    /// Create empty content
    pub fn new() -> Self {
        Self::default()
    }

    /// Create content holding a single run of text
    pub fn text_only(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            parts: vec![ContentPart::Text(text)],
        }
    }

    /// Append text, merging with a trailing text part
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(ContentPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(ContentPart::Text(text.to_string()));
        }
    }

    /// Append an inline element
    pub fn push_inline(&mut self, element: InlineElement) {
        self.parts.push(ContentPart::Inline(element));
    }

    /// Plain translatable text with inline codes removed
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_parts_text(&self.parts, &mut out);
        out
    }

    /// Whether the content has no translatable text
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Whether there are no parts at all
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All inline elements in document order, nested ones included
    pub fn inline_elements(&self) -> Vec<&InlineElement> {
        let mut out = Vec::new();
        collect_inline(&self.parts, &mut out);
        out
    }

    /// Number of whitespace-separated words in the text
    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    /// Trim leading whitespace of the first text part and trailing
    /// whitespace of the last one
    pub fn trim(mut self) -> Self {
        if let Some(ContentPart::Text(first)) = self.parts.first_mut() {
            *first = first.trim_start().to_string();
        }
        if let Some(ContentPart::Text(last)) = self.parts.last_mut() {
            *last = last.trim_end().to_string();
        }
        self.parts
            .retain(|p| !matches!(p, ContentPart::Text(t) if t.is_empty()));
        self
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::text_only(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::text_only(text)
    }
}

fn collect_parts_text(parts: &[ContentPart], out: &mut String) {
    for part in parts {
        match part {
            ContentPart::Text(text) => out.push_str(text),
            ContentPart::Inline(element) => element.collect_text(out),
        }
    }
}

fn collect_inline<'a>(parts: &'a [ContentPart], out: &mut Vec<&'a InlineElement>) {
    for part in parts {
        if let ContentPart::Inline(element) = part {
            out.push(element);
            collect_inline(&element.content, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_skips_native_codes() {
        let mut content = Content::text_only("Click ");
        content.push_inline(
            InlineElement::new(InlineKind::Bpt)
                .with_id("1")
                .with_part(ContentPart::Text("<b>".to_string())),
        );
        content.push_text("here");
        content.push_inline(
            InlineElement::new(InlineKind::Ept)
                .with_id("1")
                .with_part(ContentPart::Text("</b>".to_string())),
        );
        assert_eq!(content.text(), "Click here");
        assert_eq!(content.inline_elements().len(), 2);
    }

    #[test]
    fn test_paired_text_is_kept() {
        let mut content = Content::new();
        content.push_inline(
            InlineElement::new(InlineKind::G)
                .with_id("1")
                .with_part(ContentPart::Text("bold".to_string())),
        );
        assert_eq!(content.text(), "bold");
    }

    #[test]
    fn test_code_point() {
        let mut content = Content::text_only("a");
        content.push_inline(InlineElement::new(InlineKind::Cp).with_attribute("hex", "0062"));
        assert_eq!(content.text(), "ab");
    }

    #[test]
    fn test_push_text_merges() {
        let mut content = Content::new();
        content.push_text("Hello");
        content.push_text(" world");
        assert_eq!(content.parts.len(), 1);
        assert_eq!(content.word_count(), 2);
    }

    #[test]
    fn test_trim() {
        let content = Content::text_only("  padded  ").trim();
        assert_eq!(content.text(), "padded");
        assert!(Content::text_only("   ").trim().is_empty());
    }

    #[test]
    fn test_kind_tags() {
        for kind in InlineKind::XLIFF12.iter().chain(InlineKind::XLIFF20.iter()) {
            assert_eq!(InlineKind::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(InlineKind::from_tag("span"), None);
    }
}
