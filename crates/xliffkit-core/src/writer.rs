//! Indented XML output
//!
//! Serializers write block-level structure (files, groups, units) one
//! element per line and inline content verbatim, so that whitespace inside
//! `<source>` and `<target>` is never altered.

use xliffkit_ast::{ContentPart, InlineElement};

/// Escape character data
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for double-quoted output
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Builds an XML document as a string
#[derive(Debug, Default)]
pub struct XmlWriter {
    output: String,
    depth: usize,
}

impl XmlWriter {
    /// Create a writer that starts with the XML declaration
    pub fn new() -> Self {
        let mut writer = Self::default();
        writer
            .output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        writer
    }

    /// Open an element on its own line
    pub fn open<'a, I>(&mut self, name: &str, attrs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.indent();
        self.start_tag(name, attrs);
        self.output.push_str(">\n");
        self.depth += 1;
    }

    /// Close the most recent element
    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push_str(">\n");
    }

    /// Write a self-closing element on its own line
    pub fn empty<'a, I>(&mut self, name: &str, attrs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.indent();
        self.start_tag(name, attrs);
        self.output.push_str("/>\n");
    }

    /// Write an element whose text is kept on one line
    pub fn text_element<'a, I>(&mut self, name: &str, attrs: I, text: &str)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.indent();
        self.start_tag(name, attrs);
        self.output.push('>');
        self.output.push_str(&escape_text(text));
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push_str(">\n");
    }

    /// Write an element holding segment content
    ///
    /// `ctype_attr` is the attribute name used for inline content types
    /// (`ctype` in 1.2, `type` in 2.0).
    pub fn content_element<'a, I>(
        &mut self,
        name: &str,
        attrs: I,
        parts: &[ContentPart],
        ctype_attr: &str,
    ) where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.indent();
        self.start_tag(name, attrs);
        self.output.push('>');
        write_parts(&mut self.output, parts, ctype_attr);
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push_str(">\n");
    }

    /// Write pre-serialized markup on its own line
    pub fn raw(&mut self, xml: &str) {
        self.indent();
        self.output.push_str(xml.trim());
        self.output.push('\n');
    }

    /// Finish and return the document
    pub fn finish(self) -> String {
        self.output
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.output.push_str("  ");
        }
    }

    fn start_tag<'a, I>(&mut self, name: &str, attrs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.output.push('<');
        self.output.push_str(name);
        for (key, value) in attrs {
            push_attr(&mut self.output, key, value);
        }
    }
}

/// Serialize content parts to inline markup
pub fn write_parts(out: &mut String, parts: &[ContentPart], ctype_attr: &str) {
    for part in parts {
        match part {
            ContentPart::Text(text) => out.push_str(&escape_text(text)),
            ContentPart::Inline(element) => write_inline(out, element, ctype_attr),
        }
    }
}

fn write_inline(out: &mut String, element: &InlineElement, ctype_attr: &str) {
    let tag = element.kind.tag();
    out.push('<');
    out.push_str(tag);
    if let Some(ref id) = element.id {
        push_attr(out, "id", id);
    }
    if let Some(ref ctype) = element.ctype {
        push_attr(out, ctype_attr, ctype);
    }
    for (key, value) in &element.attributes {
        push_attr(out, key, value);
    }
    if element.content.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    write_parts(out, &element.content, ctype_attr);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{Content, InlineKind};

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_nested_output() {
        let mut writer = XmlWriter::new();
        writer.open("xliff", [("version", "1.2")]);
        writer.empty("file", [("original", "a&b")]);
        writer.close("xliff");
        let xml = writer.finish();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<xliff version=\"1.2\">\n  <file original=\"a&amp;b\"/>\n</xliff>"));
    }

    #[test]
    fn test_inline_content() {
        let mut content = Content::text_only("Press ");
        content.push_inline(
            InlineElement::new(InlineKind::G)
                .with_id("1")
                .with_ctype("bold")
                .with_part(ContentPart::Text("OK".to_string())),
        );
        content.push_inline(InlineElement::new(InlineKind::X).with_id("2"));

        let mut out = String::new();
        write_parts(&mut out, &content.parts, "ctype");
        assert_eq!(out, r#"Press <g id="1" ctype="bold">OK</g><x id="2"/>"#);
    }

    #[test]
    fn test_2_0_inline_uses_type() {
        let element = InlineElement::new(InlineKind::Pc).with_id("1").with_ctype("fmt");
        let mut out = String::new();
        write_parts(&mut out, &[ContentPart::Inline(element)], "type");
        assert_eq!(out, r#"<pc id="1" type="fmt"/>"#);
    }
}
