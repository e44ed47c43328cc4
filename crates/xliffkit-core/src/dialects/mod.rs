//! Dialect parsers
//!
//! Three parsers share the document model and the parse pipeline:
//!
//! - [`Xliff12Parser`]: trans-unit based XLIFF 1.2
//! - [`MqXliffParser`]: memoQ's vendor superset of 1.2
//! - [`Xliff20Parser`]: unit/segment based XLIFF 2.0
//!
//! 1.2 and MQXLIFF share their tree reading and writing in `common`.

mod common;
pub mod mqxliff;
pub mod xliff12;
pub mod xliff20;

pub use mqxliff::MqXliffParser;
pub use xliff12::Xliff12Parser;
pub use xliff20::Xliff20Parser;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use xliffkit_ast::{
    BinaryUnit, BodyItem, Content, ContentPart, Dialect, Document, Group, InlineElement,
    InlineKind, TransUnit,
};

use crate::navigate::{self, preserves_space};
use crate::tree::{self, XmlElement, XmlNode};

static ROOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:[\w.-]+:)?xliff\b([^>]*)>").expect("root pattern is valid"));

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bversion\s*=\s*["']([^"']*)["']"#).expect("version pattern is valid")
});

static MQ_NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"xmlns:mq\s*=\s*["']MQXliff["']"#).expect("namespace pattern is valid")
});

static MQ_ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\smq:[\w.-]+\s*=").expect("attribute pattern is valid"));

/// Attributes of the `<xliff>` start tag, as raw text
pub fn root_tag_attributes(text: &str) -> Option<&str> {
    ROOT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Value of the root `version` attribute
pub fn declared_version(text: &str) -> Option<String> {
    let attrs = root_tag_attributes(text)?;
    VERSION_RE.captures(attrs).map(|caps| caps[1].to_string())
}

/// Whether text looks like XLIFF 1.x, vendor supersets included
pub fn looks_like_1_2(text: &str) -> bool {
    let Some(attrs) = root_tag_attributes(text) else {
        return false;
    };
    attrs.contains("urn:oasis:names:tc:xliff:document:1.")
        || declared_version(text).is_some_and(|v| v.starts_with("1."))
}

/// Whether text looks like XLIFF 2.x
pub fn looks_like_2_0(text: &str) -> bool {
    let Some(attrs) = root_tag_attributes(text) else {
        return false;
    };
    attrs.contains("urn:oasis:names:tc:xliff:document:2.")
        || declared_version(text).is_some_and(|v| v.starts_with("2."))
}

/// Whether text carries memoQ markers
pub fn has_mq_markers(text: &str) -> bool {
    MQ_NAMESPACE_RE.is_match(text) || text.contains("<mq:") || MQ_ATTRIBUTE_RE.is_match(text)
}

/// Read segment content
///
/// Inline elements of the given kinds become [`InlineElement`]s; any other
/// element contributes its text. Outer whitespace is trimmed unless
/// `preserve` is set or the element asks for it.
pub(crate) fn read_content(
    element: &XmlElement,
    kinds: &[InlineKind],
    ctype_attr: &str,
    preserve: bool,
) -> Content {
    let mut content = Content::new();
    content.parts = read_parts(element, kinds, ctype_attr);
    if preserve || preserves_space(element) {
        content
    } else {
        content.trim()
    }
}

fn read_parts(element: &XmlElement, kinds: &[InlineKind], ctype_attr: &str) -> Vec<ContentPart> {
    let mut parts: Vec<ContentPart> = Vec::new();
    for node in &element.children {
        match node {
            XmlNode::Text(text) => push_text(&mut parts, text),
            XmlNode::Element(child) => {
                match InlineKind::from_tag(child.local_name()).filter(|k| kinds.contains(k)) {
                    Some(kind) => parts.push(ContentPart::Inline(read_inline(
                        child, kind, kinds, ctype_attr,
                    ))),
                    None => push_text(&mut parts, &navigate::text(child, true)),
                }
            }
        }
    }
    parts
}

fn read_inline(
    element: &XmlElement,
    kind: InlineKind,
    kinds: &[InlineKind],
    ctype_attr: &str,
) -> InlineElement {
    let mut inline = InlineElement::new(kind);
    inline.id = navigate::attr(element, "id");
    inline.ctype = navigate::attr(element, ctype_attr);
    inline.attributes = navigate::extra_attributes(element, &["id", ctype_attr]);
    inline.content = read_parts(element, kinds, ctype_attr);
    inline
}

fn push_text(parts: &mut Vec<ContentPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(ContentPart::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(ContentPart::Text(text.to_string()));
    }
}

/// Whether written content needs `xml:space="preserve"` to survive a reparse
pub(crate) fn needs_preserve(content: &Content) -> bool {
    let text = content.text();
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Qualified name of the root element of a raw XML fragment
pub(crate) fn fragment_name(raw: &str) -> &str {
    let rest = raw.trim_start().trim_start_matches('<');
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Whether an attribute or element name carries a non-`xml` prefix
pub(crate) fn is_foreign_name(name: &str) -> bool {
    match name.split_once(':') {
        Some(("xml", _)) => false,
        Some(_) => true,
        None => false,
    }
}

/// Apply a closure to every unit, nested groups included
pub(crate) fn for_each_unit_mut(items: &mut [BodyItem], f: &mut dyn FnMut(&mut TransUnit)) {
    for item in items {
        match item {
            BodyItem::Unit(unit) => f(unit),
            BodyItem::Group(group) => for_each_unit_mut(&mut group.items, f),
            BodyItem::Binary(_) => {}
        }
    }
}

/// Apply a closure to every group, nested ones included
pub(crate) fn for_each_group_mut(items: &mut [BodyItem], f: &mut dyn FnMut(&mut Group)) {
    for item in items {
        if let BodyItem::Group(group) = item {
            f(group);
            for_each_group_mut(&mut group.items, f);
        }
    }
}

/// Apply a closure to every binary unit, nested groups included
pub(crate) fn for_each_binary_mut(items: &mut [BodyItem], f: &mut dyn FnMut(&mut BinaryUnit)) {
    for item in items {
        match item {
            BodyItem::Binary(binary) => f(binary),
            BodyItem::Group(group) => for_each_binary_mut(&mut group.items, f),
            BodyItem::Unit(_) => {}
        }
    }
}

/// Remove attributes and opaque extensions whose names match `drop`
///
/// Covers root, file, group, unit, alternate-translation and inline
/// attributes. Header and unit extensions are dropped by their root element
/// name. Raw fragments (header skeleton, tool, phase group, extensions and
/// binary units) lose matching attributes and child elements at any depth.
pub(crate) fn strip_names(doc: &mut Document, drop: &dyn Fn(&str) -> bool) {
    let retain = |attrs: &mut BTreeMap<String, String>| attrs.retain(|k, _| !drop(k));

    retain(&mut doc.attributes);
    for file in &mut doc.files {
        retain(&mut file.attributes);
        if let Some(ref mut header) = file.header {
            header.extensions.retain(|raw| !drop(fragment_name(raw)));
            let fragments = [
                &mut header.skeleton,
                &mut header.tool,
                &mut header.phase_group,
            ];
            for raw in fragments.into_iter().flatten() {
                strip_fragment(raw, drop);
            }
            for raw in &mut header.extensions {
                strip_fragment(raw, drop);
            }
        }
        for_each_group_mut(&mut file.body.items, &mut |group| retain(&mut group.attributes));
        for_each_binary_mut(&mut file.body.items, &mut |binary| {
            strip_fragment(&mut binary.raw, drop)
        });
        for_each_unit_mut(&mut file.body.items, &mut |unit| {
            retain(&mut unit.attributes);
            unit.extensions.retain(|raw| !drop(fragment_name(raw)));
            for raw in &mut unit.extensions {
                strip_fragment(raw, drop);
            }
            strip_inline(&mut unit.source.parts, drop);
            if let Some(ref mut target) = unit.target {
                strip_inline(&mut target.parts, drop);
            }
            for alt in &mut unit.alt_trans {
                retain(&mut alt.attributes);
                if let Some(ref mut source) = alt.source {
                    strip_inline(&mut source.parts, drop);
                }
                strip_inline(&mut alt.target.parts, drop);
            }
        });
    }
}

fn strip_inline(parts: &mut [ContentPart], drop: &dyn Fn(&str) -> bool) {
    for part in parts {
        if let ContentPart::Inline(inline) = part {
            inline.attributes.retain(|k, _| !drop(k));
            strip_inline(&mut inline.content, drop);
        }
    }
}

/// Filter a raw fragment in place
///
/// The fragment is rewritten only when something was removed; fragments
/// that do not parse are left as they are.
fn strip_fragment(raw: &mut String, drop: &dyn Fn(&str) -> bool) {
    let mut element = match tree::parse_xml(raw) {
        Ok(element) => element,
        Err(err) => {
            tracing::debug!(error = %err, "raw fragment left unfiltered");
            return;
        }
    };
    if strip_element(&mut element, drop) {
        *raw = element.to_xml();
    }
}

fn strip_element(element: &mut XmlElement, drop: &dyn Fn(&str) -> bool) -> bool {
    let before = element.attributes.len() + element.children.len();
    element.attributes.retain(|(k, _)| !drop(k));
    element
        .children
        .retain(|node| !matches!(node, XmlNode::Element(e) if drop(&e.name)));
    let mut changed = element.attributes.len() + element.children.len() != before;
    for node in &mut element.children {
        if let XmlNode::Element(child) = node {
            changed |= strip_element(child, drop);
        }
    }
    changed
}

/// Attribute pairs borrowed from an ordered map
pub(crate) fn borrowed(attrs: &BTreeMap<String, String>) -> impl Iterator<Item = (&str, &str)> {
    attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

/// Every unit paired with the index of its file
pub(crate) fn units_with_file(doc: &Document) -> Vec<(usize, &TransUnit)> {
    doc.files
        .iter()
        .enumerate()
        .flat_map(|(i, file)| file.body.all_trans_units().into_iter().map(move |u| (i, u)))
        .collect()
}

/// Inline elements whose kind does not belong to a dialect
pub(crate) fn foreign_inline_kinds(unit: &TransUnit, dialect: Dialect) -> Vec<InlineKind> {
    let allowed: &[InlineKind] = if dialect.is_trans_unit_based() {
        &InlineKind::XLIFF12
    } else {
        &InlineKind::XLIFF20
    };
    let mut found: Vec<InlineKind> = Vec::new();
    for element in unit.inline_elements() {
        if !allowed.contains(&element.kind) && !found.contains(&element.kind) {
            found.push(element.kind);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_xml;

    #[test]
    fn test_detection_helpers() {
        let v12 = r#"<?xml version="1.0"?><xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">"#;
        let v20 = r#"<xliff xmlns="urn:oasis:names:tc:xliff:document:2.0" version="2.0" srcLang="en">"#;
        let mq = r#"<xliff version="1.2" xmlns:mq="MQXliff"><file mq:id="1">"#;

        assert_eq!(declared_version(v12).as_deref(), Some("1.2"));
        assert!(looks_like_1_2(v12) && !looks_like_2_0(v12));
        assert!(looks_like_2_0(v20) && !looks_like_1_2(v20));
        assert!(looks_like_1_2(mq) && has_mq_markers(mq));
        assert!(!has_mq_markers(v12));
        assert!(!looks_like_1_2("<html></html>"));
    }

    #[test]
    fn test_read_content_inline_and_trim() {
        let el = parse_xml(r#"<source>  Click <g id="1" ctype="bold">here</g><x id="2"/>  </source>"#).unwrap();
        let content = read_content(&el, &InlineKind::XLIFF12, "ctype", false);
        assert_eq!(content.text(), "Click here");
        let inlines = content.inline_elements();
        assert_eq!(inlines.len(), 2);
        assert_eq!(inlines[0].ctype.as_deref(), Some("bold"));
        assert_eq!(inlines[1].kind, InlineKind::X);
    }

    #[test]
    fn test_unknown_inline_contributes_text() {
        let el = parse_xml(r#"<source>a<pc id="1">b</pc>c</source>"#).unwrap();
        let content = read_content(&el, &InlineKind::XLIFF12, "ctype", false);
        assert_eq!(content.parts, vec![ContentPart::Text("abc".to_string())]);
    }

    #[test]
    fn test_fragment_name() {
        assert_eq!(fragment_name("<mq:history a=\"1\">x</mq:history>"), "mq:history");
        assert_eq!(fragment_name("  <originalData/>"), "originalData");
        assert!(is_foreign_name("mq:status"));
        assert!(!is_foreign_name("xml:lang"));
        assert!(!is_foreign_name("resname"));
    }

    #[test]
    fn test_strip_fragment_filters_nested_names() {
        let drop = |name: &str| name.starts_with("mq:");
        let mut raw = r#"<bin-unit id="b1" mq:locked="true"><bin-source><mq:x/><external-file href="a.png"/></bin-source></bin-unit>"#.to_string();
        strip_fragment(&mut raw, &drop);
        assert_eq!(
            raw,
            r#"<bin-unit id="b1"><bin-source><external-file href="a.png"/></bin-source></bin-unit>"#
        );

        // Nothing to drop: the original text is kept byte for byte
        let mut tool = r#"<tool tool-id="t"  tool-name="T"/>"#.to_string();
        strip_fragment(&mut tool, &drop);
        assert_eq!(tool, r#"<tool tool-id="t"  tool-name="T"/>"#);
    }
}
