//! Generic element navigation shared by all dialect parsers

use std::collections::BTreeMap;

use crate::tree::{XmlElement, XmlNode};

/// All attributes of an element as an ordered map
pub fn attributes(element: &XmlElement) -> BTreeMap<String, String> {
    element
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Attributes not named in `known`
///
/// Namespace declarations are left out; serializers write those on the
/// root element only.
pub fn extra_attributes(element: &XmlElement, known: &[&str]) -> BTreeMap<String, String> {
    element
        .attributes
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()) && !is_namespace_declaration(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Attribute value as an owned string
pub fn attr(element: &XmlElement, name: &str) -> Option<String> {
    element.attr(name).map(str::to_string)
}

/// Attribute value, treating an empty string as absent
pub fn non_empty_attr(element: &XmlElement, name: &str) -> Option<String> {
    element
        .attr(name)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// First child element with a given qualified name
pub fn child<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    element.elements().find(|e| e.name == name)
}

/// All child elements with a given qualified name
pub fn children<'a>(element: &'a XmlElement, name: &str) -> Vec<&'a XmlElement> {
    element.elements().filter(|e| e.name == name).collect()
}

/// Whether the element asks for whitespace to be kept
pub fn preserves_space(element: &XmlElement) -> bool {
    element.attr("xml:space") == Some("preserve")
}

/// All descendant text, concatenated
///
/// Trimmed unless `preserve_whitespace` is set or the element carries
/// `xml:space="preserve"`.
pub fn text(element: &XmlElement, preserve_whitespace: bool) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    if preserve_whitespace || preserves_space(element) {
        out
    } else {
        out.trim().to_string()
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(child) => collect_text(child, out),
        }
    }
}

/// Parse an XLIFF yes/no flag
pub fn yes_no(value: Option<&str>) -> Option<bool> {
    match value?.trim() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Render a flag back to yes/no
pub fn yes_no_str(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Whether an attribute name declares a namespace
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// One step of a structural path
///
/// Elements with an id are written `name[id=..]`, others `name[index]`.
pub fn path_segment(element: &XmlElement, index: usize) -> String {
    match element.attr("id") {
        Some(id) if !id.is_empty() => format!("{}[id={}]", element.name, id),
        _ => format!("{}[{}]", element.name, index),
    }
}

/// Tracks the structural path while walking a tree
#[derive(Debug, Clone, Default)]
pub struct PathTracker {
    segments: Vec<String>,
}

impl PathTracker {
    /// Start a path at the root element
    pub fn new(root: &str) -> Self {
        Self {
            segments: vec![root.to_string()],
        }
    }

    /// Enter a child
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Leave the current child
    pub fn pop(&mut self) {
        if self.segments.len() > 1 {
            self.segments.pop();
        }
    }

    /// Current path
    pub fn current(&self) -> String {
        self.segments.join("/")
    }
}
