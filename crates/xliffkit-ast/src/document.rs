//! Document root, files, headers, bodies and groups
//!
//! This module defines the top-level document structure shared by all
//! dialects. Derived queries walk the body tree recursively.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::stats::{DocumentSummary, WordCountStats};
use crate::unit::{Note, TransUnit};

/// A complete parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Dialect the document was parsed from or will be written as
    pub dialect: Dialect,
    /// Value of the root `version` attribute
    pub version: String,
    /// Root element attributes (namespace declarations included)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Files in document order
    pub files: Vec<File>,
    /// Free-form metadata (vendor captures, tool annotations)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Original text, retained when metadata extraction is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
}

/// One logical source artifact
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct File {
    /// File identifier (required in 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Original file name
    pub original: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    /// Data type of the original (`plaintext`, `html`, ...)
    pub datatype: String,
    /// Tool identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Product name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Product version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    /// Build number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_num: Option<String>,
    /// Attributes without a dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// File header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    /// File body
    pub body: Body,
}

/// File header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Header notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Key/value properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Skeleton element, raw XML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<String>,
    /// Tool element, raw XML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Phase group element, raw XML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_group: Option<String>,
    /// Other header children, raw XML
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

/// File body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// Units, groups and binary units in document order
    pub items: Vec<BodyItem>,
}

/// An item of a body or group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyItem {
    /// A translation unit
    Unit(TransUnit),
    /// A nested group
    Group(Group),
    /// An opaque binary unit
    Binary(BinaryUnit),
}

/// A named, nestable container of units
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    /// Group id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Group name (`resname` in 1.2, `name` in 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Data type override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    /// Resource type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restype: Option<String>,
    /// Translate flag inherited by children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<bool>,
    /// Attributes without a dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Group notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Nested items
    pub items: Vec<BodyItem>,
}

/// An opaque binary unit, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinaryUnit {
    /// Unit id
    pub id: String,
    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// The element as raw XML
    pub raw: String,
}

impl Document {
    /// Create an empty document of a dialect
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            version: dialect.version_attribute().to_string(),
            attributes: BTreeMap::new(),
            files: Vec::new(),
            metadata: BTreeMap::new(),
            original_text: None,
        }
    }

    /// Every translation unit in every file, groups flattened
    pub fn all_trans_units(&self) -> Vec<&TransUnit> {
        self.files
            .iter()
            .flat_map(|f| f.body.all_trans_units())
            .collect()
    }

    /// Number of translation units in the document
    pub fn total_segment_count(&self) -> usize {
        self.all_trans_units().len()
    }

    /// Number of groups at any depth
    pub fn group_count(&self) -> usize {
        self.files.iter().map(|f| count_groups(&f.body.items)).sum()
    }

    /// Word and progress statistics
    pub fn word_count_stats(&self) -> WordCountStats {
        WordCountStats::from_units(self.all_trans_units())
    }

    /// Summary of the document's shape
    pub fn summary(&self) -> DocumentSummary {
        let source_languages: BTreeSet<String> = self
            .files
            .iter()
            .filter(|f| !f.source_language.is_empty())
            .map(|f| f.source_language.clone())
            .collect();
        let target_languages: BTreeSet<String> = self
            .files
            .iter()
            .filter_map(|f| f.target_language.clone())
            .collect();

        DocumentSummary {
            dialect: self.dialect,
            version: self.version.clone(),
            file_count: self.files.len(),
            group_count: self.group_count(),
            segment_count: self.total_segment_count(),
            source_languages: source_languages.into_iter().collect(),
            target_languages: target_languages.into_iter().collect(),
            word_stats: self.word_count_stats(),
            has_original_text: self.original_text.is_some(),
        }
    }

    /// Set a metadata entry
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Get a metadata entry
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }
}

impl File {
    /// Create a file with its required fields
    pub fn new(
        original: impl Into<String>,
        source_language: impl Into<String>,
        datatype: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            source_language: source_language.into(),
            datatype: datatype.into(),
            ..Default::default()
        }
    }

    /// Set the target language
    pub fn with_target_language(mut self, lang: impl Into<String>) -> Self {
        self.target_language = Some(lang.into());
        self
    }

    /// Set the file id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Every translation unit in this file
    pub fn all_trans_units(&self) -> Vec<&TransUnit> {
        self.body.all_trans_units()
    }
}

impl Body {
    /// Append a unit
    pub fn push_unit(&mut self, unit: TransUnit) {
        self.items.push(BodyItem::Unit(unit));
    }

    /// Append a group
    pub fn push_group(&mut self, group: Group) {
        self.items.push(BodyItem::Group(group));
    }

    /// Every translation unit, walking groups at any depth
    pub fn all_trans_units(&self) -> Vec<&TransUnit> {
        let mut out = Vec::new();
        collect_units(&self.items, &mut out);
        out
    }

    /// Whether the body has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Group {
    /// Create an empty group
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Append a unit
    pub fn push_unit(&mut self, unit: TransUnit) {
        self.items.push(BodyItem::Unit(unit));
    }

    /// Append a nested group
    pub fn push_group(&mut self, group: Group) {
        self.items.push(BodyItem::Group(group));
    }

    /// Every translation unit inside this group
    pub fn all_trans_units(&self) -> Vec<&TransUnit> {
        let mut out = Vec::new();
        collect_units(&self.items, &mut out);
        out
    }
}

fn collect_units<'a>(items: &'a [BodyItem], out: &mut Vec<&'a TransUnit>) {
    for item in items {
        match item {
            BodyItem::Unit(unit) => out.push(unit),
            BodyItem::Group(group) => collect_units(&group.items, out),
            BodyItem::Binary(_) => {}
        }
    }
}

fn count_groups(items: &[BodyItem]) -> usize {
    items
        .iter()
        .map(|item| match item {
            BodyItem::Group(group) => 1 + count_groups(&group.items),
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_document() -> Document {
        let mut inner = Group::new("inner");
        inner.push_unit(TransUnit::new("3", "deep unit"));

        let mut outer = Group::new("outer");
        outer.push_unit(TransUnit::new("2", "grouped"));
        outer.push_group(inner);

        let mut file = File::new("a.txt", "en", "plaintext").with_target_language("de");
        file.body.push_unit(TransUnit::new("1", "top level").with_target("oben", Some("translated")));
        file.body.push_group(outer);
        file.body.items.push(BodyItem::Binary(BinaryUnit {
            id: "b1".to_string(),
            mime_type: Some("image/png".to_string()),
            raw: "<bin-unit id=\"b1\"/>".to_string(),
        }));

        let mut doc = Document::new(Dialect::Xliff12);
        doc.files.push(file);
        doc
    }

    #[test]
    fn test_flatten_reaches_nested_groups() {
        let doc = nested_document();
        let ids: Vec<&str> = doc.all_trans_units().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(doc.total_segment_count(), doc.all_trans_units().len());
        assert_eq!(doc.group_count(), 2);
    }

    #[test]
    fn test_summary() {
        let doc = nested_document();
        let summary = doc.summary();
        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.segment_count, 3);
        assert_eq!(summary.source_languages, vec!["en".to_string()]);
        assert_eq!(summary.target_languages, vec!["de".to_string()]);
        assert_eq!(summary.word_stats.translated_units, 1);
        assert!(!summary.has_original_text);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new(Dialect::Xliff20);
        assert_eq!(doc.version, "2.0");
        assert_eq!(doc.total_segment_count(), 0);
        assert!(doc.files.is_empty());
    }

    #[test]
    fn test_metadata() {
        let mut doc = Document::new(Dialect::MqXliff);
        doc.set_metadata("vendor:namespace", "MQXliff");
        assert_eq!(doc.get_metadata("vendor:namespace"), Some("MQXliff"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let doc = nested_document();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"dialect\":\"1.2\""));
        let restored: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, doc);
    }
}
