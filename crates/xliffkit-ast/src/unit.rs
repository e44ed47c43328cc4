//! Translation units, notes and alternate translations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::{Content, InlineElement};

/// States that mark a unit as approved or finished
const APPROVED_STATES: &[&str] = &["final", "signed-off", "proofread"];

/// States that mark a unit as still needing translation work
const UNTRANSLATED_STATES: &[&str] = &["new", "needs-translation", "initial"];

/// The atomic translatable segment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransUnit {
    /// Unit id, unique within its file
    pub id: String,
    /// Enclosing 2.0 unit id when the unit holds several segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    /// Source text
    pub source: Content,
    /// Target text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Content>,
    /// Lifecycle state, validated per dialect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// State qualifier (1.2) or sub-state (2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_qualifier: Option<String>,
    /// Explicit approval flag (`approved="yes"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    /// Translate flag (`translate="no"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<bool>,
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resname: Option<String>,
    /// Resource type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restype: Option<String>,
    /// 2.0 `<ignorable>` content rather than a `<segment>`
    #[serde(default)]
    pub ignorable: bool,
    /// Attributes without a dedicated field (standard or vendor)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Notes attached to the unit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Candidate translations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_trans: Vec<AltTrans>,
    /// Opaque child elements kept as raw XML
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

/// A free-text note
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    /// Note text
    pub text: String,
    /// Author (`from` in 1.2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Priority, 1 (highest) to 10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Language of the note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// What the note applies to (`source`, `target`, `general`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotates: Option<String>,
    /// Note category (2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A candidate alternate translation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AltTrans {
    /// Match quality, usually a percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_quality: Option<String>,
    /// Tool that produced the candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Origin of the candidate (TM name, MT engine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Candidate type (`proposal`, `tm`, `mt`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_type: Option<String>,
    /// Source text the candidate matched against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Content>,
    /// Candidate translation
    pub target: Content,
    /// Remaining attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl TransUnit {
    /// Create a unit with an id and source text
    pub fn new(id: impl Into<String>, source: impl Into<Content>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Set the target text and state
    pub fn with_target(mut self, target: impl Into<Content>, state: Option<&str>) -> Self {
        self.target = Some(target.into());
        self.state = state.map(str::to_string);
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Add an alternate translation
    pub fn with_alt_trans(mut self, alt: AltTrans) -> Self {
        self.alt_trans.push(alt);
        self
    }

    /// Source as plain text
    pub fn source_text(&self) -> String {
        self.source.text()
    }

    /// Target as plain text, if any
    pub fn target_text(&self) -> Option<String> {
        self.target.as_ref().map(Content::text)
    }

    /// Whether a non-blank target exists
    pub fn has_target(&self) -> bool {
        self.target.as_ref().is_some_and(|t| !t.is_blank())
    }

    /// Inline elements of source then target, in document order
    pub fn inline_elements(&self) -> Vec<&InlineElement> {
        let mut out = self.source.inline_elements();
        if let Some(target) = &self.target {
            out.extend(target.inline_elements());
        }
        out
    }

    /// Words in the source
    pub fn source_word_count(&self) -> usize {
        self.source.word_count()
    }

    /// Words in the target, zero without a target
    pub fn target_word_count(&self) -> usize {
        self.target.as_ref().map_or(0, Content::word_count)
    }

    /// Whether the unit is approved or in a finished state
    pub fn is_approved(&self) -> bool {
        if let Some(approved) = self.approved {
            return approved;
        }
        self.state
            .as_deref()
            .is_some_and(|s| APPROVED_STATES.contains(&s))
    }

    /// Whether the unit still needs a translation
    pub fn needs_translation(&self) -> bool {
        if self.translate == Some(false) || self.ignorable {
            return false;
        }
        if !self.has_target() {
            return true;
        }
        self.state
            .as_deref()
            .is_some_and(|s| UNTRANSLATED_STATES.contains(&s))
    }
}

impl Note {
    /// Create a note with just text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the author
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }
}

impl AltTrans {
    /// Create a candidate from its target text
    pub fn new(target: impl Into<Content>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Set the match quality
    pub fn with_match_quality(mut self, quality: impl Into<String>) -> Self {
        self.match_quality = Some(quality.into());
        self
    }

    /// Set the origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_translation() {
        let unit = TransUnit::new("1", "Hello");
        assert!(unit.needs_translation());

        let unit = TransUnit::new("1", "Hello").with_target("Hola", Some("translated"));
        assert!(!unit.needs_translation());

        let unit = TransUnit::new("1", "Hello").with_target("Hola", Some("new"));
        assert!(unit.needs_translation());

        let mut unit = TransUnit::new("1", "Hello");
        unit.translate = Some(false);
        assert!(!unit.needs_translation());
    }

    #[test]
    fn test_is_approved() {
        assert!(TransUnit::new("1", "a").with_target("b", Some("final")).is_approved());
        assert!(!TransUnit::new("1", "a").with_target("b", Some("translated")).is_approved());

        let mut unit = TransUnit::new("1", "a").with_target("b", Some("final"));
        unit.approved = Some(false);
        assert!(!unit.is_approved());
    }

    #[test]
    fn test_blank_target_is_not_a_target() {
        let unit = TransUnit::new("1", "Hello").with_target("  ", None);
        assert!(!unit.has_target());
        assert_eq!(unit.target_word_count(), 0);
    }

    #[test]
    fn test_note_builder() {
        let note = Note::new("Check length").with_from("reviewer").with_priority(1);
        assert_eq!(note.from.as_deref(), Some("reviewer"));
        assert_eq!(note.priority, Some(1));
    }
}
