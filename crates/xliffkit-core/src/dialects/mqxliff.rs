//! memoQ MQXLIFF
//!
//! A superset of XLIFF 1.2 with attributes and elements in the `mq`
//! namespace. Vendor data stays on its entity for round-trip and is also
//! listed in the document metadata under `vendor:<path>@<attribute>` and
//! `vendor:<path>/<element>` keys. Normalization removes all of it and
//! returns a plain 1.2 document.

use xliffkit_ast::{Dialect, Document};

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};
use crate::dialects::{
    common, for_each_unit_mut, has_mq_markers, looks_like_1_2, strip_names, units_with_file,
};
use crate::error::Result;
use crate::navigate::{path_segment, PathTracker};
use crate::parser::{ParseContext, XliffParser};
use crate::states::StatePolicy;
use crate::tree::XmlElement;

/// memoQ namespace URI
pub const MQ_NAMESPACE: &str = "MQXliff";

/// Prefix bound to [`MQ_NAMESPACE`]
pub const MQ_PREFIX: &str = "mq";

/// Prefix of vendor keys in `Document::metadata`
pub const VENDOR_KEY_PREFIX: &str = "vendor:";

/// Segment statuses written by memoQ in `mq:status`
pub const MQ_STATUSES: [&str; 9] = [
    "NotStarted",
    "Editing",
    "PartiallyEdited",
    "Pretranslated",
    "MachineTranslated",
    "ManuallyConfirmed",
    "Reviewer1Confirmed",
    "Reviewer2Confirmed",
    "Rejected",
];

/// Parser for memoQ MQXLIFF
#[derive(Debug, Clone, Copy, Default)]
pub struct MqXliffParser {
    state_policy: StatePolicy,
}

impl MqXliffParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report unknown states according to a policy
    pub fn with_state_policy(mut self, policy: StatePolicy) -> Self {
        self.state_policy = policy;
        self
    }
}

fn is_vendor_name(name: &str) -> bool {
    name.strip_prefix(MQ_PREFIX)
        .is_some_and(|rest| rest.starts_with(':'))
}

impl XliffParser for MqXliffParser {
    fn dialect(&self) -> Dialect {
        Dialect::MqXliff
    }

    fn detect_version(&self, text: &str) -> bool {
        looks_like_1_2(text) && has_mq_markers(text)
    }

    fn parse_document(&self, root: &XmlElement, ctx: &mut ParseContext<'_>) -> Result<Document> {
        let mut doc = common::read_document(Dialect::MqXliff, root, ctx);
        let mut path = PathTracker::new(&root.name);
        collect_vendor_data(root, &mut path, &mut doc);
        tracing::debug!(
            entries = doc.metadata.keys().filter(|k| k.starts_with(VENDOR_KEY_PREFIX)).count(),
            "vendor data recorded"
        );
        Ok(doc)
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        common::write_document(
            document,
            Dialect::MqXliff,
            &[("xmlns:mq", MQ_NAMESPACE)],
        )
    }

    /// Remove vendor data, map `proofread` to `signed-off`, return 1.2
    fn normalize_document(&self, document: &Document) -> Document {
        let mut doc = document.clone();
        doc.dialect = Dialect::Xliff12;
        doc.version = "1.2".to_string();
        strip_names(&mut doc, &|name| name == "xmlns:mq" || is_vendor_name(name));
        doc.metadata
            .retain(|key, _| !key.starts_with(VENDOR_KEY_PREFIX));
        for file in &mut doc.files {
            for_each_unit_mut(&mut file.body.items, &mut |unit| {
                if unit.state.as_deref() == Some("proofread") {
                    unit.state = Some("signed-off".to_string());
                }
            });
        }
        doc
    }

    fn validate_version_specific(&self, document: &Document) -> Vec<Diagnostic> {
        let mut diagnostics =
            common::check_common(document, Dialect::MqXliff, self.state_policy, "MQ");

        if document.attributes.get("xmlns:mq").map(String::as_str) != Some(MQ_NAMESPACE) {
            diagnostics.push(
                Diagnostic::warning(
                    ErrorCategory::Schema,
                    "MQXLIFF document does not declare xmlns:mq=\"MQXliff\"",
                )
                .with_code("MQ010")
                .with_path("xliff")
                .with_element("xliff")
                .with_attribute("xmlns:mq"),
            );
        }

        for (file_index, unit) in units_with_file(document) {
            let path = format!("xliff/file[{}]/body/trans-unit[id={}]", file_index, unit.id);

            if let Some(percent) = unit.attributes.get("mq:percent") {
                let valid = percent
                    .trim()
                    .parse::<u32>()
                    .is_ok_and(|p| p <= 101);
                if !valid {
                    diagnostics.push(
                        Diagnostic::new(
                            ErrorType::InvalidAttribute,
                            ErrorCategory::Content,
                            Severity::Minor,
                            format!("mq:percent \"{}\" is not a match rate between 0 and 101", percent),
                        )
                        .with_code("MQ011")
                        .with_path(path.clone())
                        .with_element("trans-unit")
                        .with_attribute("mq:percent"),
                    );
                }
            }

            if let Some(status) = unit.attributes.get("mq:status") {
                if !MQ_STATUSES.contains(&status.as_str()) {
                    diagnostics.push(
                        Diagnostic::warning(
                            ErrorCategory::Compatibility,
                            format!("Unknown memoQ status \"{}\"", status),
                        )
                        .with_code("MQ012")
                        .with_path(path)
                        .with_element("trans-unit")
                        .with_attribute("mq:status"),
                    );
                }
            }
        }

        diagnostics
    }
}

/// Record every `mq:` attribute and element of a tree in the metadata
fn collect_vendor_data(element: &XmlElement, path: &mut PathTracker, doc: &mut Document) {
    for (name, value) in &element.attributes {
        if is_vendor_name(name) {
            doc.set_metadata(
                format!("{}{}@{}", VENDOR_KEY_PREFIX, path.current(), name),
                value.clone(),
            );
        }
    }
    for (index, child) in element.elements().enumerate() {
        let segment = match child.name.as_str() {
            "header" | "body" => child.name.clone(),
            _ => path_segment(child, index),
        };
        if child.prefix() == Some(MQ_PREFIX) {
            doc.set_metadata(
                format!("{}{}/{}", VENDOR_KEY_PREFIX, path.current(), segment),
                child.to_xml(),
            );
            continue;
        }
        path.push(segment);
        collect_vendor_data(child, path, doc);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:mq="MQXliff">
  <file original="doc.docx" source-language="en" target-language="fr" datatype="x-docx">
    <header><mq:documentinfo mq:name="doc"/><tool tool-id="mq" tool-name="memoQ" mq:build="9.14"/></header>
    <body>
      <trans-unit id="1" mq:status="ManuallyConfirmed" mq:percent="100">
        <source><g id="1" mq:fmt="bold">Yes</g></source>
        <target state="proofread"><g id="1" mq:fmt="bold">Oui</g></target>
        <mq:historical-unit mq:lastchangedby="anna"/>
      </trans-unit>
      <bin-unit id="b1" mime-type="image/png" mq:locked="true"><bin-source><external-file href="logo.png"/></bin-source></bin-unit>
    </body>
  </file>
</xliff>"#;

    #[test]
    fn test_vendor_data_in_metadata() {
        let result = MqXliffParser::new().parse(SAMPLE, &ParseOptions::default());
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        let doc = result.document.unwrap();
        assert_eq!(
            doc.get_metadata("vendor:xliff/file[0]/body/trans-unit[id=1]@mq:status"),
            Some("ManuallyConfirmed")
        );
        assert!(doc
            .get_metadata("vendor:xliff/file[0]/body/trans-unit[id=1]/mq:historical-unit[2]")
            .is_some());
        assert!(doc
            .get_metadata("vendor:xliff/file[0]/header/mq:documentinfo[0]")
            .is_some());
        let unit = doc.all_trans_units()[0];
        assert_eq!(unit.state.as_deref(), Some("proofread"));
        assert!(unit.is_approved());
        assert_eq!(unit.extensions.len(), 1);
    }

    #[test]
    fn test_normalize_returns_plain_1_2() {
        let parser = MqXliffParser::new();
        let doc = parser.parse(SAMPLE, &ParseOptions::default()).document.unwrap();
        let normalized = parser.normalize_document(&doc);

        assert_eq!(normalized.dialect, Dialect::Xliff12);
        assert!(normalized.metadata.keys().all(|k| !k.starts_with("vendor:")));
        let unit = normalized.all_trans_units()[0];
        assert_eq!(unit.state.as_deref(), Some("signed-off"));
        assert!(unit.extensions.is_empty());
        for inline in unit.source.inline_elements() {
            assert!(inline.attributes.keys().all(|k| !k.starts_with("mq:")));
        }
        assert_eq!(unit.target_text().as_deref(), Some("Oui"));

        let xml = crate::dialects::Xliff12Parser::new()
            .serialize(&normalized)
            .unwrap();
        assert!(!xml.contains("mq:"), "{}", xml);
        assert!(xml.contains(r#"<bin-unit id="b1" mime-type="image/png">"#));
        assert!(xml.contains(r#"tool-name="memoQ""#));
    }

    #[test]
    fn test_round_trip_keeps_vendor_data() {
        let parser = MqXliffParser::new();
        let options = ParseOptions::default();
        let doc = parser.parse(SAMPLE, &options).document.unwrap();
        let xml = parser.serialize(&doc).unwrap();
        assert!(xml.contains("xmlns:mq=\"MQXliff\""));
        assert!(xml.contains("mq:status=\"ManuallyConfirmed\""));
        assert!(parser.detect_version(&xml));

        let again = parser.parse(&xml, &options).document.unwrap();
        assert_eq!(again.all_trans_units()[0].target_text().as_deref(), Some("Oui"));
        assert_eq!(again.all_trans_units()[0].state.as_deref(), Some("proofread"));
    }

    #[test]
    fn test_vendor_checks() {
        let text = SAMPLE
            .replace("mq:percent=\"100\"", "mq:percent=\"150\"")
            .replace("ManuallyConfirmed", "Whatever");
        let result = MqXliffParser::new().parse(&text, &ParseOptions::default());
        assert!(result.has_code("MQ011"));
        assert!(result.has_code("MQ012"));
        // Minor and warning findings do not fail the parse
        assert!(result.success);
    }
}
