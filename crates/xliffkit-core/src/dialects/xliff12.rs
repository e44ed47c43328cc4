//! XLIFF 1.2

use xliffkit_ast::{Dialect, Document};

use crate::diagnostics::Diagnostic;
use crate::dialects::{common, is_foreign_name, looks_like_1_2, strip_names};
use crate::error::Result;
use crate::parser::{ParseContext, XliffParser};
use crate::states::StatePolicy;
use crate::tree::XmlElement;

/// Parser for trans-unit based XLIFF 1.2
#[derive(Debug, Clone, Copy, Default)]
pub struct Xliff12Parser {
    state_policy: StatePolicy,
}

impl Xliff12Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report unknown states according to a policy
    pub fn with_state_policy(mut self, policy: StatePolicy) -> Self {
        self.state_policy = policy;
        self
    }
}

impl XliffParser for Xliff12Parser {
    fn dialect(&self) -> Dialect {
        Dialect::Xliff12
    }

    fn detect_version(&self, text: &str) -> bool {
        looks_like_1_2(text)
    }

    fn parse_document(&self, root: &XmlElement, ctx: &mut ParseContext<'_>) -> Result<Document> {
        Ok(common::read_document(Dialect::Xliff12, root, ctx))
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        common::write_document(document, Dialect::Xliff12, &[])
    }

    /// Drop namespaced attributes and elements that are not part of 1.2
    fn normalize_document(&self, document: &Document) -> Document {
        let mut doc = document.clone();
        doc.dialect = Dialect::Xliff12;
        doc.version = "1.2".to_string();
        // Prefixed names include xmlns:* declarations
        strip_names(&mut doc, &is_foreign_name);
        doc
    }

    fn validate_version_specific(&self, document: &Document) -> Vec<Diagnostic> {
        common::check_common(document, Dialect::Xliff12, self.state_policy, "V12")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::parser::ParseOptions;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:x="urn:example">
  <file original="t.txt" source-language="en" target-language="es" datatype="plaintext">
    <body>
      <trans-unit id="1" x:flag="on"><source>Hi</source><target state="final">Hola</target></trans-unit>
      <trans-unit id="2"><source>Bye</source><target state="x-checked">Adiós</target></trans-unit>
    </body>
  </file>
</xliff>"#;

    #[test]
    fn test_parse() {
        let result = Xliff12Parser::new().parse(SAMPLE, &ParseOptions::default());
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        let doc = result.document.unwrap();
        assert_eq!(doc.dialect, Dialect::Xliff12);
        assert_eq!(result.metadata.segment_count, 2);
        assert_eq!(result.metadata.file_count, 1);
        assert!(doc.original_text.is_some());
    }

    #[test]
    fn test_round_trip() {
        let parser = Xliff12Parser::new();
        let options = ParseOptions::default();
        let first = parser.parse(SAMPLE, &options).document.unwrap();
        let xml = parser.serialize(&first).unwrap();
        let second = parser.parse(&xml, &options).document.unwrap();

        let key = |d: &Document| {
            d.all_trans_units()
                .iter()
                .map(|u| (u.id.clone(), u.source_text(), u.target_text(), u.state.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&first), key(&second));
        assert_eq!(
            second.all_trans_units()[0].attributes.get("x:flag").map(String::as_str),
            Some("on")
        );
    }

    #[test]
    fn test_normalize_strips_foreign_names() {
        let parser = Xliff12Parser::new();
        let doc = parser.parse(SAMPLE, &ParseOptions::default()).document.unwrap();
        let normalized = parser.normalize_document(&doc);
        assert!(!normalized.attributes.contains_key("xmlns:x"));
        assert!(normalized.all_trans_units()[0].attributes.is_empty());
        let xml = parser.serialize(&normalized).unwrap();
        assert!(!xml.contains("x:flag"));
        // The original is untouched
        assert!(doc.all_trans_units()[0].attributes.contains_key("x:flag"));
    }

    #[test]
    fn test_strict_states() {
        let text = SAMPLE.replace("x-checked", "checked");
        let lenient = Xliff12Parser::new().parse(&text, &ParseOptions::default());
        assert!(lenient.success);
        assert!(lenient.has_code("V12002"));

        let strict = Xliff12Parser::new()
            .with_state_policy(StatePolicy::Strict)
            .parse(&text, &ParseOptions::default());
        assert!(!strict.success);
        assert_eq!(strict.errors[0].severity, Severity::Major);
    }
}
