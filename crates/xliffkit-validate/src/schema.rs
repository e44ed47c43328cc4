//! Schema-shape validator
//!
//! Surface checks against the retained original text. These catch files
//! that parse fine but were written by a tool that got the dialect's
//! envelope wrong. Documents without original text are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use xliffkit_ast::{Dialect, Document};
use xliffkit_core::dialects::{declared_version, root_tag_attributes};
use xliffkit_core::{Diagnostic, ErrorCategory, ErrorType, Severity, Validator};

static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\x{FEFF}?<\?xml\s[^?]*\?>"#).expect("declaration pattern is valid")
});

static ENCODING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bencoding\s*=\s*["']([^"']*)["']"#).expect("encoding pattern is valid")
});

static XMLNS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bxmlns\s*=\s*["']([^"']*)["']"#).expect("namespace pattern is valid")
});

static TRANS_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:trans-unit|bin-unit)\b").expect("1.2 element pattern is valid"));

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:unit|segment|ignorable)\b").expect("2.0 element pattern is valid"));

/// Validates the document envelope in its original text
///
/// # Diagnostic Codes
///
/// - `SHAPE001`: no XML declaration (warning)
/// - `SHAPE002`: declared encoding is not UTF-8 or UTF-16 (warning)
/// - `SHAPE003`: root namespace missing or not the dialect's (minor)
/// - `SHAPE004`: root `version` does not match the dialect (major)
/// - `SHAPE005`: elements of the other XLIFF revision are present (major)
pub struct SchemaShapeValidator;

impl Validator for SchemaShapeValidator {
    fn code(&self) -> &'static str {
        "SHAPE"
    }

    fn name(&self) -> &'static str {
        "schema-shape"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let Some(text) = doc.original_text.as_deref() else {
            tracing::debug!("no original text, schema-shape checks skipped");
            return Vec::new();
        };
        let mut diagnostics = Vec::new();

        match DECLARATION_RE.find(text) {
            None => diagnostics.push(
                Diagnostic::warning(ErrorCategory::Compatibility, "Document has no XML declaration")
                    .with_code("SHAPE001")
                    .with_help("Start the file with <?xml version=\"1.0\" encoding=\"UTF-8\"?>"),
            ),
            Some(declaration) => {
                if let Some(caps) = ENCODING_RE.captures(declaration.as_str()) {
                    let encoding = caps[1].to_ascii_uppercase();
                    if !matches!(encoding.as_str(), "UTF-8" | "UTF8" | "UTF-16" | "UTF16") {
                        diagnostics.push(
                            Diagnostic::warning(
                                ErrorCategory::Encoding,
                                format!("Document declares encoding {}", &caps[1]),
                            )
                            .with_code("SHAPE002")
                            .with_recoverable(true)
                            .with_help("XLIFF files should be UTF-8 encoded"),
                        );
                    }
                }
            }
        }

        let root = root_tag_attributes(text).unwrap_or_default();
        let expected_ns = doc.dialect.namespace();
        match XMLNS_RE.captures(root) {
            Some(caps) if &caps[1] == expected_ns => {}
            found => {
                let message = match found {
                    Some(caps) => format!("Root namespace is '{}'", &caps[1]),
                    None => "Root element declares no namespace".to_string(),
                };
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::SchemaViolation,
                        ErrorCategory::Schema,
                        Severity::Minor,
                        message,
                    )
                    .with_code("SHAPE003")
                    .with_path("xliff")
                    .with_element("xliff")
                    .with_attribute("xmlns")
                    .with_help(format!("Declare xmlns=\"{}\"", expected_ns)),
                );
            }
        }

        let expected_version = doc.dialect.version_attribute();
        if let Some(version) = declared_version(text) {
            if version != expected_version {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::SchemaViolation,
                        ErrorCategory::Schema,
                        Severity::Major,
                        format!(
                            "Root version is {} but the document is {}",
                            version, doc.dialect
                        ),
                    )
                    .with_code("SHAPE004")
                    .with_path("xliff")
                    .with_element("xliff")
                    .with_attribute("version")
                    .with_recoverable(false),
                );
            }
        }

        let foreign = match doc.dialect {
            Dialect::Xliff12 | Dialect::MqXliff => SEGMENT_RE.find(text),
            Dialect::Xliff20 => TRANS_UNIT_RE.find(text),
        };
        if let Some(found) = foreign {
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::SchemaViolation,
                    ErrorCategory::Schema,
                    Severity::Major,
                    format!(
                        "Found {}> which does not belong in {}",
                        found.as_str(),
                        doc.dialect
                    ),
                )
                .with_code("SHAPE005")
                .with_element(found.as_str().trim_start_matches('<')),
            );
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(dialect: Dialect, text: &str) -> Vec<String> {
        let mut doc = Document::new(dialect);
        doc.original_text = Some(text.to_string());
        SchemaShapeValidator
            .validate(&doc)
            .into_iter()
            .map(|d| d.code)
            .collect()
    }

    const V12: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2"><file/></xliff>"#;

    #[test]
    fn test_well_shaped() {
        assert!(check(Dialect::Xliff12, V12).is_empty());
        assert!(check(Dialect::MqXliff, V12).is_empty());
    }

    #[test]
    fn test_skipped_without_text() {
        assert!(SchemaShapeValidator
            .validate(&Document::new(Dialect::Xliff12))
            .is_empty());
    }

    #[test]
    fn test_declaration_and_encoding() {
        let text = V12.replace(r#"<?xml version="1.0" encoding="UTF-8"?>"#, "");
        assert_eq!(check(Dialect::Xliff12, text.trim_start()), vec!["SHAPE001"]);

        let latin = V12.replace("UTF-8", "ISO-8859-1");
        assert_eq!(check(Dialect::Xliff12, &latin), vec!["SHAPE002"]);
    }

    #[test]
    fn test_namespace_and_version() {
        let text = V12.replace(r#" xmlns="urn:oasis:names:tc:xliff:document:1.2""#, "");
        assert_eq!(check(Dialect::Xliff12, &text), vec!["SHAPE003"]);

        let codes = check(Dialect::Xliff20, V12);
        assert_eq!(codes, vec!["SHAPE003", "SHAPE004"]);
    }

    #[test]
    fn test_foreign_elements() {
        let text = V12.replace("<file/>", "<file><body><segment/></body></file>");
        assert_eq!(check(Dialect::Xliff12, &text), vec!["SHAPE005"]);

        let v20 = r#"<?xml version="1.0"?>
<xliff version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0"><file id="f"><unit id="u"><segment/></unit></file></xliff>"#;
        assert!(check(Dialect::Xliff20, v20).is_empty());
    }
}
