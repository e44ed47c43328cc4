//! Structural validator
//!
//! Required files and attributes, duplicate and missing unit ids, empty
//! sources. The checks are shared with `XliffParser::validate`.

use xliffkit_ast::Document;
use xliffkit_core::structure::check_structure;
use xliffkit_core::{Diagnostic, Validator};

/// Validates the shape every dialect shares
///
/// # Diagnostic Codes
///
/// - `STRUCT001`: no `<file>` (critical)
/// - `STRUCT002`..`STRUCT004`: missing `original`, source language, `datatype`
/// - `STRUCT005`: file without units (warning)
/// - `STRUCT006`: missing unit id
/// - `STRUCT007`: duplicate unit id, reported once per value
/// - `STRUCT008`: 2.0 file without an id
/// - `STRUCT009`: empty source
pub struct StructuralValidator;

impl Validator for StructuralValidator {
    fn code(&self) -> &'static str {
        "STRUCT"
    }

    fn name(&self) -> &'static str {
        "structural"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        check_structure(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{Dialect, File, TransUnit};
    use xliffkit_core::Severity;

    #[test]
    fn test_duplicates_reported_once_per_value() {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", "en", "plaintext");
        for id in ["1", "1", "1", "2", "2"] {
            file.body.push_unit(TransUnit::new(id, "text"));
        }
        doc.files.push(file);

        let diags = StructuralValidator.validate(&doc);
        let duplicates: Vec<_> = diags.iter().filter(|d| d.code == "STRUCT007").collect();
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.iter().all(|d| d.severity == Severity::Major));
    }

    #[test]
    fn test_clean_document() {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", "en", "plaintext");
        file.body.push_unit(TransUnit::new("1", "text"));
        doc.files.push(file);
        assert!(StructuralValidator.validate(&doc).is_empty());
    }
}
