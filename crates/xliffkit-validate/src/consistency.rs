//! Consistency validator
//!
//! Compares files with each other: one job should use one language pair,
//! and the same source text should not be translated two different ways.
//! [`ConsistencyValidator::check_documents`] runs the same checks across
//! several documents of one project.

use std::collections::BTreeMap;

use xliffkit_ast::Document;
use xliffkit_core::structure::{file_path, unit_path};
use xliffkit_core::{Diagnostic, ErrorCategory, Validator};

/// Validates language and translation consistency
///
/// # Diagnostic Codes
///
/// - `CONS001`: files use different source languages (warning)
/// - `CONS002`: files use different target languages (warning)
/// - `CONS003`: identical source text has different translations (warning)
pub struct ConsistencyValidator;

/// Where a file or unit was seen
struct Site {
    document: usize,
    path: String,
}

impl ConsistencyValidator {
    /// Check several documents as one project
    ///
    /// Paths of findings are prefixed with `doc[n]/` when more than one
    /// document is given.
    pub fn check_documents(&self, docs: &[&Document]) -> Vec<Diagnostic> {
        let prefix = |site: &Site| -> String {
            if docs.len() > 1 {
                format!("doc[{}]/{}", site.document, site.path)
            } else {
                site.path.clone()
            }
        };

        let mut sources: BTreeMap<String, Vec<Site>> = BTreeMap::new();
        let mut targets: BTreeMap<String, Vec<Site>> = BTreeMap::new();
        // source text -> target text -> first unit with that translation
        let mut translations: BTreeMap<String, BTreeMap<String, Site>> = BTreeMap::new();

        for (doc_index, doc) in docs.iter().enumerate() {
            for (index, file) in doc.files.iter().enumerate() {
                let path = file_path(doc.dialect, file, index);
                let language = file.source_language.trim().to_ascii_lowercase();
                if !language.is_empty() {
                    sources.entry(language).or_default().push(Site {
                        document: doc_index,
                        path: path.clone(),
                    });
                }
                if let Some(target) = file.target_language.as_deref().map(str::trim) {
                    if !target.is_empty() {
                        targets
                            .entry(target.to_ascii_lowercase())
                            .or_default()
                            .push(Site {
                                document: doc_index,
                                path: path.clone(),
                            });
                    }
                }

                for unit in file.all_trans_units() {
                    let (Some(target), source) = (unit.target_text(), unit.source_text()) else {
                        continue;
                    };
                    if source.trim().is_empty() || target.trim().is_empty() {
                        continue;
                    }
                    translations
                        .entry(source)
                        .or_default()
                        .entry(target)
                        .or_insert_with(|| Site {
                            document: doc_index,
                            path: unit_path(doc.dialect, &path, unit),
                        });
                }
            }
        }

        let mut diagnostics = Vec::new();
        mixed_languages(&sources, "CONS001", "source", &prefix, &mut diagnostics);
        mixed_languages(&targets, "CONS002", "target", &prefix, &mut diagnostics);

        for (source, variants) in &translations {
            if variants.len() < 2 {
                continue;
            }
            let mut sites = variants.values();
            let Some(first) = sites.next() else {
                continue;
            };
            let mut diag = Diagnostic::warning(
                ErrorCategory::Content,
                format!(
                    "\"{}\" is translated {} different ways",
                    source,
                    variants.len()
                ),
            )
            .with_code("CONS003")
            .with_path(prefix(first))
            .with_element("target");
            for (target, site) in variants {
                diag = diag.with_note(format!("\"{}\" at {}", target, prefix(site)));
            }
            diagnostics.push(diag);
        }

        diagnostics
    }
}

fn mixed_languages(
    languages: &BTreeMap<String, Vec<Site>>,
    code: &str,
    side: &str,
    prefix: &dyn Fn(&Site) -> String,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if languages.len() < 2 {
        return;
    }
    let names: Vec<&str> = languages.keys().map(String::as_str).collect();
    // Point at the first file of every language but the most common one
    let Some(dominant) = languages
        .iter()
        .max_by_key(|(_, sites)| sites.len())
        .map(|(language, _)| language)
    else {
        return;
    };

    for (language, sites) in languages {
        if language == dominant {
            continue;
        }
        let Some(site) = sites.first() else {
            continue;
        };
        diagnostics.push(
            Diagnostic::warning(
                ErrorCategory::Content,
                format!(
                    "Files use different {} languages: {}",
                    side,
                    names.join(", ")
                ),
            )
            .with_code(code)
            .with_path(prefix(site))
            .with_element("file")
            .with_note(format!("'{}' here, '{}' elsewhere", language, dominant)),
        );
    }
}

impl Validator for ConsistencyValidator {
    fn code(&self) -> &'static str {
        "CONS"
    }

    fn name(&self) -> &'static str {
        "consistency"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        self.check_documents(&[doc])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{Dialect, File, TransUnit};

    fn file(source: &str, target: &str, units: &[(&str, &str, &str)]) -> File {
        let mut file = File::new("a.txt", source, "plaintext").with_target_language(target);
        for (id, src, tgt) in units {
            file.body
                .push_unit(TransUnit::new(*id, *src).with_target(*tgt, Some("translated")));
        }
        file
    }

    fn doc(files: Vec<File>) -> Document {
        let mut doc = Document::new(Dialect::Xliff12);
        doc.files = files;
        doc
    }

    #[test]
    fn test_consistent_document() {
        let d = doc(vec![
            file("en", "de", &[("1", "Save", "Speichern")]),
            file("en", "de", &[("1", "Save", "Speichern")]),
        ]);
        assert!(ConsistencyValidator.validate(&d).is_empty());
    }

    #[test]
    fn test_mixed_languages() {
        let d = doc(vec![
            file("en", "de", &[]),
            file("en", "de", &[]),
            file("EN", "fr", &[]),
        ]);
        let diags = ConsistencyValidator.validate(&d);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "CONS002");
        assert_eq!(diags[0].location.path.as_deref(), Some("xliff/file[2]"));
        assert!(diags[0].message.contains("de, fr"));
    }

    #[test]
    fn test_divergent_translations() {
        let d = doc(vec![file(
            "en",
            "de",
            &[("1", "Save", "Speichern"), ("2", "Save", "Sichern"), ("3", "Open", "Öffnen")],
        )]);
        let diags = ConsistencyValidator.validate(&d);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "CONS003");
        assert_eq!(diags[0].notes.len(), 2);
        assert!(diags[0].is_warning());
    }

    #[test]
    fn test_across_documents() {
        let a = doc(vec![file("en", "de", &[("1", "Save", "Speichern")])]);
        let b = doc(vec![file("en", "de", &[("9", "Save", "Sichern")])]);
        let diags = ConsistencyValidator.check_documents(&[&a, &b]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "CONS003");
        assert!(diags[0]
            .notes
            .iter()
            .any(|n| n.contains("doc[1]/xliff/file[0]/body/trans-unit[id=9]")));

        assert!(ConsistencyValidator.validate(&a).is_empty());
    }
}
