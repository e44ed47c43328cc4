//! Language code validator

use once_cell::sync::Lazy;
use regex::Regex;
use xliffkit_ast::Document;
use xliffkit_core::structure::file_path;
use xliffkit_core::{Diagnostic, ErrorCategory, ErrorType, Severity, Validator};

/// Shape of a BCP 47 tag: language, then optional script, region, variants
/// and extensions. Private-use tags (`x-...`) and `i-` grandfathered tags
/// are accepted as well.
static LANGUAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^(?:
            [a-z]{2,3}(?:-[a-z]{3}){0,3}
            (?:-[a-z]{4})?
            (?:-(?:[a-z]{2}|[0-9]{3}))?
            (?:-(?:[a-z0-9]{5,8}|[0-9][a-z0-9]{3}))*
            (?:-[0-9a-wyz](?:-[a-z0-9]{2,8})+)*
            (?:-x(?:-[a-z0-9]{1,8})+)?
          | [a-z]{4,8}
          | x(?:-[a-z0-9]{1,8})+
          | i-[a-z0-9]{2,8}
        )$",
    )
    .expect("language tag pattern is valid")
});

/// Whether a string is shaped like a BCP 47 language tag
///
/// Underscores (`en_US`) are rejected: XLIFF requires hyphens.
pub fn is_valid_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG_RE.is_match(tag)
}

/// Validates source and target language codes
///
/// # Diagnostic Codes
///
/// - `LANG001`: source language is not a language tag (major)
/// - `LANG002`: target language is not a language tag (major)
/// - `LANG003`: source and target language are the same (warning)
///
/// Empty source languages are left to the structural validator.
pub struct LanguageValidator;

impl Validator for LanguageValidator {
    fn code(&self) -> &'static str {
        "LANG"
    }

    fn name(&self) -> &'static str {
        "language"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let (source_attr, target_attr) = if doc.dialect.is_trans_unit_based() {
            ("source-language", "target-language")
        } else {
            ("srcLang", "trgLang")
        };

        for (index, file) in doc.files.iter().enumerate() {
            let path = file_path(doc.dialect, file, index);
            let source = file.source_language.trim();

            if !source.is_empty() && !is_valid_language_tag(source) {
                diagnostics.push(invalid_tag("LANG001", source, source_attr, &path));
            }

            let Some(target) = file.target_language.as_deref().map(str::trim) else {
                continue;
            };
            if target.is_empty() {
                continue;
            }
            if !is_valid_language_tag(target) {
                diagnostics.push(invalid_tag("LANG002", target, target_attr, &path));
            } else if target.eq_ignore_ascii_case(source) {
                diagnostics.push(
                    Diagnostic::warning(
                        ErrorCategory::Content,
                        format!("Source and target language are both '{}'", source),
                    )
                    .with_code("LANG003")
                    .with_path(path.clone())
                    .with_element("file")
                    .with_attribute(target_attr)
                    .with_help("Check that the target language is set correctly"),
                );
            }
        }

        diagnostics
    }
}

fn invalid_tag(code: &str, tag: &str, attribute: &str, path: &str) -> Diagnostic {
    let mut diag = Diagnostic::new(
        ErrorType::InvalidAttribute,
        ErrorCategory::Content,
        Severity::Major,
        format!("'{}' is not a valid language code", tag),
    )
    .with_code(code)
    .with_path(path)
    .with_element("file")
    .with_attribute(attribute);

    diag = if tag.contains('_') {
        diag.with_help(format!("Use hyphens: '{}'", tag.replace('_', "-")))
    } else {
        diag.with_help("Use a BCP 47 language tag such as 'en', 'de-CH' or 'zh-Hant-TW'")
    };
    diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{Dialect, File};

    fn doc(source: &str, target: Option<&str>) -> Document {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", source, "plaintext");
        file.target_language = target.map(str::to_string);
        doc.files.push(file);
        doc
    }

    fn codes(doc: &Document) -> Vec<String> {
        LanguageValidator
            .validate(doc)
            .into_iter()
            .map(|d| d.code)
            .collect()
    }

    #[test]
    fn test_language_tags() {
        for tag in ["en", "EN-us", "de-CH", "zh-Hant-TW", "sr-Latn", "es-419", "x-klingon", "haw"] {
            assert!(is_valid_language_tag(tag), "{}", tag);
        }
        for tag in ["", "e", "en_US", "english-language", "en-", "12"] {
            assert!(!is_valid_language_tag(tag), "{}", tag);
        }
    }

    #[test]
    fn test_valid_pair() {
        assert!(codes(&doc("en", Some("fr-CA"))).is_empty());
        assert!(codes(&doc("en", None)).is_empty());
    }

    #[test]
    fn test_invalid_codes() {
        assert_eq!(codes(&doc("en_US", Some("fr"))), vec!["LANG001"]);
        assert_eq!(codes(&doc("en", Some("??"))), vec!["LANG002"]);

        let diags = LanguageValidator.validate(&doc("en_US", None));
        assert_eq!(diags[0].help.as_deref(), Some("Use hyphens: 'en-US'"));
        assert_eq!(diags[0].location.attribute.as_deref(), Some("source-language"));
    }

    #[test]
    fn test_same_language_warns() {
        let diags = LanguageValidator.validate(&doc("en", Some("EN")));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "LANG003");
        assert!(diags[0].is_warning());
    }

    #[test]
    fn test_empty_source_left_to_structure() {
        assert!(codes(&doc("", None)).is_empty());
    }
}
