//! Content validator
//!
//! Looks at what units say rather than how they are shaped: states that
//! contradict the presence of a target, inline codes lost in translation
//! and text that was decoded with the wrong encoding somewhere upstream.

use std::collections::BTreeSet;

use xliffkit_ast::{Content, Document, TransUnit};
use xliffkit_core::structure::{file_path, unit_path};
use xliffkit_core::{Diagnostic, ErrorCategory, ErrorType, Severity, Validator};

/// States claiming that a translation exists
const TRANSLATED_STATES: &[&str] = &[
    "translated",
    "needs-review-translation",
    "needs-review-l10n",
    "needs-review-adaptation",
    "final",
    "signed-off",
    "reviewed",
    "proofread",
];

/// States claiming that no translation exists yet
const UNTRANSLATED_STATES: &[&str] = &["new", "needs-translation", "initial"];

/// UTF-8 read as Latin-1 or Windows-1252
const MOJIBAKE: &[&str] = &[
    "Ã¡", "Ã¤", "Ã¨", "Ã©", "Ã¶", "Ã¼", "Ã±", "Ã§", "Ã¸", "Ã¥", "â€™", "â€œ", "â€“", "â€”", "â€¦",
    "Â ",
];

/// Validates unit content
///
/// # Diagnostic Codes
///
/// - `CONT001`: state claims a translation but the target is missing (minor)
/// - `CONT002`: target present while the state says untranslated (warning)
/// - `CONT003`: text looks mis-decoded or holds control characters (warning)
/// - `CONT004`: inline codes differ between source and target (warning)
pub struct ContentValidator;

impl Validator for ContentValidator {
    fn code(&self) -> &'static str {
        "CONT"
    }

    fn name(&self) -> &'static str {
        "content"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (index, file) in doc.files.iter().enumerate() {
            let file_path = file_path(doc.dialect, file, index);
            for unit in file.all_trans_units() {
                let path = unit_path(doc.dialect, &file_path, unit);
                check_state(unit, &path, &mut diagnostics);
                check_encoding(&unit.source, "source", &path, &mut diagnostics);
                if let Some(ref target) = unit.target {
                    check_encoding(target, "target", &path, &mut diagnostics);
                    check_inline_codes(unit, target, &path, &mut diagnostics);
                }
            }
        }
        diagnostics
    }
}

fn check_state(unit: &TransUnit, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(state) = unit.state.as_deref() else {
        return;
    };
    let has_target = unit.target.as_ref().is_some_and(|t| !t.is_blank());

    if TRANSLATED_STATES.contains(&state) && !has_target {
        diagnostics.push(
            Diagnostic::new(
                ErrorType::MissingElement,
                ErrorCategory::Content,
                Severity::Minor,
                format!("Unit '{}' is marked {} but has no target", unit.id, state),
            )
            .with_code("CONT001")
            .with_path(path)
            .with_element("target")
            .with_help("Add the translation or reset the state"),
        );
    } else if UNTRANSLATED_STATES.contains(&state) && has_target {
        diagnostics.push(
            Diagnostic::warning(
                ErrorCategory::Content,
                format!("Unit '{}' has a target but is marked {}", unit.id, state),
            )
            .with_code("CONT002")
            .with_path(path)
            .with_element("target")
            .with_attribute("state"),
        );
    }
}

fn check_encoding(content: &Content, element: &str, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let text = content.text();
    let reason = if text.contains('\u{FFFD}') {
        Some("contains the replacement character U+FFFD".to_string())
    } else if let Some(found) = MOJIBAKE.iter().find(|m| text.contains(*m)) {
        Some(format!("contains '{}', typical of UTF-8 read as Windows-1252", found))
    } else {
        text.chars()
            .find(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
            .map(|c| format!("contains control character U+{:04X}", c as u32))
    };

    if let Some(reason) = reason {
        diagnostics.push(
            Diagnostic::warning(
                ErrorCategory::Encoding,
                format!("The {} text {}", element, reason),
            )
            .with_code("CONT003")
            .with_path(path)
            .with_element(element)
            .with_recoverable(true)
            .with_help("Re-export the file as UTF-8 from the source tool"),
        );
    }
}

fn check_inline_codes(
    unit: &TransUnit,
    target: &Content,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if target.is_blank() {
        return;
    }
    let ids = |content: &Content| -> BTreeSet<String> {
        content
            .inline_elements()
            .into_iter()
            .filter_map(|e| e.id.clone())
            .collect()
    };
    let source_ids = ids(&unit.source);
    let target_ids = ids(target);
    if source_ids == target_ids {
        return;
    }

    let missing: Vec<_> = source_ids.difference(&target_ids).cloned().collect();
    let extra: Vec<_> = target_ids.difference(&source_ids).cloned().collect();
    let mut diag = Diagnostic::warning(
        ErrorCategory::Content,
        format!("Inline codes of unit '{}' differ between source and target", unit.id),
    )
    .with_code("CONT004")
    .with_path(path)
    .with_element("target");
    if !missing.is_empty() {
        diag = diag.with_note(format!("missing in target: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        diag = diag.with_note(format!("only in target: {}", extra.join(", ")));
    }
    diagnostics.push(diag);
}
