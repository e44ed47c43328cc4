//! Structural checks shared by every dialect
//!
//! These run as part of `XliffParser::validate` and back the structural
//! validator of the validation framework.

use std::collections::BTreeMap;

use xliffkit_ast::{Dialect, Document, File, TransUnit};

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorLocation, ErrorType, Severity};
use crate::location::LocationTracker;

/// Check required files, attributes, ids and sources
pub fn check_structure(doc: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut locator = Locator::new(doc);

    if doc.files.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                ErrorType::MissingElement,
                ErrorCategory::Structural,
                Severity::Critical,
                "Document contains no <file> element",
            )
            .with_code("STRUCT001")
            .with_path("xliff")
            .with_element("file")
            .with_help("Every XLIFF document needs at least one <file>"),
        );
        return diagnostics;
    }

    for (index, file) in doc.files.iter().enumerate() {
        let path = file_path(doc.dialect, file, index);
        check_file_attributes(doc.dialect, file, &path, &mut diagnostics);

        let units = file.body.all_trans_units();
        if units.is_empty() {
            diagnostics.push(
                Diagnostic::warning(ErrorCategory::Structural, "File contains no translation units")
                    .with_code("STRUCT005")
                    .with_path(format!("{}/body", path))
                    .with_element("body"),
            );
            continue;
        }

        check_unit_ids(doc.dialect, &units, &path, &mut locator, &mut diagnostics);

        for unit in &units {
            // Ignorable parts are usually whitespace
            if unit.source.is_blank() && !unit.ignorable {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::MissingElement,
                        ErrorCategory::Content,
                        Severity::Minor,
                        format!("Translation unit '{}' has an empty source", unit.id),
                    )
                    .with_code("STRUCT009")
                    .with_path(unit_path(doc.dialect, &path, unit))
                    .with_element("source")
                    .with_recoverable(false),
                );
            }
        }
    }

    diagnostics
}

fn check_file_attributes(
    dialect: Dialect,
    file: &File,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let missing = |attribute: &str, code: &str, what: &str| {
        Diagnostic::new(
            ErrorType::MissingElement,
            ErrorCategory::Structural,
            Severity::Major,
            format!("File is missing {}", what),
        )
        .with_code(code)
        .with_path(path)
        .with_element("file")
        .with_attribute(attribute)
    };

    if dialect == Dialect::Xliff20 {
        if file.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            diagnostics.push(missing("id", "STRUCT008", "its id"));
        }
        if file.source_language.trim().is_empty() {
            diagnostics.push(missing("srcLang", "STRUCT003", "a source language"));
        }
        return;
    }

    if file.original.trim().is_empty() {
        diagnostics.push(missing("original", "STRUCT002", "the original attribute"));
    }
    if file.source_language.trim().is_empty() {
        diagnostics.push(missing("source-language", "STRUCT003", "a source language"));
    }
    if file.datatype.trim().is_empty() {
        diagnostics.push(missing("datatype", "STRUCT004", "a datatype"));
    }
}

fn check_unit_ids(
    dialect: Dialect,
    units: &[&TransUnit],
    path: &str,
    locator: &mut Locator<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Segment ids only need to be unique inside their unit
    let mut seen: BTreeMap<(Option<&str>, &str), usize> = BTreeMap::new();

    for unit in units {
        if unit.id.trim().is_empty() {
            let location = locator.next("id=\"\"");
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::MissingElement,
                    ErrorCategory::Structural,
                    Severity::Major,
                    "Translation unit is missing id",
                )
                .with_code("STRUCT006")
                .with_location(location)
                .with_path(format!("{}/{}", body_path(dialect, path), unit_tag(dialect)))
                .with_element(unit_tag(dialect))
                .with_attribute("id")
                .with_help("Give every translation unit a unique, non-empty id"),
            );
            continue;
        }

        let count = seen
            .entry((unit.unit_id.as_deref(), unit.id.as_str()))
            .or_insert(0);
        *count += 1;
        // Report each duplicated value once, at its second occurrence
        if *count == 2 {
            let pattern = format!("id=\"{}\"", unit.id);
            locator.next(&pattern);
            let location = locator.next(&pattern);
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::SchemaViolation,
                    ErrorCategory::Structural,
                    Severity::Major,
                    format!("Duplicate translation unit id '{}'", unit.id),
                )
                .with_code("STRUCT007")
                .with_location(location)
                .with_path(unit_path(dialect, path, unit))
                .with_element(unit_tag(dialect))
                .with_attribute("id")
                .with_help("Unit ids must be unique within a file"),
            );
        }
    }
}

/// Finds successive occurrences of a pattern in the original text
struct Locator<'a> {
    text: Option<&'a str>,
    tracker: Option<LocationTracker<'a>>,
    cursors: BTreeMap<String, usize>,
}

impl<'a> Locator<'a> {
    fn new(doc: &'a Document) -> Self {
        let text = doc.original_text.as_deref();
        Self {
            text,
            tracker: text.map(LocationTracker::new),
            cursors: BTreeMap::new(),
        }
    }

    /// Location of the next unvisited occurrence, or an empty location
    fn next(&mut self, pattern: &str) -> ErrorLocation {
        let (Some(text), Some(tracker)) = (self.text, self.tracker.as_ref()) else {
            return ErrorLocation::default();
        };
        let cursor = self.cursors.entry(pattern.to_string()).or_insert(0);
        match text.get(*cursor..).and_then(|rest| rest.find(pattern)) {
            Some(found) => {
                let offset = *cursor + found;
                *cursor = offset + pattern.len();
                let mut location = tracker.locate(offset);
                location.context = None;
                location
            }
            None => ErrorLocation::default(),
        }
    }
}

fn unit_tag(dialect: Dialect) -> &'static str {
    if dialect.is_trans_unit_based() {
        "trans-unit"
    } else {
        "segment"
    }
}

/// Structural path of a file, as used in diagnostics
pub fn file_path(dialect: Dialect, file: &File, index: usize) -> String {
    match (&file.id, dialect) {
        (Some(id), Dialect::Xliff20) if !id.is_empty() => format!("xliff/file[id={}]", id),
        _ => format!("xliff/file[{}]", index),
    }
}

fn body_path(dialect: Dialect, file_path: &str) -> String {
    if dialect.is_trans_unit_based() {
        format!("{}/body", file_path)
    } else {
        file_path.to_string()
    }
}

/// Structural path of a unit below its file's path
pub fn unit_path(dialect: Dialect, file_path: &str, unit: &TransUnit) -> String {
    match (&unit.unit_id, dialect) {
        (Some(unit_id), Dialect::Xliff20) => {
            format!("{}/unit[id={}]/segment[id={}]", file_path, unit_id, unit.id)
        }
        (None, Dialect::Xliff20) => format!("{}/unit[id={}]", file_path, unit.id),
        _ => format!("{}/body/trans-unit[id={}]", file_path, unit.id),
    }
}
