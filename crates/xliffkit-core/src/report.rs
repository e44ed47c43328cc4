//! User-facing reports
//!
//! Translates technical diagnostics into plain-language explanations with
//! ranked suggestions, and summarizes a set of diagnostics into a verdict.
//! Text produced by internal failures is never shown to the user.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};

/// How hard a suggested fix is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

/// One remediation step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub action: String,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
}

/// A diagnostic rewritten for a non-technical reader
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFriendlyError {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub code: String,
    /// Location in `line:column path` form, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Easiest first
    pub suggestions: Vec<Suggestion>,
}

/// Overall outcome of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    PassWithWarnings,
    Fail,
}

/// Aggregate view over a set of diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub verdict: Verdict,
    pub estimated_fix_minutes: u32,
    /// The most serious problems, translated
    pub top_issues: Vec<UserFriendlyError>,
}

/// Number of issues listed in [`ErrorSummary::top_issues`]
const TOP_ISSUES: usize = 5;

/// Builds user-facing reports
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFriendlyReporter;

impl UserFriendlyReporter {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite one diagnostic
    pub fn translate(&self, diagnostic: &Diagnostic) -> UserFriendlyError {
        let (title, message) = explain(diagnostic);
        let mut suggestions = suggestions_for(diagnostic);
        suggestions.sort_by_key(|s| (s.estimated_minutes, s.difficulty));

        let location = if diagnostic.location.is_unknown() {
            None
        } else {
            Some(diagnostic.location.to_string())
        };

        UserFriendlyError {
            title,
            message,
            severity: diagnostic.severity,
            code: diagnostic.code.clone(),
            location,
            suggestions,
        }
    }

    /// Summarize a set of diagnostics
    pub fn create_summary(&self, diagnostics: &[Diagnostic]) -> ErrorSummary {
        let mut by_severity = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        for diagnostic in diagnostics {
            *by_severity.entry(diagnostic.severity.to_string()).or_insert(0) += 1;
            *by_category.entry(diagnostic.category.to_string()).or_insert(0) += 1;
        }

        let verdict = if diagnostics.iter().any(Diagnostic::is_error) {
            Verdict::Fail
        } else if diagnostics.is_empty() {
            Verdict::Pass
        } else {
            Verdict::PassWithWarnings
        };

        let translated: Vec<UserFriendlyError> =
            diagnostics.iter().map(|d| self.translate(d)).collect();
        let estimated_fix_minutes = translated
            .iter()
            .filter_map(|e| e.suggestions.first())
            .map(|s| s.estimated_minutes)
            .sum();

        let mut top_issues = translated;
        // Stable sort keeps document order within a severity
        top_issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        top_issues.truncate(TOP_ISSUES);

        ErrorSummary {
            total: diagnostics.len(),
            by_severity,
            by_category,
            verdict,
            estimated_fix_minutes,
            top_issues,
        }
    }
}

fn explain(diagnostic: &Diagnostic) -> (String, String) {
    match diagnostic.error_type {
        ErrorType::MalformedInput if diagnostic.category == ErrorCategory::Encoding => (
            "Suspicious characters".to_string(),
            "Some text contains characters that usually come from a wrong character \
             encoding."
                .to_string(),
        ),
        ErrorType::MalformedInput => (
            "The file could not be read".to_string(),
            "The file is not well-formed XML, so its contents cannot be processed. \
             It may be truncated or edited by hand."
                .to_string(),
        ),
        ErrorType::ProcessingFailure => (
            "Processing stopped unexpectedly".to_string(),
            "An internal step failed while processing this file. The file itself may \
             be fine; try again or report the problem."
                .to_string(),
        ),
        ErrorType::UnknownDialect => (
            "Unsupported file format".to_string(),
            "The file does not look like a supported XLIFF version (1.2, 2.0 or \
             MQXLIFF)."
                .to_string(),
        ),
        ErrorType::MissingElement => (
            "Something required is missing".to_string(),
            diagnostic.message.clone(),
        ),
        ErrorType::InvalidAttribute => (
            "A value is not valid".to_string(),
            diagnostic.message.clone(),
        ),
        ErrorType::SchemaViolation => (
            "The file does not follow its format".to_string(),
            diagnostic.message.clone(),
        ),
    }
}

fn suggestions_for(diagnostic: &Diagnostic) -> Vec<Suggestion> {
    let mut out = Vec::new();
    if let Some(ref help) = diagnostic.help {
        out.push(suggestion(help, Difficulty::Easy, 5));
    }

    match (diagnostic.error_type, diagnostic.category) {
        (ErrorType::MalformedInput, ErrorCategory::Encoding) => {
            out.push(suggestion(
                "Re-export the file from the translation tool as UTF-8",
                Difficulty::Easy,
                5,
            ));
            out.push(suggestion(
                "Replace the garbled characters by hand",
                Difficulty::Moderate,
                15,
            ));
        }
        (ErrorType::MalformedInput, _) => {
            out.push(suggestion(
                "Open the file in an XML editor and fix the reported line",
                Difficulty::Moderate,
                15,
            ));
            out.push(suggestion(
                "Export the file again from the original tool",
                Difficulty::Easy,
                10,
            ));
        }
        (ErrorType::ProcessingFailure, _) => {
            out.push(suggestion(
                "Contact support with the file attached",
                Difficulty::Hard,
                60,
            ));
        }
        (ErrorType::UnknownDialect, _) => {
            out.push(suggestion(
                "Convert the file to XLIFF 1.2 or 2.0 in the originating tool",
                Difficulty::Moderate,
                20,
            ));
        }
        (ErrorType::MissingElement, _) => {
            out.push(suggestion(
                "Add the missing element or attribute",
                Difficulty::Easy,
                5,
            ));
        }
        (ErrorType::InvalidAttribute, ErrorCategory::Content) => {
            out.push(suggestion(
                "Review the affected segment in the translation tool",
                Difficulty::Easy,
                5,
            ));
        }
        (ErrorType::InvalidAttribute, _) => {
            out.push(suggestion(
                "Correct the attribute value",
                Difficulty::Easy,
                3,
            ));
        }
        (ErrorType::SchemaViolation, _) => {
            out.push(suggestion(
                "Check that the file declares the right XLIFF version and namespace",
                Difficulty::Moderate,
                10,
            ));
        }
    }

    if diagnostic.severity == Severity::Warning && out.len() > 1 {
        out.truncate(1);
    }
    out
}

fn suggestion(action: &str, difficulty: Difficulty, estimated_minutes: u32) -> Suggestion {
    Suggestion {
        action: action.to_string(),
        difficulty,
        estimated_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorLocation;

    #[test]
    fn test_malformed_hides_internal_text() {
        let diag = Diagnostic::malformed("quick_xml: ill-formed document at byte 42")
            .with_code("PARSE002")
            .with_location(ErrorLocation::at(3, 7));
        let friendly = UserFriendlyReporter::new().translate(&diag);
        assert_eq!(friendly.title, "The file could not be read");
        assert!(!friendly.message.contains("quick_xml"));
        assert_eq!(friendly.location.as_deref(), Some("3:7"));
        assert!(!friendly.suggestions.is_empty());
    }

    #[test]
    fn test_processing_failure_hides_internal_text() {
        let diag = Diagnostic::new(
            ErrorType::ProcessingFailure,
            ErrorCategory::Structural,
            Severity::Critical,
            "index out of bounds: the len is 0",
        );
        let friendly = UserFriendlyReporter::new().translate(&diag);
        assert!(!friendly.message.contains("index out of bounds"));
    }

    #[test]
    fn test_suggestions_are_ranked() {
        let diag = Diagnostic::malformed("broken");
        let friendly = UserFriendlyReporter::new().translate(&diag);
        let minutes: Vec<_> = friendly
            .suggestions
            .iter()
            .map(|s| s.estimated_minutes)
            .collect();
        let mut sorted = minutes.clone();
        sorted.sort();
        assert_eq!(minutes, sorted);
    }

    #[test]
    fn test_summary_verdicts() {
        let reporter = UserFriendlyReporter::new();
        assert_eq!(reporter.create_summary(&[]).verdict, Verdict::Pass);

        let warning = Diagnostic::warning(ErrorCategory::Content, "same language");
        let summary = reporter.create_summary(std::slice::from_ref(&warning));
        assert_eq!(summary.verdict, Verdict::PassWithWarnings);

        let summary = reporter.create_summary(&[warning, Diagnostic::malformed("broken")]);
        assert_eq!(summary.verdict, Verdict::Fail);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_severity.get("critical"), Some(&1));
        assert_eq!(summary.by_category.get("syntax"), Some(&1));
        assert_eq!(summary.top_issues[0].severity, Severity::Critical);
        assert!(summary.estimated_fix_minutes > 0);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = UserFriendlyReporter::new().create_summary(&[Diagnostic::malformed("x")]);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"verdict\":\"fail\""));
    }
}
