//! Merging validator output into one verdict

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use xliffkit_ast::Document;
use xliffkit_core::diagnostics::partition;
use xliffkit_core::validator::run_guarded;
use xliffkit_core::{Diagnostic, Severity, Validator};

/// Finding counts of one validator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidatorCounts {
    pub errors: usize,
    pub warnings: usize,
}

/// Counts across the whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Keyed by validator name; validators without findings are listed too
    pub by_validator: BTreeMap<String, ValidatorCounts>,
}

/// Result of running several validators over one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedValidation {
    /// No finding above a warning
    pub is_valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub summary: ValidationSummary,
}

impl AggregatedValidation {
    /// Errors and warnings together, errors first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics().any(|d| d.code == code)
    }
}

/// Runs validators and merges their findings
pub struct ValidationResultAggregator;

impl ValidationResultAggregator {
    /// Run every validator over a document and merge the findings
    ///
    /// A validator that panics contributes one critical `VALIDATOR_FAILED`
    /// finding and the rest still run. Identical findings reported by more
    /// than one validator are kept once.
    pub fn aggregate(document: &Document, validators: &[Arc<dyn Validator>]) -> AggregatedValidation {
        let mut by_validator = BTreeMap::new();
        let mut diagnostics = Vec::new();

        for validator in validators {
            if !validator.applies_to(document.dialect) {
                continue;
            }
            let found = run_guarded(validator.as_ref(), document);
            let counts = ValidatorCounts {
                errors: found.iter().filter(|d| d.is_error()).count(),
                warnings: found.iter().filter(|d| d.is_warning()).count(),
            };
            tracing::debug!(
                validator = validator.name(),
                errors = counts.errors,
                warnings = counts.warnings,
                "validator finished"
            );
            by_validator.insert(validator.name().to_string(), counts);
            diagnostics.extend(found);
        }

        let mut merged = Self::merge(diagnostics);
        merged.summary.by_validator = by_validator;
        merged
    }

    /// Merge findings from any source, parse results included
    pub fn merge(diagnostics: impl IntoIterator<Item = Diagnostic>) -> AggregatedValidation {
        let mut seen = HashSet::new();
        let unique: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|d| {
                seen.insert((
                    d.code.clone(),
                    d.message.clone(),
                    d.location.path.clone(),
                    d.location.line,
                    d.location.column,
                ))
            })
            .collect();

        let mut by_severity = BTreeMap::new();
        for diagnostic in &unique {
            *by_severity.entry(diagnostic.severity).or_insert(0) += 1;
        }
        let total = unique.len();
        let is_valid = !unique.iter().any(Diagnostic::is_error);
        let (errors, warnings) = partition(unique);

        AggregatedValidation {
            is_valid,
            errors,
            warnings,
            summary: ValidationSummary {
                total,
                by_severity,
                by_validator: BTreeMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{Dialect, File, TransUnit};
    use xliffkit_core::{ErrorCategory, VALIDATOR_FAILED};

    use crate::structural::StructuralValidator;

    struct Fixed(&'static str, Severity);

    impl Validator for Fixed {
        fn code(&self) -> &'static str {
            "FIXED"
        }

        fn name(&self) -> &'static str {
            self.0
        }

        fn validate(&self, _doc: &Document) -> Vec<Diagnostic> {
            vec![Diagnostic::warning(ErrorCategory::Content, "same finding")
                .with_code("FIX001")
                .with_severity(self.1)]
        }
    }

    struct Panics;

    impl Validator for Panics {
        fn code(&self) -> &'static str {
            "PANIC"
        }

        fn name(&self) -> &'static str {
            "panics"
        }

        fn validate(&self, _doc: &Document) -> Vec<Diagnostic> {
            panic!("boom")
        }
    }

    struct OnlyV20;

    impl Validator for OnlyV20 {
        fn code(&self) -> &'static str {
            "ONLY"
        }

        fn name(&self) -> &'static str {
            "only-2.0"
        }

        fn applies_to(&self, dialect: Dialect) -> bool {
            dialect == Dialect::Xliff20
        }

        fn validate(&self, _doc: &Document) -> Vec<Diagnostic> {
            vec![Diagnostic::warning(ErrorCategory::Schema, "2.0 only").with_code("ONLY001")]
        }
    }

    fn doc() -> Document {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", "en", "plaintext");
        file.body.push_unit(TransUnit::new("1", "Hi"));
        doc.files.push(file);
        doc
    }

    #[test]
    fn test_warnings_keep_document_valid() {
        let validators: Vec<Arc<dyn Validator>> = vec![Arc::new(Fixed("w", Severity::Warning))];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_minor_invalidates() {
        let validators: Vec<Arc<dyn Validator>> = vec![Arc::new(Fixed("m", Severity::Minor))];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        assert!(!result.is_valid);
        assert_eq!(result.summary.by_severity.get(&Severity::Minor), Some(&1));
    }

    #[test]
    fn test_duplicates_merged_and_counted_per_validator() {
        let validators: Vec<Arc<dyn Validator>> = vec![
            Arc::new(Fixed("a", Severity::Major)),
            Arc::new(Fixed("b", Severity::Major)),
            Arc::new(StructuralValidator),
        ];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.summary.total, 1);
        assert_eq!(result.summary.by_validator["a"].errors, 1);
        assert_eq!(result.summary.by_validator["b"].errors, 1);
        assert_eq!(result.summary.by_validator["structural"], ValidatorCounts::default());
    }

    #[test]
    fn test_panicking_validator_becomes_one_finding() {
        let validators: Vec<Arc<dyn Validator>> = vec![
            Arc::new(Panics),
            Arc::new(Fixed("after", Severity::Warning)),
        ];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, VALIDATOR_FAILED);
        assert_eq!(result.errors[0].severity, Severity::Critical);
        assert!(result.has_code("FIX001"));
    }

    #[test]
    fn test_inapplicable_validators_skipped() {
        let validators: Vec<Arc<dyn Validator>> = vec![Arc::new(OnlyV20)];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        assert!(result.is_valid);
        assert_eq!(result.summary.total, 0);
        assert!(result.summary.by_validator.is_empty());
    }

    #[test]
    fn test_summary_serializes() {
        let validators: Vec<Arc<dyn Validator>> = vec![Arc::new(Fixed("m", Severity::Minor))];
        let result = ValidationResultAggregator::aggregate(&doc(), &validators);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["summary"]["by_severity"]["minor"], 1);
    }
}
