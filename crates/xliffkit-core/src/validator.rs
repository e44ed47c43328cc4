//! Validator trait
//!
//! Validators inspect a parsed document and return diagnostics. Parsers run
//! caller-supplied validators as part of `parse`, and the validation crate
//! builds its framework on the same trait.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use xliffkit_ast::{Dialect, Document};

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, ProcessingPhase, Severity};

/// Code reported when a validator panics
pub const VALIDATOR_FAILED: &str = "VALIDATOR_FAILED";

/// Trait for document validators
///
/// Each validator has a unique code prefix for its diagnostics.
pub trait Validator: Send + Sync {
    /// The validator's code prefix (e.g., "LANG")
    fn code(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Whether the validator has anything to say about a dialect
    fn applies_to(&self, _dialect: Dialect) -> bool {
        true
    }

    /// Validate the document and return any diagnostics
    fn validate(&self, doc: &Document) -> Vec<Diagnostic>;
}

/// Run a validator, turning a panic into a single critical finding
///
/// Every returned diagnostic is tagged with the validator's name.
pub fn run_guarded(validator: &dyn Validator, doc: &Document) -> Vec<Diagnostic> {
    if !validator.applies_to(doc.dialect) {
        return Vec::new();
    }

    match panic::catch_unwind(AssertUnwindSafe(|| validator.validate(doc))) {
        Ok(diagnostics) => diagnostics
            .into_iter()
            .map(|mut d| {
                if d.validator.is_none() {
                    d.validator = Some(validator.name().to_string());
                }
                d
            })
            .collect(),
        Err(payload) => {
            tracing::warn!(
                validator = validator.name(),
                reason = %panic_message(payload.as_ref()),
                "validator failed"
            );
            vec![validator_failed(validator.name())]
        }
    }
}

/// The finding reported for a failed validator
pub fn validator_failed(name: &str) -> Diagnostic {
    Diagnostic::new(
        ErrorType::ProcessingFailure,
        ErrorCategory::Semantic,
        Severity::Critical,
        format!("Validator '{}' failed to run", name),
    )
    .with_code(VALIDATOR_FAILED)
    .with_phase(ProcessingPhase::Validation)
    .with_recoverable(false)
    .with_validator(name)
}

/// Readable text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Panicking;

    impl Validator for Panicking {
        fn code(&self) -> &'static str {
            "TEST"
        }

        fn name(&self) -> &'static str {
            "panicking"
        }

        fn validate(&self, _doc: &Document) -> Vec<Diagnostic> {
            panic!("boom")
        }
    }

    struct OnlyTwoZero;

    impl Validator for OnlyTwoZero {
        fn code(&self) -> &'static str {
            "TEST"
        }

        fn applies_to(&self, dialect: Dialect) -> bool {
            dialect == Dialect::Xliff20
        }

        fn validate(&self, _doc: &Document) -> Vec<Diagnostic> {
            vec![Diagnostic::warning(ErrorCategory::Content, "hello")]
        }
    }

    #[test]
    fn test_panic_becomes_one_critical_finding() {
        let doc = Document::new(Dialect::Xliff12);
        let diags = run_guarded(&Panicking, &doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, VALIDATOR_FAILED);
        assert_eq!(diags[0].severity, Severity::Critical);
        assert!(!diags[0].message.contains("boom"));
    }

    #[test]
    fn test_dialect_filter_and_tagging() {
        let doc = Document::new(Dialect::Xliff12);
        assert!(run_guarded(&OnlyTwoZero, &doc).is_empty());

        let doc = Document::new(Dialect::Xliff20);
        let diags = run_guarded(&OnlyTwoZero, &doc);
        assert_eq!(diags[0].validator.as_deref(), Some("unnamed"));
    }
}
