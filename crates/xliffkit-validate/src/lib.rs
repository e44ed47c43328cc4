//! xliffkit-validate - Validation framework for XLIFF documents
//!
//! Independent validators each inspect a parsed [`Document`] and return
//! diagnostics. The [`ValidationResultAggregator`] runs a set of them and
//! merges the findings into one verdict.
//!
//! # Architecture
//!
//! Validators implement the core [`Validator`] trait, so the same objects
//! can be handed to `ParseOptions::with_validator` and run during parsing.
//! [`ValidatorFactory`] picks the built-in set for a dialect, and
//! [`ValidationEngine`] bundles a set with the aggregator.
//!
//! # Example
//!
//! ```
//! use xliffkit_ast::{Dialect, Document, File, TransUnit};
//! use xliffkit_validate::ValidationEngine;
//!
//! let mut doc = Document::new(Dialect::Xliff12);
//! let mut file = File::new("app.txt", "en", "plaintext").with_target_language("en_GB");
//! file.body.push_unit(TransUnit::new("1", "Hello"));
//! doc.files.push(file);
//!
//! let result = ValidationEngine::for_dialect(Dialect::Xliff12).validate(&doc);
//! assert!(!result.is_valid);
//! assert!(result.has_code("LANG002"));
//! ```

pub mod aggregate;
pub mod business;
pub mod consistency;
pub mod content;
pub mod dialect;
pub mod factory;
pub mod language;
pub mod schema;
pub mod settings;
pub mod structural;

use std::sync::Arc;

use xliffkit_ast::{Dialect, Document};
pub use xliffkit_core::Validator;

// Re-export validators
pub use aggregate::{AggregatedValidation, ValidationResultAggregator, ValidationSummary, ValidatorCounts};
pub use business::{
    BusinessRule, BusinessRulesValidator, ForbiddenTermsRule, MaxLengthRatioRule, RequiredTargetRule,
};
pub use consistency::ConsistencyValidator;
pub use content::ContentValidator;
pub use dialect::{MqXliffValidator, Xliff12Validator, Xliff20Validator};
pub use factory::ValidatorFactory;
pub use language::{is_valid_language_tag, LanguageValidator};
pub use schema::SchemaShapeValidator;
pub use settings::{RuleSeverity, RuleSettings, SettingsError, ValidationSettings, SETTINGS_FILE};
pub use structural::StructuralValidator;

/// A set of validators run together
///
/// The engine manages a collection of validators and runs them against
/// documents through the aggregator.
#[derive(Clone, Default)]
pub struct ValidationEngine {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidationEngine {
    /// Create an engine without validators
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the built-in validators of a dialect
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            validators: ValidatorFactory::validators_for_version(dialect),
        }
    }

    /// Create an engine configured by settings
    pub fn from_settings(dialect: Dialect, settings: &ValidationSettings) -> Self {
        Self {
            validators: ValidatorFactory::from_settings(dialect, settings),
        }
    }

    /// Add a validator to the engine
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    /// The registered validators, in run order
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Get the names of all registered validators
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Validate a document using all registered validators
    pub fn validate(&self, doc: &Document) -> AggregatedValidation {
        ValidationResultAggregator::aggregate(doc, &self.validators)
    }

    /// Check if a document has any finding above a warning
    pub fn has_errors(&self, doc: &Document) -> bool {
        !self.validate(doc).is_valid
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("validators", &self.validator_names())
            .finish()
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::{File, TransUnit};

    fn doc(target_language: &str) -> Document {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", "en", "plaintext").with_target_language(target_language);
        file.body
            .push_unit(TransUnit::new("1", "Hello").with_target("Hallo", Some("translated")));
        doc.files.push(file);
        doc
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_engine_new() {
        let engine = ValidationEngine::new();
        assert_eq!(engine.validator_count(), 0);
        assert!(engine.validate(&doc("de")).is_valid);
    }

    #[test]
    fn test_engine_for_dialect() {
        let engine = ValidationEngine::for_dialect(Dialect::Xliff12);
        assert!(engine.validator_names().contains(&"structural"));
        assert!(engine.validator_names().contains(&"xliff-1.2"));
    }

    #[test]
    fn test_engine_add_validator() {
        let mut engine = ValidationEngine::new();
        engine.add_validator(Arc::new(StructuralValidator));
        assert_eq!(engine.validator_count(), 1);
    }

    #[test]
    fn test_valid_document() {
        let engine = ValidationEngine::for_dialect(Dialect::Xliff12);
        let result = engine.validate(&doc("de"));
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(!engine.has_errors(&doc("de")));
    }

    #[test]
    fn test_invalid_document() {
        let engine = ValidationEngine::for_dialect(Dialect::Xliff12);
        assert!(engine.has_errors(&doc("de_DE")));
    }
}
