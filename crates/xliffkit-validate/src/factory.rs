//! Validator sets per dialect

use std::sync::Arc;

use xliffkit_ast::Dialect;
use xliffkit_core::{StatePolicy, Validator};

use crate::business::BusinessRulesValidator;
use crate::consistency::ConsistencyValidator;
use crate::content::ContentValidator;
use crate::dialect::{MqXliffValidator, Xliff12Validator, Xliff20Validator};
use crate::language::LanguageValidator;
use crate::schema::SchemaShapeValidator;
use crate::settings::ValidationSettings;
use crate::structural::StructuralValidator;

/// Builds the validators that apply to a dialect
pub struct ValidatorFactory;

impl ValidatorFactory {
    /// Every built-in validator for a dialect, with default settings
    ///
    /// Structural checks come first, then the dialect's own validator,
    /// then the general-purpose ones.
    pub fn validators_for_version(dialect: Dialect) -> Vec<Arc<dyn Validator>> {
        Self::from_settings(dialect, &ValidationSettings::default())
    }

    /// Validators for a dialect as configured by settings
    pub fn from_settings(dialect: Dialect, settings: &ValidationSettings) -> Vec<Arc<dyn Validator>> {
        let policy = settings.states.policy;
        let mut validators: Vec<Arc<dyn Validator>> = vec![
            Arc::new(StructuralValidator),
            Self::dialect_validator(dialect, policy),
        ];

        let toggles = settings.validators;
        if toggles.language {
            validators.push(Arc::new(LanguageValidator));
        }
        if toggles.content {
            validators.push(Arc::new(ContentValidator));
        }
        if toggles.consistency {
            validators.push(Arc::new(ConsistencyValidator));
        }
        if toggles.schema {
            validators.push(Arc::new(SchemaShapeValidator));
        }

        let business = BusinessRulesValidator::from_settings(&settings.rules);
        if business.rule_count() > 0 {
            validators.push(Arc::new(business));
        }

        tracing::debug!(
            %dialect,
            count = validators.len(),
            "validators selected"
        );
        validators
    }

    /// The dialect-specific validator alone
    pub fn dialect_validator(dialect: Dialect, policy: StatePolicy) -> Arc<dyn Validator> {
        match dialect {
            Dialect::Xliff12 => Arc::new(Xliff12Validator {
                state_policy: policy,
            }),
            Dialect::Xliff20 => Arc::new(Xliff20Validator {
                state_policy: policy,
            }),
            Dialect::MqXliff => Arc::new(MqXliffValidator {
                state_policy: policy,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(validators: &[Arc<dyn Validator>]) -> Vec<&'static str> {
        validators.iter().map(|v| v.name()).collect()
    }

    #[test]
    fn test_defaults_per_dialect() {
        let v12 = ValidatorFactory::validators_for_version(Dialect::Xliff12);
        assert_eq!(
            names(&v12),
            vec!["structural", "xliff-1.2", "language", "content", "consistency", "schema-shape"]
        );

        let v20 = ValidatorFactory::validators_for_version(Dialect::Xliff20);
        assert_eq!(names(&v20)[1], "xliff-2.0");

        let mq = ValidatorFactory::validators_for_version(Dialect::MqXliff);
        assert_eq!(names(&mq)[1], "mqxliff");
        assert!(mq.iter().all(|v| v.applies_to(Dialect::MqXliff)));
    }

    #[test]
    fn test_settings_toggle_validators() {
        let settings = ValidationSettings::from_toml_str(
            "[validators]\nlanguage = false\nschema = false\n[rules]\nrequire_targets = true",
        )
        .unwrap();
        let validators = ValidatorFactory::from_settings(Dialect::Xliff12, &settings);
        assert_eq!(
            names(&validators),
            vec!["structural", "xliff-1.2", "content", "consistency", "business-rules"]
        );
    }
}
