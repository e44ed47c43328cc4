//! Business rules
//!
//! Project-specific checks plug into [`BusinessRulesValidator`] as
//! [`BusinessRule`] objects. Three rules ship built in and can be set up
//! from [`RuleSettings`].

use std::sync::Arc;

use xliffkit_ast::{Document, TransUnit};
use xliffkit_core::structure::{file_path, unit_path};
use xliffkit_core::{Diagnostic, ErrorCategory, ErrorType, Severity, Validator};

use crate::settings::RuleSettings;

/// A caller-supplied check over single units
///
/// Rules see one unit at a time with its structural path and return the
/// findings for it. Codes should be unique per rule.
pub trait BusinessRule: Send + Sync {
    /// Name used in findings and logs
    fn name(&self) -> &str;

    /// Check one unit
    fn check(&self, unit: &TransUnit, path: &str) -> Vec<Diagnostic>;
}

/// Runs a list of business rules over every unit
#[derive(Clone, Default)]
pub struct BusinessRulesValidator {
    rules: Vec<Arc<dyn BusinessRule>>,
}

impl BusinessRulesValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules enabled by settings
    pub fn from_settings(settings: &RuleSettings) -> Self {
        let mut validator = Self::new();
        if let (Some(ratio), Some(severity)) = (
            settings.max_length_ratio,
            settings.severity.max_length_ratio.to_severity(),
        ) {
            validator.add_rule(MaxLengthRatioRule::new(ratio).with_severity(severity));
        }
        if let (false, Some(severity)) = (
            settings.forbidden_terms.is_empty(),
            settings.severity.forbidden_terms.to_severity(),
        ) {
            validator.add_rule(
                ForbiddenTermsRule::new(settings.forbidden_terms.clone()).with_severity(severity),
            );
        }
        if let (true, Some(severity)) = (
            settings.require_targets,
            settings.severity.required_target.to_severity(),
        ) {
            validator.add_rule(RequiredTargetRule::new().with_severity(severity));
        }
        validator
    }

    /// Add a rule
    pub fn add_rule(&mut self, rule: impl BusinessRule + 'static) {
        self.rules.push(Arc::new(rule));
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Validator for BusinessRulesValidator {
    fn code(&self) -> &'static str {
        "BIZ"
    }

    fn name(&self) -> &'static str {
        "business-rules"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.rules.is_empty() {
            return diagnostics;
        }
        for (index, file) in doc.files.iter().enumerate() {
            let file_path = file_path(doc.dialect, file, index);
            for unit in file.all_trans_units() {
                let path = unit_path(doc.dialect, &file_path, unit);
                for rule in &self.rules {
                    diagnostics.extend(
                        rule.check(unit, &path)
                            .into_iter()
                            .map(|d| d.with_note(format!("rule: {}", rule.name()))),
                    );
                }
            }
        }
        diagnostics
    }
}

/// Targets may not be much longer than their source (`BIZ001`)
///
/// Useful where UI space is fixed. Sources shorter than
/// [`MaxLengthRatioRule::MIN_SOURCE_CHARS`] are skipped; short strings
/// legitimately grow a lot.
#[derive(Debug, Clone)]
pub struct MaxLengthRatioRule {
    max_ratio: f64,
    severity: Severity,
}

impl MaxLengthRatioRule {
    pub const MIN_SOURCE_CHARS: usize = 10;

    pub fn new(max_ratio: f64) -> Self {
        Self {
            max_ratio,
            severity: Severity::Warning,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl BusinessRule for MaxLengthRatioRule {
    fn name(&self) -> &str {
        "max-length-ratio"
    }

    fn check(&self, unit: &TransUnit, path: &str) -> Vec<Diagnostic> {
        let Some(target) = unit.target_text() else {
            return Vec::new();
        };
        let source_len = unit.source_text().chars().count();
        if source_len < Self::MIN_SOURCE_CHARS {
            return Vec::new();
        }
        let ratio = target.chars().count() as f64 / source_len as f64;
        if ratio <= self.max_ratio {
            return Vec::new();
        }
        vec![Diagnostic::new(
            ErrorType::InvalidAttribute,
            ErrorCategory::Content,
            self.severity,
            format!(
                "Target of unit '{}' is {:.1}x the source length (limit {:.1}x)",
                unit.id, ratio, self.max_ratio
            ),
        )
        .with_code("BIZ001")
        .with_path(path)
        .with_element("target")
        .with_recoverable(false)]
    }
}

/// Targets must not contain listed terms (`BIZ002`)
///
/// Matching ignores case; each term is reported once per unit.
#[derive(Debug, Clone)]
pub struct ForbiddenTermsRule {
    terms: Vec<String>,
    severity: Severity,
}

impl ForbiddenTermsRule {
    pub fn new(terms: Vec<String>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            severity: Severity::Major,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl BusinessRule for ForbiddenTermsRule {
    fn name(&self) -> &str {
        "forbidden-terms"
    }

    fn check(&self, unit: &TransUnit, path: &str) -> Vec<Diagnostic> {
        let Some(target) = unit.target_text() else {
            return Vec::new();
        };
        let target = target.to_lowercase();
        self.terms
            .iter()
            .filter(|term| target.contains(term.as_str()))
            .map(|term| {
                Diagnostic::new(
                    ErrorType::InvalidAttribute,
                    ErrorCategory::Content,
                    self.severity,
                    format!("Target of unit '{}' contains forbidden term '{}'", unit.id, term),
                )
                .with_code("BIZ002")
                .with_path(path)
                .with_element("target")
                .with_recoverable(false)
            })
            .collect()
    }
}

/// Translatable units must have a target (`BIZ003`)
#[derive(Debug, Clone)]
pub struct RequiredTargetRule {
    severity: Severity,
}

impl RequiredTargetRule {
    pub fn new() -> Self {
        Self {
            severity: Severity::Minor,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Default for RequiredTargetRule {
    fn default() -> Self {
        Self::new()
    }
}

impl BusinessRule for RequiredTargetRule {
    fn name(&self) -> &str {
        "required-target"
    }

    fn check(&self, unit: &TransUnit, path: &str) -> Vec<Diagnostic> {
        if unit.translate == Some(false) || unit.ignorable || unit.has_target() {
            return Vec::new();
        }
        vec![Diagnostic::new(
            ErrorType::MissingElement,
            ErrorCategory::Content,
            self.severity,
            format!("Unit '{}' has no translation", unit.id),
        )
        .with_code("BIZ003")
        .with_path(path)
        .with_element("target")
        .with_recoverable(false)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RuleSeverity;
    use xliffkit_ast::{Dialect, File};

    fn doc(units: Vec<TransUnit>) -> Document {
        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("a.txt", "en", "plaintext");
        for unit in units {
            file.body.push_unit(unit);
        }
        doc.files.push(file);
        doc
    }

    #[test]
    fn test_no_rules_no_findings() {
        let validator = BusinessRulesValidator::new();
        assert_eq!(validator.rule_count(), 0);
        assert!(validator.validate(&doc(vec![TransUnit::new("1", "Hi")])).is_empty());
    }

    #[test]
    fn test_max_length_ratio() {
        let mut validator = BusinessRulesValidator::new();
        validator.add_rule(MaxLengthRatioRule::new(1.5));
        let d = doc(vec![
            TransUnit::new("1", "Save file now").with_target("Datei jetzt sofort speichern", None),
            TransUnit::new("2", "Save file now").with_target("Datei speichern", None),
            TransUnit::new("3", "OK").with_target("Einverstanden", None),
        ]);
        let diags = validator.validate(&d);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "BIZ001");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].notes.contains(&"rule: max-length-ratio".to_string()));
    }

    #[test]
    fn test_forbidden_terms() {
        let rule = ForbiddenTermsRule::new(vec!["TODO".to_string(), " ".to_string()]);
        let unit = TransUnit::new("1", "Save").with_target("todo: Speichern", None);
        let diags = rule.check(&unit, "p");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "BIZ002");
        assert_eq!(diags[0].severity, Severity::Major);
    }

    #[test]
    fn test_required_target() {
        let rule = RequiredTargetRule::new();
        let mut locked = TransUnit::new("2", "Brand");
        locked.translate = Some(false);
        assert!(rule.check(&locked, "p").is_empty());
        assert_eq!(rule.check(&TransUnit::new("1", "Hi"), "p")[0].code, "BIZ003");
    }

    #[test]
    fn test_from_settings() {
        let mut settings = RuleSettings::default();
        assert_eq!(BusinessRulesValidator::from_settings(&settings).rule_count(), 0);

        settings.max_length_ratio = Some(2.0);
        settings.forbidden_terms = vec!["TODO".to_string()];
        settings.require_targets = true;
        settings.severity.required_target = RuleSeverity::Ignore;
        let validator = BusinessRulesValidator::from_settings(&settings);
        assert_eq!(
            validator.rule_names(),
            vec!["max-length-ratio", "forbidden-terms"]
        );
    }

    struct NoExclamation;

    impl BusinessRule for NoExclamation {
        fn name(&self) -> &str {
            "no-exclamation"
        }

        fn check(&self, unit: &TransUnit, path: &str) -> Vec<Diagnostic> {
            match unit.target_text() {
                Some(t) if t.contains('!') => vec![Diagnostic::warning(
                    ErrorCategory::Content,
                    "Exclamation mark in target",
                )
                .with_code("HOUSE001")
                .with_path(path)],
                _ => Vec::new(),
            }
        }
    }

    #[test]
    fn test_custom_rule() {
        let mut validator = BusinessRulesValidator::new();
        validator.add_rule(NoExclamation);
        let d = doc(vec![TransUnit::new("7", "Go").with_target("Los!", None)]);
        let diags = validator.validate(&d);
        assert_eq!(diags[0].code, "HOUSE001");
        assert_eq!(
            diags[0].location.path.as_deref(),
            Some("xliff/file[0]/body/trans-unit[id=7]")
        );
    }
}
