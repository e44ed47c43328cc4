//! Recovery proposals for recoverable diagnostics
//!
//! The engine never changes a document and never removes a diagnostic. It
//! proposes a [`RecoveryAction`] per recoverable finding and lets the caller
//! decide whether to apply it. Attempts are counted per error site so that
//! a caller looping on the same problem gives up after
//! [`MAX_ATTEMPTS_PER_SITE`] proposals.
//!
//! An engine belongs to a single parsing session. Create a fresh one (or
//! call [`RecoveryEngine::reset`]) before working on another document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use xliffkit_ast::Dialect;

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorLocation, ErrorType};

/// Maximum number of proposals for one `(code, line, column)` site
pub const MAX_ATTEMPTS_PER_SITE: usize = 3;

/// What the caller could do about a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Insert a default, empty element
    SynthesizeElement { element: String, markup: String },
    /// Use a default value for an attribute
    SubstituteValue { attribute: String, value: String },
    /// Run [`normalize_encoding`] over the input and parse again
    NormalizeEncoding,
}

/// A proposed recovery for one diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryAction {
    /// Code of the diagnostic this action addresses
    pub code: String,
    /// Where the diagnostic points
    pub location: ErrorLocation,
    /// The proposed action
    pub strategy: RecoveryStrategy,
    /// Which attempt this is for the site, starting at 1
    pub attempt: usize,
    /// Human-readable description
    pub description: String,
}

/// Per-session recovery engine
#[derive(Debug, Clone, Default)]
pub struct RecoveryEngine {
    dialect: Option<Dialect>,
    attempts: HashMap<(String, usize, usize), usize>,
}

impl RecoveryEngine {
    /// Create an engine with no dialect knowledge
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that proposes defaults suitable for a dialect
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect: Some(dialect),
            attempts: HashMap::new(),
        }
    }

    /// Propose an action for a diagnostic
    ///
    /// Returns `None` when the diagnostic is not recoverable, when no
    /// strategy fits its category, or when the site has used up its
    /// attempts.
    pub fn attempt(&mut self, diagnostic: &Diagnostic) -> Option<RecoveryAction> {
        if !diagnostic.recoverable {
            return None;
        }
        let strategy = self.strategy_for(diagnostic)?;

        let count = self.attempts.entry(diagnostic.site_key()).or_insert(0);
        if *count >= MAX_ATTEMPTS_PER_SITE {
            tracing::debug!(code = %diagnostic.code, "recovery attempts exhausted");
            return None;
        }
        *count += 1;

        Some(RecoveryAction {
            code: diagnostic.code.clone(),
            location: diagnostic.location.clone(),
            description: describe(&strategy),
            strategy,
            attempt: *count,
        })
    }

    /// Propose actions for every recoverable diagnostic in a list
    pub fn propose_all(&mut self, diagnostics: &[Diagnostic]) -> Vec<RecoveryAction> {
        diagnostics.iter().filter_map(|d| self.attempt(d)).collect()
    }

    /// Attempts already made for the site of a diagnostic
    pub fn attempts_for(&self, diagnostic: &Diagnostic) -> usize {
        self.attempts
            .get(&diagnostic.site_key())
            .copied()
            .unwrap_or(0)
    }

    /// Forget every attempt counter
    pub fn reset(&mut self) {
        self.attempts.clear();
    }

    fn strategy_for(&self, diagnostic: &Diagnostic) -> Option<RecoveryStrategy> {
        let dialect = self.dialect.unwrap_or(Dialect::Xliff12);

        if diagnostic.category == ErrorCategory::Encoding {
            return Some(RecoveryStrategy::NormalizeEncoding);
        }

        let attribute = diagnostic.location.attribute.as_deref();
        match (diagnostic.category, diagnostic.error_type, attribute) {
            (_, ErrorType::InvalidAttribute, Some(attribute))
            | (ErrorCategory::Content, _, Some(attribute))
            | (ErrorCategory::Structural, _, Some(attribute)) => {
                Some(RecoveryStrategy::SubstituteValue {
                    attribute: attribute.to_string(),
                    value: default_attribute_value(dialect, attribute).to_string(),
                })
            }
            (ErrorCategory::Structural, _, None) => {
                let element = diagnostic.location.element.as_deref()?;
                Some(RecoveryStrategy::SynthesizeElement {
                    element: element.to_string(),
                    markup: default_element(dialect, element),
                })
            }
            _ => None,
        }
    }
}

/// Default value for an attribute in a dialect
pub fn default_attribute_value(dialect: Dialect, attribute: &str) -> &'static str {
    match (dialect, attribute) {
        (_, "source-language" | "srcLang") => "en",
        (_, "target-language" | "trgLang") => "en",
        (_, "datatype") => "plaintext",
        (_, "original") => "unknown",
        (Dialect::Xliff20, "state") => "initial",
        (_, "state") => "new",
        (Dialect::Xliff20, "id") => "f1",
        (_, "id") => "1",
        (_, "version") => dialect.version_attribute(),
        (_, "approved" | "translate") => "no",
        _ => "",
    }
}

/// Default markup for a required element in a dialect
pub fn default_element(dialect: Dialect, element: &str) -> String {
    match (dialect, element) {
        (Dialect::Xliff20, "file") => r#"<file id="f1"/>"#.to_string(),
        (_, "file") => {
            r#"<file original="unknown" source-language="en" datatype="plaintext"><body/></file>"#
                .to_string()
        }
        (Dialect::Xliff20, "segment") => "<segment><source/></segment>".to_string(),
        (Dialect::Xliff20, "unit") => {
            r#"<unit id="u1"><segment><source/></segment></unit>"#.to_string()
        }
        _ => format!("<{}/>", element),
    }
}

/// Clean up text that failed to parse for encoding reasons
///
/// Strips a leading byte order mark, drops NUL and C0 control characters
/// other than tab, carriage return and line feed, and turns CRLF into LF.
pub fn normalize_encoding(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.replace("\r\n", "\n")
        .chars()
        .filter(|&c| (c as u32) >= 0x20 || matches!(c, '\t' | '\r' | '\n'))
        .collect()
}

fn describe(strategy: &RecoveryStrategy) -> String {
    match strategy {
        RecoveryStrategy::SynthesizeElement { element, .. } => {
            format!("insert an empty <{}> element", element)
        }
        RecoveryStrategy::SubstituteValue { attribute, value } if value.is_empty() => {
            format!("remove the {} attribute", attribute)
        }
        RecoveryStrategy::SubstituteValue { attribute, value } => {
            format!("set {} to \"{}\"", attribute, value)
        }
        RecoveryStrategy::NormalizeEncoding => {
            "strip the byte order mark and control characters, then parse again".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn missing_body() -> Diagnostic {
        Diagnostic::new(
            ErrorType::MissingElement,
            ErrorCategory::Structural,
            Severity::Major,
            "File has no body",
        )
        .with_code("STRUCT006")
        .with_location(ErrorLocation::at(4, 3))
        .with_element("body")
    }

    #[test]
    fn test_structural_synthesizes_element() {
        let mut engine = RecoveryEngine::for_dialect(Dialect::Xliff12);
        let action = engine.attempt(&missing_body()).unwrap();
        assert_eq!(
            action.strategy,
            RecoveryStrategy::SynthesizeElement {
                element: "body".to_string(),
                markup: "<body/>".to_string()
            }
        );
        assert_eq!(action.attempt, 1);
    }

    #[test]
    fn test_attribute_gets_dialect_default() {
        let diag = Diagnostic::new(
            ErrorType::InvalidAttribute,
            ErrorCategory::Content,
            Severity::Minor,
            "Unknown state",
        )
        .with_code("V20001")
        .with_attribute("state");

        let mut engine = RecoveryEngine::for_dialect(Dialect::Xliff20);
        let action = engine.attempt(&diag).unwrap();
        assert_eq!(
            action.strategy,
            RecoveryStrategy::SubstituteValue {
                attribute: "state".to_string(),
                value: "initial".to_string()
            }
        );
    }

    #[test]
    fn test_attempts_are_capped_per_site() {
        let mut engine = RecoveryEngine::new();
        let diag = missing_body();
        for _ in 0..MAX_ATTEMPTS_PER_SITE {
            assert!(engine.attempt(&diag).is_some());
        }
        assert!(engine.attempt(&diag).is_none());
        assert_eq!(engine.attempts_for(&diag), MAX_ATTEMPTS_PER_SITE);

        // A different site still gets proposals
        let other = missing_body()
            .with_location(ErrorLocation::at(9, 1))
            .with_element("body");
        assert!(engine.attempt(&other).is_some());

        engine.reset();
        assert_eq!(engine.attempts_for(&diag), 0);
        assert!(engine.attempt(&diag).is_some());
    }

    #[test]
    fn test_unrecoverable_gets_nothing() {
        let mut engine = RecoveryEngine::new();
        assert!(engine.attempt(&Diagnostic::malformed("broken")).is_none());
    }

    #[test]
    fn test_encoding_proposes_normalization() {
        let diag = Diagnostic::warning(ErrorCategory::Encoding, "Replacement character")
            .with_code("CONTENT004")
            .with_recoverable(true);
        let mut engine = RecoveryEngine::new();
        let actions = engine.propose_all(&[diag]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].strategy, RecoveryStrategy::NormalizeEncoding);
    }

    #[test]
    fn test_normalize_encoding() {
        let input = "\u{feff}<a>\r\nx\u{0}y\u{7}\tz</a>";
        assert_eq!(normalize_encoding(input), "<a>\nxy\tz</a>");
    }
}
