//! Dialect Registry
//!
//! Holds the known dialects and picks the parser for a piece of text.
//! Entries are tried from the highest priority down; the first detector
//! that answers yes wins. MQXLIFF is a superset of 1.2, so it sits above
//! 1.2 and its detector looks for the vendor markers first.

use std::panic::{self, AssertUnwindSafe};

use xliffkit_ast::Dialect;

use crate::dialects::{
    has_mq_markers, looks_like_1_2, looks_like_2_0, MqXliffParser, Xliff12Parser, Xliff20Parser,
};
use crate::error::Result;
use crate::parser::XliffParser;
use crate::states::StatePolicy;
use crate::validator::panic_message;

/// Decides whether text belongs to a dialect; may fail
pub type Detector = Box<dyn Fn(&str) -> Result<bool> + Send + Sync>;

/// Creates a fresh parser for a dialect
pub type ParserFactory = Box<dyn Fn() -> Box<dyn XliffParser> + Send + Sync>;

/// Priority of the built-in 2.0 entry
pub const PRIORITY_XLIFF20: u32 = 30;
/// Priority of the built-in MQXLIFF entry
pub const PRIORITY_MQXLIFF: u32 = 20;
/// Priority of the built-in 1.2 entry
pub const PRIORITY_XLIFF12: u32 = 10;

/// Wrap an infallible check as a [`Detector`]
pub fn detector(check: fn(&str) -> bool) -> Detector {
    Box::new(move |text: &str| -> Result<bool> { Ok(check(text)) })
}

/// Wrap a parser constructor as a [`ParserFactory`]
pub fn factory<P, F>(make: F) -> ParserFactory
where
    P: XliffParser + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    Box::new(move || -> Box<dyn XliffParser> { Box::new(make()) })
}

struct Entry {
    dialect: Dialect,
    priority: u32,
    detector: Detector,
    factory: ParserFactory,
}

/// Known dialects with their detectors and parser factories
pub struct DialectRegistry {
    /// Sorted by priority, highest first
    entries: Vec<Entry>,
}

impl DialectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a registry with the three built-in dialects
    pub fn with_defaults() -> Self {
        Self::with_state_policy(StatePolicy::default())
    }

    /// Built-in dialects whose parsers report unknown states by `policy`
    pub fn with_state_policy(policy: StatePolicy) -> Self {
        let mut registry = Self::new();
        registry.register(
            Dialect::Xliff20,
            PRIORITY_XLIFF20,
            detector(looks_like_2_0),
            factory(move || Xliff20Parser::new().with_state_policy(policy)),
        );
        registry.register(
            Dialect::MqXliff,
            PRIORITY_MQXLIFF,
            detector(|text| looks_like_1_2(text) && has_mq_markers(text)),
            factory(move || MqXliffParser::new().with_state_policy(policy)),
        );
        registry.register(
            Dialect::Xliff12,
            PRIORITY_XLIFF12,
            detector(looks_like_1_2),
            factory(move || Xliff12Parser::new().with_state_policy(policy)),
        );
        registry
    }

    /// Register a dialect, replacing any existing entry for it
    pub fn register(
        &mut self,
        dialect: Dialect,
        priority: u32,
        detector: Detector,
        factory: ParserFactory,
    ) {
        self.entries.retain(|entry| entry.dialect != dialect);
        self.entries.push(Entry {
            dialect,
            priority,
            detector,
            factory,
        });
        // Stable, so equal priorities keep registration order
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Detect the dialect of a text
    ///
    /// Detectors that fail or panic are logged and skipped.
    pub fn detect_dialect(&self, text: &str) -> Option<Dialect> {
        for entry in &self.entries {
            match panic::catch_unwind(AssertUnwindSafe(|| (entry.detector)(text))) {
                Ok(Ok(true)) => {
                    tracing::debug!(dialect = %entry.dialect, "dialect detected");
                    return Some(entry.dialect);
                }
                Ok(Ok(false)) => {}
                Ok(Err(err)) => {
                    tracing::warn!(dialect = %entry.dialect, error = %err, "dialect detector failed");
                }
                Err(payload) => {
                    tracing::warn!(
                        dialect = %entry.dialect,
                        reason = %panic_message(payload.as_ref()),
                        "dialect detector panicked"
                    );
                }
            }
        }
        None
    }

    /// Create a parser for the detected dialect of a text
    pub fn create_parser(&self, text: &str) -> Option<Box<dyn XliffParser>> {
        let dialect = self.detect_dialect(text)?;
        self.parser_for(dialect)
    }

    /// Create a parser for a dialect by tag
    pub fn parser_for(&self, dialect: Dialect) -> Option<Box<dyn XliffParser>> {
        self.entries
            .iter()
            .find(|entry| entry.dialect == dialect)
            .map(|entry| (entry.factory)())
    }

    /// Registered dialects, highest priority first
    pub fn dialects(&self) -> Vec<Dialect> {
        self.entries.iter().map(|entry| entry.dialect).collect()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.dialect, e.priority)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XliffError;

    const V12: &str = r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2"><file/></xliff>"#;
    const V20: &str = r#"<xliff version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0" srcLang="en"/>"#;
    const MQ: &str = r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:mq="MQXliff"><file/></xliff>"#;

    #[test]
    fn test_default_priorities() {
        let registry = DialectRegistry::with_defaults();
        assert_eq!(
            registry.dialects(),
            vec![Dialect::Xliff20, Dialect::MqXliff, Dialect::Xliff12]
        );
    }

    #[test]
    fn test_detection() {
        let registry = DialectRegistry::with_defaults();
        assert_eq!(registry.detect_dialect(V12), Some(Dialect::Xliff12));
        assert_eq!(registry.detect_dialect(V20), Some(Dialect::Xliff20));
        // MQXLIFF is also valid 1.2; the vendor entry wins
        assert_eq!(registry.detect_dialect(MQ), Some(Dialect::MqXliff));
        assert_eq!(registry.detect_dialect("<html/>"), None);
        assert!(registry.create_parser("plain text").is_none());
    }

    #[test]
    fn test_create_parser() {
        let registry = DialectRegistry::with_defaults();
        let parser = registry.create_parser(MQ).unwrap();
        assert_eq!(parser.dialect(), Dialect::MqXliff);
        assert_eq!(
            registry.parser_for(Dialect::Xliff20).unwrap().dialect(),
            Dialect::Xliff20
        );
    }

    #[test]
    fn test_failing_detector_is_skipped() {
        let mut registry = DialectRegistry::with_defaults();
        registry.register(
            Dialect::Xliff20,
            100,
            Box::new(|_: &str| -> Result<bool> { Err(XliffError::EmptyInput) }),
            factory(Xliff20Parser::new),
        );
        assert_eq!(registry.dialects().len(), 3);
        assert_eq!(registry.dialects()[0], Dialect::Xliff20);
        assert_eq!(registry.detect_dialect(V20), None);
        assert_eq!(registry.detect_dialect(V12), Some(Dialect::Xliff12));
    }

    #[test]
    fn test_panicking_detector_is_skipped() {
        let mut registry = DialectRegistry::with_defaults();
        registry.register(
            Dialect::Xliff20,
            100,
            Box::new(|_: &str| -> Result<bool> { panic!("detector bug") }),
            factory(Xliff20Parser::new),
        );
        assert_eq!(registry.detect_dialect(MQ), Some(Dialect::MqXliff));
        assert_eq!(registry.detect_dialect(V12), Some(Dialect::Xliff12));
        assert_eq!(registry.detect_dialect(V20), None);
        assert_eq!(
            registry.create_parser(MQ).map(|p| p.dialect()),
            Some(Dialect::MqXliff)
        );
    }

    #[test]
    fn test_register_replaces_and_reorders() {
        let mut registry = DialectRegistry::new();
        assert!(registry.dialects().is_empty());
        registry.register(
            Dialect::Xliff12,
            5,
            detector(|_| true),
            factory(Xliff12Parser::new),
        );
        registry.register(
            Dialect::MqXliff,
            1,
            detector(|_| true),
            factory(MqXliffParser::new),
        );
        assert_eq!(registry.detect_dialect("anything"), Some(Dialect::Xliff12));

        registry.register(
            Dialect::MqXliff,
            50,
            detector(|_| true),
            factory(MqXliffParser::new),
        );
        assert_eq!(registry.dialects(), vec![Dialect::MqXliff, Dialect::Xliff12]);
        assert_eq!(registry.detect_dialect("anything"), Some(Dialect::MqXliff));
    }
}
