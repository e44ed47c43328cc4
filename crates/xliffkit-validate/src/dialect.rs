//! Dialect-specific validators
//!
//! Each one runs its parser's own checks and stays silent on documents of
//! any other dialect.

use xliffkit_ast::{Dialect, Document};
use xliffkit_core::{
    Diagnostic, MqXliffParser, StatePolicy, Validator, Xliff12Parser, Xliff20Parser, XliffParser,
};

fn run_for(dialect: Dialect, doc: &Document, parser: &dyn XliffParser) -> Vec<Diagnostic> {
    if doc.dialect != dialect {
        return Vec::new();
    }
    parser.validate_version_specific(doc)
}

/// XLIFF 1.2 rules: version, states, inline kinds (`V12xxx`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Xliff12Validator {
    pub state_policy: StatePolicy,
}

impl Validator for Xliff12Validator {
    fn code(&self) -> &'static str {
        "V12"
    }

    fn name(&self) -> &'static str {
        "xliff-1.2"
    }

    fn applies_to(&self, dialect: Dialect) -> bool {
        dialect == Dialect::Xliff12
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let parser = Xliff12Parser::new().with_state_policy(self.state_policy);
        run_for(Dialect::Xliff12, doc, &parser)
    }
}

/// XLIFF 2.0 rules: languages, file ids, segment states (`V20xxx`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Xliff20Validator {
    pub state_policy: StatePolicy,
}

impl Validator for Xliff20Validator {
    fn code(&self) -> &'static str {
        "V20"
    }

    fn name(&self) -> &'static str {
        "xliff-2.0"
    }

    fn applies_to(&self, dialect: Dialect) -> bool {
        dialect == Dialect::Xliff20
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let parser = Xliff20Parser::new().with_state_policy(self.state_policy);
        run_for(Dialect::Xliff20, doc, &parser)
    }
}

/// MQXLIFF rules: the 1.2 rules plus memoQ status and percent (`MQxxx`)
#[derive(Debug, Clone, Copy, Default)]
pub struct MqXliffValidator {
    pub state_policy: StatePolicy,
}

impl Validator for MqXliffValidator {
    fn code(&self) -> &'static str {
        "MQ"
    }

    fn name(&self) -> &'static str {
        "mqxliff"
    }

    fn applies_to(&self, dialect: Dialect) -> bool {
        dialect == Dialect::MqXliff
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let parser = MqXliffParser::new().with_state_policy(self.state_policy);
        run_for(Dialect::MqXliff, doc, &parser)
    }
}
