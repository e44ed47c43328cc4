//! Classified diagnostics
//!
//! Every problem found while parsing, validating or serializing a document
//! is reported as a [`Diagnostic`] carrying its type, category, severity,
//! processing phase, recoverability and source location.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A classified problem report
///
/// # Example
///
/// ```
/// use xliffkit_core::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};
///
/// let diag = Diagnostic::new(
///     ErrorType::MissingElement,
///     ErrorCategory::Structural,
///     Severity::Major,
///     "Translation unit has no id",
/// )
/// .with_code("STRUCT004")
/// .with_element("trans-unit")
/// .with_help("Give every trans-unit a unique id attribute");
///
/// assert!(diag.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code (e.g., "STRUCT004", "PARSE001")
    pub code: String,

    /// The diagnostic message
    pub message: String,

    /// What went wrong
    pub error_type: ErrorType,

    /// Which aspect of the document is affected
    pub category: ErrorCategory,

    /// How serious the problem is
    pub severity: Severity,

    /// Pipeline phase that produced the diagnostic
    pub phase: ProcessingPhase,

    /// Whether a recovery action can be proposed
    pub recoverable: bool,

    /// Where the problem is
    #[serde(default)]
    pub location: ErrorLocation,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Related notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    /// Name of the validator that produced the diagnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// Kind of problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// A required element or attribute is absent
    MissingElement,
    /// The input is not well-formed
    MalformedInput,
    /// An attribute has an unacceptable value
    InvalidAttribute,
    /// The document does not match its dialect's shape
    SchemaViolation,
    /// The dialect could not be determined
    UnknownDialect,
    /// An internal step failed and was converted
    ProcessingFailure,
}

/// Aspect of the document affected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Structural,
    Content,
    Schema,
    Encoding,
    Syntax,
    Semantic,
    Performance,
    Compatibility,
}

/// Severity, ordered from least to most serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory, never invalidates a document
    Warning,
    /// Problem that invalidates the document but not the parse
    Minor,
    /// Problem that makes the parse unsuccessful
    Major,
    /// Processing cannot continue
    Critical,
}

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingPhase {
    Parsing,
    Validation,
    Processing,
    Serialization,
}

/// Source location of a diagnostic
///
/// Line and column are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,

    /// Byte offset into the original text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    /// Structural path such as `xliff/file[0]/body/trans-unit[id=3]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Element name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Attribute name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Surrounding text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        error_type: ErrorType,
        category: ErrorCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: String::new(),
            message: message.into(),
            error_type,
            category,
            severity,
            phase: ProcessingPhase::Validation,
            recoverable: error_type.default_recoverable(),
            location: ErrorLocation::default(),
            help: None,
            notes: Vec::new(),
            validator: None,
        }
    }

    /// Create a critical parse-phase error for input that is not well-formed
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorType::MalformedInput,
            ErrorCategory::Syntax,
            Severity::Critical,
            message,
        )
        .with_phase(ProcessingPhase::Parsing)
    }

    /// Create a warning
    pub fn warning(category: ErrorCategory, message: impl Into<String>) -> Self {
        let error_type = match category {
            ErrorCategory::Schema | ErrorCategory::Compatibility => ErrorType::SchemaViolation,
            ErrorCategory::Structural => ErrorType::MissingElement,
            ErrorCategory::Syntax | ErrorCategory::Encoding => ErrorType::MalformedInput,
            _ => ErrorType::InvalidAttribute,
        };
        Self::new(error_type, category, Severity::Warning, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the processing phase
    pub fn with_phase(mut self, phase: ProcessingPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Override recoverability
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Set the full location
    pub fn with_location(mut self, location: ErrorLocation) -> Self {
        self.location = location;
        self
    }

    /// Set the structural path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.location.path = Some(path.into());
        self
    }

    /// Set the element name
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.location.element = Some(element.into());
        self
    }

    /// Set the attribute name
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.location.attribute = Some(attribute.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Record the producing validator
    pub fn with_validator(mut self, name: impl Into<String>) -> Self {
        self.validator = Some(name.into());
        self
    }

    /// Anything above a warning
    pub fn is_error(&self) -> bool {
        self.severity > Severity::Warning
    }

    /// Severity is warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Major or critical, which makes a parse unsuccessful
    pub fn is_blocking(&self) -> bool {
        self.severity >= Severity::Major
    }

    /// Key identifying the error site for recovery bookkeeping
    pub fn site_key(&self) -> (String, usize, usize) {
        (
            self.code.clone(),
            self.location.line.unwrap_or(0),
            self.location.column.unwrap_or(0),
        )
    }
}

impl ErrorType {
    /// Recoverability implied by the error type
    pub fn default_recoverable(self) -> bool {
        matches!(
            self,
            ErrorType::MissingElement | ErrorType::InvalidAttribute
        )
    }
}

impl ErrorLocation {
    /// Location at a line and column
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            ..Default::default()
        }
    }

    /// Whether nothing is known about the location
    pub fn is_unknown(&self) -> bool {
        self.line.is_none() && self.path.is_none() && self.element.is_none()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Structural => "structural",
            ErrorCategory::Content => "content",
            ErrorCategory::Schema => "schema",
            ErrorCategory::Encoding => "encoding",
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Semantic => "semantic",
            ErrorCategory::Performance => "performance",
            ErrorCategory::Compatibility => "compatibility",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}", line, col)?;
            wrote = true;
        }
        if let Some(ref path) = self.path {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "{}", path)?;
            wrote = true;
        } else if let Some(ref element) = self.element {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "<{}>", element)?;
            wrote = true;
        }
        if let Some(ref attribute) = self.attribute {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "@{}", attribute)?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: severity[code]: message
        write!(f, "{}", self.severity)?;
        if !self.code.is_empty() {
            write!(f, "[{}]", self.code)?;
        }
        write!(f, ": {}", self.message)?;

        if !self.location.is_unknown() {
            write!(f, "\n  --> {}", self.location)?;
        }

        if let Some(ref help) = self.help {
            write!(f, "\n  = help: {}", help)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {}", note)?;
        }

        Ok(())
    }
}

/// Split diagnostics into (errors, warnings)
pub fn partition(diagnostics: Vec<Diagnostic>) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    diagnostics.into_iter().partition(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::new(
            ErrorType::InvalidAttribute,
            ErrorCategory::Content,
            Severity::Minor,
            "Bad language code",
        )
        .with_code("LANG001")
        .with_element("file")
        .with_attribute("source-language")
        .with_help("Use a BCP 47 tag such as en-US");

        assert!(diag.is_error());
        assert!(!diag.is_blocking());
        assert!(diag.recoverable);
        assert_eq!(diag.phase, ProcessingPhase::Validation);
    }

    #[test]
    fn test_malformed_is_critical_and_unrecoverable() {
        let diag = Diagnostic::malformed("Unexpected end of input");
        assert_eq!(diag.severity, Severity::Critical);
        assert_eq!(diag.phase, ProcessingPhase::Parsing);
        assert!(!diag.recoverable);
        assert!(diag.is_blocking());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Minor);
        assert!(Severity::Minor < Severity::Major);
        assert!(Severity::Major < Severity::Critical);
    }

    #[test]
    fn test_partition() {
        let diags = vec![
            Diagnostic::warning(ErrorCategory::Content, "same language"),
            Diagnostic::malformed("broken"),
        ];
        let (errors, warnings) = partition(diags);
        assert_eq!(errors.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let mut location = ErrorLocation::at(3, 5);
        location.path = Some("xliff/file[0]".to_string());
        let diag = Diagnostic::malformed("Invalid syntax")
            .with_code("PARSE002")
            .with_location(location)
            .with_help("Check the markup");

        let display = format!("{}", diag);
        assert!(display.contains("critical[PARSE002]"));
        assert!(display.contains("3:5 xliff/file[0]"));
        assert!(display.contains("help: Check the markup"));
    }

    #[test]
    fn test_diagnostic_serialize() {
        let diag = Diagnostic::warning(ErrorCategory::Performance, "Large document")
            .with_code("SCHEMA010");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"category\":\"performance\""));

        let restored: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, diag);
    }
}
