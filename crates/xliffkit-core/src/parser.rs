//! Parser contract and the shared parse pipeline
//!
//! Every dialect parser implements [`XliffParser`]. The provided
//! [`XliffParser::parse`] runs the same pipeline for all of them:
//!
//! ```text
//! start -> validate-input -> build-tree -> dialect-translate
//!       -> [validate] -> [normalize] -> done | failed
//! ```
//!
//! `parse` never panics and never returns an error. Failures of any stage
//! are turned into diagnostics on the returned [`ParseResult`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use xliffkit_ast::{Dialect, Document};

use crate::diagnostics::{
    partition, Diagnostic, ErrorCategory, ErrorLocation, ErrorType, ProcessingPhase, Severity,
};
use crate::error::{Result, XliffError};
use crate::history::ErrorHistory;
use crate::location::LocationTracker;
use crate::navigate::PathTracker;
use crate::recovery::{RecoveryAction, RecoveryEngine};
use crate::structure;
use crate::tree::{self, XmlElement};
use crate::validator::{run_guarded, Validator};

/// Options for [`XliffParser::parse`]
#[derive(Clone)]
pub struct ParseOptions {
    /// Run structural, dialect and custom validators before returning
    pub validate_schema: bool,
    /// Keep the original text on the document
    pub extract_metadata: bool,
    /// Keep leading and trailing whitespace of extracted text
    pub preserve_whitespace: bool,
    /// Extra validators run in the same pass
    pub custom_validators: Vec<Arc<dyn Validator>>,
    /// Return the normalized document instead of the parsed one
    pub normalize: bool,
    /// Attach recovery proposals for recoverable findings
    pub suggest_recovery: bool,
    /// Shared history every finding is appended to
    pub history: Option<Arc<ErrorHistory>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            validate_schema: true,
            extract_metadata: true,
            preserve_whitespace: false,
            custom_validators: Vec::new(),
            normalize: false,
            suggest_recovery: true,
            history: None,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validators: Vec<&str> = self.custom_validators.iter().map(|v| v.name()).collect();
        f.debug_struct("ParseOptions")
            .field("validate_schema", &self.validate_schema)
            .field("extract_metadata", &self.extract_metadata)
            .field("preserve_whitespace", &self.preserve_whitespace)
            .field("custom_validators", &validators)
            .field("normalize", &self.normalize)
            .field("suggest_recovery", &self.suggest_recovery)
            .field("history", &self.history.is_some())
            .finish()
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable validation
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    /// Enable or disable keeping the original text
    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.extract_metadata = enabled;
        self
    }

    /// Keep whitespace around extracted text
    pub fn with_preserve_whitespace(mut self, enabled: bool) -> Self {
        self.preserve_whitespace = enabled;
        self
    }

    /// Add a validator to run during parsing
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.custom_validators.push(validator);
        self
    }

    /// Normalize the document before returning it
    pub fn with_normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Enable or disable recovery proposals
    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.suggest_recovery = enabled;
        self
    }

    /// Record findings in a shared history
    pub fn with_history(mut self, history: Arc<ErrorHistory>) -> Self {
        self.history = Some(history);
        self
    }
}

/// Facts about a parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseMetadata {
    pub dialect: Dialect,
    pub parse_time_ms: f64,
    pub file_count: usize,
    pub segment_count: usize,
}

/// Outcome of [`XliffParser::parse`]
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// No major or critical finding
    pub success: bool,
    /// The document, absent when a critical problem stopped the parse
    pub document: Option<Document>,
    /// Findings more serious than a warning
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Proposed recoveries for recoverable findings
    pub recovery: Vec<RecoveryAction>,
    pub metadata: ParseMetadata,
}

impl ParseResult {
    /// Errors and warnings together, errors first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Whether any finding has a given code
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics().any(|d| d.code == code)
    }
}

/// State handed to a dialect translator
pub struct ParseContext<'a> {
    options: &'a ParseOptions,
    tracker: LocationTracker<'a>,
    /// Structural path of the element being translated
    pub path: PathTracker,
    /// Namespace declarations in scope, innermost last
    namespaces: Vec<(String, String)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ParseContext<'a> {
    pub fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            options,
            tracker: LocationTracker::new(source),
            path: PathTracker::new("xliff"),
            namespaces: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Whether extracted text keeps surrounding whitespace
    pub fn preserve_whitespace(&self) -> bool {
        self.options.preserve_whitespace
    }

    /// Bring the namespace declarations of an element into scope
    ///
    /// Returns the mark to hand back to [`ParseContext::leave_scope`].
    pub fn enter_scope(&mut self, element: &XmlElement) -> usize {
        let mark = self.namespaces.len();
        self.namespaces.extend(
            element
                .attributes
                .iter()
                .filter(|(key, _)| key == "xmlns" || key.starts_with("xmlns:"))
                .cloned(),
        );
        mark
    }

    /// Drop the declarations entered since `mark`
    pub fn leave_scope(&mut self, mark: usize) {
        self.namespaces.truncate(mark);
    }

    /// Namespace of an element's name
    ///
    /// Declarations on the element itself come first, then the scope.
    pub fn namespace_of<'e>(&'e self, element: &'e XmlElement) -> Option<&'e str> {
        let key = match element.prefix() {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        element.attr(&key).or_else(|| {
            self.namespaces
                .iter()
                .rev()
                .find(|(name, _)| *name == key)
                .map(|(_, uri)| uri.as_str())
        })
    }

    /// Location of an element, with the current structural path
    pub fn locate(&self, element: &XmlElement) -> ErrorLocation {
        let mut location = self.tracker.locate(element.offset);
        location.path = Some(self.path.current());
        location.element = Some(element.name.clone());
        location
    }

    /// Record a parse-phase finding
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push(diagnostic.with_phase(ProcessingPhase::Parsing));
    }

    /// Record a parse-phase finding located at an element
    ///
    /// An element or attribute name already set on the diagnostic is kept.
    pub fn report_at(&mut self, element: &XmlElement, diagnostic: Diagnostic) {
        let mut location = self.locate(element);
        if diagnostic.location.element.is_some() {
            location.element = diagnostic.location.element.clone();
        }
        location.attribute = diagnostic.location.attribute.clone();
        self.report(diagnostic.with_location(location));
    }

    /// Findings recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// The contract every dialect parser implements
pub trait XliffParser: Send + Sync {
    /// The dialect this parser handles
    fn dialect(&self) -> Dialect;

    /// Whether raw text looks like this dialect
    fn detect_version(&self, text: &str) -> bool;

    /// Translate an element tree rooted at `<xliff>` into a document
    ///
    /// Problems with the content are reported through `ctx`; an `Err` means
    /// the translator itself could not proceed. A critical finding in `ctx`
    /// stops the parse without a document.
    fn parse_document(&self, root: &XmlElement, ctx: &mut ParseContext<'_>) -> Result<Document>;

    /// Write a document in this dialect
    fn serialize(&self, document: &Document) -> Result<String>;

    /// Strip dialect extensions, producing a document of the baseline dialect
    fn normalize_document(&self, document: &Document) -> Document;

    /// Checks only this dialect needs
    fn validate_version_specific(&self, document: &Document) -> Vec<Diagnostic>;

    /// Structural checks followed by the dialect's own checks
    fn validate(&self, document: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = structure::check_structure(document);
        diagnostics.extend(self.validate_version_specific(document));
        diagnostics
    }

    /// Run the full pipeline over raw text
    fn parse(&self, text: &str, options: &ParseOptions) -> ParseResult {
        run_pipeline(self, text, options)
    }
}

fn run_pipeline<P: XliffParser + ?Sized>(
    parser: &P,
    text: &str,
    options: &ParseOptions,
) -> ParseResult {
    let started = Instant::now();
    let dialect = parser.dialect();
    let mut diagnostics = Vec::new();

    // validate-input, build-tree
    let root = match tree::parse_xml(text) {
        Ok(root) => root,
        Err(XliffError::EmptyInput) => {
            tracing::debug!(%dialect, "empty input");
            diagnostics.push(
                Diagnostic::malformed(XliffError::EmptyInput.to_string())
                    .with_code("PARSE001")
                    .with_help("Provide the contents of an XLIFF file"),
            );
            return finish(dialect, None, diagnostics, options, started);
        }
        Err(err) => {
            tracing::debug!(%dialect, error = %err, "tree build failed");
            let tracker = LocationTracker::new(text);
            let location = err
                .offset()
                .map(|offset| tracker.locate(offset))
                .unwrap_or_default();
            diagnostics.push(
                Diagnostic::malformed(err.to_string())
                    .with_code("PARSE002")
                    .with_location(location)
                    .with_help("Check that every element is closed and properly nested"),
            );
            return finish(dialect, None, diagnostics, options, started);
        }
    };
    tracing::debug!(%dialect, root = %root.name, "tree built");

    if root.local_name() != "xliff" {
        diagnostics.push(
            Diagnostic::new(
                ErrorType::SchemaViolation,
                ErrorCategory::Schema,
                Severity::Critical,
                format!("Root element is <{}>, expected <xliff>", root.name),
            )
            .with_code("PARSE003")
            .with_phase(ProcessingPhase::Parsing)
            .with_element(root.name.clone()),
        );
        return finish(dialect, None, diagnostics, options, started);
    }

    if !parser.detect_version(text) {
        diagnostics.push(
            Diagnostic::new(
                ErrorType::UnknownDialect,
                ErrorCategory::Compatibility,
                Severity::Warning,
                format!("Document does not look like {}", dialect),
            )
            .with_code("PARSE004")
            .with_phase(ProcessingPhase::Parsing)
            .with_element("xliff"),
        );
    }

    // dialect-translate
    let mut ctx = ParseContext::new(text, options);
    let translated = panic::catch_unwind(AssertUnwindSafe(|| parser.parse_document(&root, &mut ctx)));
    diagnostics.extend(ctx.into_diagnostics());

    let mut document = match translated {
        Ok(Ok(document)) => document,
        Ok(Err(err)) => {
            tracing::debug!(%dialect, error = %err, "translation failed");
            diagnostics.push(translation_failed(err.to_string()));
            return finish(dialect, None, diagnostics, options, started);
        }
        Err(_) => {
            tracing::warn!(%dialect, "dialect translator panicked");
            diagnostics.push(translation_failed("translator panicked".to_string()));
            return finish(dialect, None, diagnostics, options, started);
        }
    };

    if diagnostics.iter().any(|d| d.severity == Severity::Critical) {
        tracing::debug!(%dialect, "critical finding during translation");
        return finish(dialect, None, diagnostics, options, started);
    }
    tracing::debug!(
        %dialect,
        files = document.files.len(),
        units = document.total_segment_count(),
        "document translated"
    );

    if options.extract_metadata {
        document.original_text = Some(text.to_string());
    }

    // validate
    if options.validate_schema {
        diagnostics.extend(parser.validate(&document));
        for validator in &options.custom_validators {
            diagnostics.extend(run_guarded(validator.as_ref(), &document));
        }
        tracing::debug!(%dialect, findings = diagnostics.len(), "validation done");
    }

    // normalize
    if options.normalize {
        document = parser.normalize_document(&document);
        tracing::debug!(%dialect, baseline = %document.dialect, "document normalized");
    }

    finish(dialect, Some(document), diagnostics, options, started)
}

fn translation_failed(detail: String) -> Diagnostic {
    Diagnostic::new(
        ErrorType::ProcessingFailure,
        ErrorCategory::Structural,
        Severity::Critical,
        "The document could not be translated into the model",
    )
    .with_code("PARSE005")
    .with_phase(ProcessingPhase::Processing)
    .with_note(detail)
}

fn finish(
    dialect: Dialect,
    document: Option<Document>,
    diagnostics: Vec<Diagnostic>,
    options: &ParseOptions,
    started: Instant,
) -> ParseResult {
    let recovery = if options.suggest_recovery {
        RecoveryEngine::for_dialect(dialect).propose_all(&diagnostics)
    } else {
        Vec::new()
    };

    if let Some(ref history) = options.history {
        history.record_all(Some(dialect), &diagnostics);
    }

    let success = !diagnostics.iter().any(Diagnostic::is_blocking);
    let (file_count, segment_count) = document
        .as_ref()
        .map_or((0, 0), |d| (d.files.len(), d.total_segment_count()));
    let (errors, warnings) = partition(diagnostics);

    ParseResult {
        success,
        document,
        errors,
        warnings,
        recovery,
        metadata: ParseMetadata {
            dialect,
            parse_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            file_count,
            segment_count,
        },
    }
}
