//! xliffkit-core - Multi-dialect XLIFF engine
//!
//! Parsing, serialization, dialect detection, normalization and error
//! recovery for XLIFF 1.2, XLIFF 2.0 and memoQ MQXLIFF documents.
//!
//! # Example
//!
//! ```
//! use xliffkit_core::{DialectRegistry, ParseOptions};
//! use xliffkit_ast::Dialect;
//!
//! let text = r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
//!   <file original="a.txt" source-language="en" target-language="es" datatype="plaintext">
//!     <body>
//!       <trans-unit id="1"><source>Hi</source><target state="final">Hola</target></trans-unit>
//!     </body>
//!   </file>
//! </xliff>"#;
//!
//! let registry = DialectRegistry::with_defaults();
//! assert_eq!(registry.detect_dialect(text), Some(Dialect::Xliff12));
//!
//! let parser = registry.create_parser(text).unwrap();
//! let result = parser.parse(text, &ParseOptions::default());
//! assert!(result.success);
//!
//! let doc = result.document.unwrap();
//! assert_eq!(doc.all_trans_units()[0].target_text().as_deref(), Some("Hola"));
//! ```

pub mod convert;
pub mod diagnostics;
pub mod dialects;
pub mod error;
pub mod history;
pub mod location;
pub mod navigate;
pub mod parser;
pub mod recovery;
pub mod registry;
pub mod report;
pub mod states;
pub mod structure;
pub mod tree;
pub mod validator;
pub mod writer;

// Re-export main types and functions
pub use convert::convert_document;
pub use diagnostics::{Diagnostic, ErrorCategory, ErrorLocation, ErrorType, ProcessingPhase, Severity};
pub use dialects::{MqXliffParser, Xliff12Parser, Xliff20Parser};
pub use error::{Result, XliffError};
pub use history::ErrorHistory;
pub use location::LocationTracker;
pub use parser::{ParseContext, ParseMetadata, ParseOptions, ParseResult, XliffParser};
pub use recovery::{RecoveryAction, RecoveryEngine, RecoveryStrategy};
pub use registry::DialectRegistry;
pub use report::{ErrorSummary, UserFriendlyError, UserFriendlyReporter, Verdict};
pub use states::StatePolicy;
pub use validator::{Validator, VALIDATOR_FAILED};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
