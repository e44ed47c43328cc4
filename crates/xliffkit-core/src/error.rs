//! Error types for parsing and serialization internals
//!
//! The parse pipeline turns these into classified
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s. Only
//! [`XliffError::UnsupportedDialect`] is raised to callers, when no
//! registered dialect accepts a file.

use thiserror::Error;

/// Errors that can occur inside the parsing and serialization pipeline
#[derive(Error, Debug)]
pub enum XliffError {
    /// Input was empty or whitespace only
    #[error("Input is empty")]
    EmptyInput,

    /// The XML tokenizer rejected the input
    #[error("XML syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// An element was still open at end of input
    #[error("Unclosed element <{name}> opened at byte {offset}")]
    UnclosedElement { name: String, offset: usize },

    /// The input has no root element
    #[error("No root element found")]
    NoRootElement,

    /// No registered dialect recognized the input
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),
}

impl XliffError {
    /// Byte offset of the failure, when known
    pub fn offset(&self) -> Option<usize> {
        match self {
            XliffError::Syntax { offset, .. } | XliffError::UnclosedElement { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, XliffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let err = XliffError::Syntax {
            offset: 12,
            message: "bad".to_string(),
        };
        assert_eq!(err.offset(), Some(12));
        assert_eq!(XliffError::EmptyInput.offset(), None);
    }

    #[test]
    fn test_display() {
        let err = XliffError::UnclosedElement {
            name: "body".to_string(),
            offset: 40,
        };
        assert_eq!(err.to_string(), "Unclosed element <body> opened at byte 40");

        let err = XliffError::UnsupportedDialect("page.html".to_string());
        assert_eq!(err.to_string(), "Unsupported dialect: page.html");
        assert_eq!(err.offset(), None);
    }
}
