//! xliffkit-ast - Document model for translation interchange files
//!
//! This crate provides the in-memory representation shared by every
//! dialect parser: files, headers, bodies, groups, translation units,
//! notes, alternate translations and inline markup.
//!
//! The model is plain data. Constructors never fail on missing fields;
//! required-field checks live in the validation layer so that malformed
//! input can still be inspected.
//!
//! # Example
//!
//! ```
//! use xliffkit_ast::{Body, Dialect, Document, File, TransUnit};
//!
//! let mut file = File::new("strings.txt", "en", "plaintext");
//! file.body.push_unit(TransUnit::new("1", "Hello").with_target("Hola", Some("final")));
//!
//! let mut doc = Document::new(Dialect::Xliff12);
//! doc.files.push(file);
//!
//! assert_eq!(doc.total_segment_count(), 1);
//! assert_eq!(doc.word_count_stats().source_words, 1);
//! ```

pub mod content;
pub mod dialect;
pub mod document;
pub mod stats;
pub mod unit;

pub use content::{Content, ContentPart, InlineElement, InlineKind};
pub use dialect::Dialect;
pub use document::{BinaryUnit, Body, BodyItem, Document, File, Group, Header};
pub use stats::{DocumentSummary, WordCountStats};
pub use unit::{AltTrans, Note, TransUnit};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
