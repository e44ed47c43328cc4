//! xliffkit CLI - Command-line interface library
//!
//! This library provides the CLI functionality for xliffkit:
//! - Detect: Report the dialect of a file
//! - Parse: Parse a file and show its shape and findings
//! - Validate: Run the full validator set
//! - Normalize: Strip vendor extensions
//! - Convert: Rewrite a document in another XLIFF version
//! - Report: Plain-language summary of the findings
//!
//! # Library Usage
//!
//! ```ignore
//! use xliffkit_cli::{validate_command, OutputFormat};
//!
//! let result = validate_command(&input, None, false, OutputFormat::Json)?;
//! assert!(result.is_valid);
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Which dialect is this?
//! xliffkit detect strings.xlf
//!
//! # Validate with project settings, failing on unknown states
//! xliffkit validate strings.xlf --config xliffkit.toml --strict-states
//!
//! # Convert a 1.2 file to 2.0
//! xliffkit convert strings.xlf --to 2.0 -o strings.xlf2
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    convert_command, detect_command, normalize_command, parse_command, report_command,
    validate_command,
};
pub use app::{run_cli, ConvertTarget, OutputFormat};
