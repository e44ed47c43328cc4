//! Validation settings
//!
//! Loaded from `xliffkit.toml`:
//!
//! ```toml
//! [states]
//! policy = "strict"
//!
//! [validators]
//! consistency = false
//!
//! [rules]
//! max_length_ratio = 2.5
//! forbidden_terms = ["TODO", "FIXME"]
//! require_targets = true
//!
//! [rules.severity]
//! forbidden_terms = "major"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xliffkit_core::{Severity, StatePolicy};

/// File name looked up by callers that search for settings
pub const SETTINGS_FILE: &str = "xliffkit.toml";

/// Errors loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Severity a business rule reports at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Critical,
    Major,
    Minor,
    #[default]
    Warning,
    /// Rule is disabled
    Ignore,
}

impl RuleSeverity {
    /// Diagnostic severity, `None` if the rule is ignored
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Critical => Some(Severity::Critical),
            RuleSeverity::Major => Some(Severity::Major),
            RuleSeverity::Minor => Some(Severity::Minor),
            RuleSeverity::Warning => Some(Severity::Warning),
            RuleSeverity::Ignore => None,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != RuleSeverity::Ignore
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidationSettings {
    pub states: StateSettings,
    pub validators: ValidatorToggles,
    pub rules: RuleSettings,
}

impl ValidationSettings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "validation settings loaded");
        Ok(settings)
    }
}

/// How translation states are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StateSettings {
    pub policy: StatePolicy,
}

/// Optional validators; structural and dialect checks always run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorToggles {
    pub language: bool,
    pub content: bool,
    pub consistency: bool,
    pub schema: bool,
}

impl Default for ValidatorToggles {
    fn default() -> Self {
        Self {
            language: true,
            content: true,
            consistency: true,
            schema: true,
        }
    }
}

/// Built-in business rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Longest allowed target, as a multiple of the source length
    pub max_length_ratio: Option<f64>,
    /// Terms that must not appear in targets, matched case-insensitively
    pub forbidden_terms: Vec<String>,
    /// Every translatable unit must have a target
    pub require_targets: bool,
    pub severity: RuleSeverities,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            max_length_ratio: None,
            forbidden_terms: Vec::new(),
            require_targets: false,
            severity: RuleSeverities::default(),
        }
    }
}

/// Severity per built-in rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSeverities {
    pub max_length_ratio: RuleSeverity,
    pub forbidden_terms: RuleSeverity,
    pub required_target: RuleSeverity,
}

impl Default for RuleSeverities {
    fn default() -> Self {
        Self {
            max_length_ratio: RuleSeverity::Warning,
            forbidden_terms: RuleSeverity::Major,
            required_target: RuleSeverity::Minor,
        }
    }
}
