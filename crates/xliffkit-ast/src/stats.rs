//! Derived statistics

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::unit::TransUnit;

/// Word counts and translation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordCountStats {
    /// Number of units counted
    pub total_units: usize,
    /// Units with a non-blank target
    pub translated_units: usize,
    /// Units still needing translation
    pub untranslated_units: usize,
    /// Units approved or in a finished state
    pub approved_units: usize,
    /// Words across all sources
    pub source_words: usize,
    /// Words across all targets
    pub target_words: usize,
}

impl WordCountStats {
    /// Accumulate statistics over units
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a TransUnit>) -> Self {
        let mut stats = Self::default();
        for unit in units {
            stats.total_units += 1;
            stats.source_words += unit.source_word_count();
            stats.target_words += unit.target_word_count();
            if unit.has_target() {
                stats.translated_units += 1;
            }
            if unit.needs_translation() {
                stats.untranslated_units += 1;
            }
            if unit.is_approved() {
                stats.approved_units += 1;
            }
        }
        stats
    }

    /// Share of units with a target, 0.0 to 100.0
    pub fn completion_percent(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        self.translated_units as f64 * 100.0 / self.total_units as f64
    }
}

/// Shape of a document at a glance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub dialect: Dialect,
    pub version: String,
    pub file_count: usize,
    pub group_count: usize,
    pub segment_count: usize,
    pub source_languages: Vec<String>,
    pub target_languages: Vec<String>,
    pub word_stats: WordCountStats,
    pub has_original_text: bool,
}
