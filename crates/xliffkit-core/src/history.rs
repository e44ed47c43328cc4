//! Shared diagnostic history
//!
//! A bounded, append-only log of diagnostics that several parses can write
//! to. Share it with `Arc<ErrorHistory>`; appends go through one mutex.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use xliffkit_ast::Dialect;

use crate::diagnostics::Diagnostic;

/// Entries kept when no capacity is given
pub const DEFAULT_CAPACITY: usize = 1000;

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Position in the overall append order, starting at 0
    pub sequence: u64,
    /// Dialect of the document being processed, if known
    pub dialect: Option<Dialect>,
    pub diagnostic: Diagnostic,
}

#[derive(Debug, Default)]
struct Inner {
    entries: VecDeque<HistoryEntry>,
    next_sequence: u64,
}

/// Bounded diagnostic log, safe to share between threads
///
/// When full, the oldest entry is dropped. Sequence numbers keep counting so
/// [`ErrorHistory::total_recorded`] reflects every append.
#[derive(Debug)]
pub struct ErrorHistory {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for ErrorHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ErrorHistory {
    /// Create a history that keeps at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Append a diagnostic
    pub fn record(&self, dialect: Option<Dialect>, diagnostic: &Diagnostic) {
        let mut inner = self.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(HistoryEntry {
            sequence,
            dialect,
            diagnostic: diagnostic.clone(),
        });
    }

    /// Append several diagnostics
    pub fn record_all<'a>(
        &self,
        dialect: Option<Dialect>,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    ) {
        for diagnostic in diagnostics {
            self.record(dialect, diagnostic);
        }
    }

    /// Snapshot of the retained entries, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    /// The `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let inner = self.lock();
        let skip = inner.entries.len().saturating_sub(n);
        inner.entries.iter().skip(skip).cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of appends since creation, including dropped entries
    pub fn total_recorded(&self) -> u64 {
        self.lock().next_sequence
    }

    /// Retained entries counted by diagnostic code
    pub fn counts_by_code(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.lock().entries {
            *counts.entry(entry.diagnostic.code.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Appends cannot leave the log half-written, so a poisoned lock is
        // still usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorCategory;
    use std::sync::Arc;
    use std::thread;

    fn diag(code: &str) -> Diagnostic {
        Diagnostic::warning(ErrorCategory::Content, "test").with_code(code)
    }

    #[test]
    fn test_record_and_snapshot() {
        let history = ErrorHistory::default();
        history.record(Some(Dialect::Xliff12), &diag("A"));
        history.record(None, &diag("B"));
        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 0);
        assert_eq!(entries[1].diagnostic.code, "B");
    }

    #[test]
    fn test_bounded() {
        let history = ErrorHistory::new(2);
        for code in ["A", "B", "C"] {
            history.record(None, &diag(code));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.total_recorded(), 3);
        let codes: Vec<_> = history
            .entries()
            .into_iter()
            .map(|e| e.diagnostic.code)
            .collect();
        assert_eq!(codes, vec!["B", "C"]);
    }

    #[test]
    fn test_recent_and_counts() {
        let history = ErrorHistory::default();
        history.record_all(None, &[diag("A"), diag("A"), diag("B")]);
        assert_eq!(history.recent(1)[0].diagnostic.code, "B");
        assert_eq!(history.counts_by_code().get("A"), Some(&2));
    }

    #[test]
    fn test_concurrent_appends() {
        let history = Arc::new(ErrorHistory::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..25 {
                        history.record(None, &diag("X"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.total_recorded(), 100);
    }
}
