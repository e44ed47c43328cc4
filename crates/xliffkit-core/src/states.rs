//! Translation states per dialect
//!
//! States are kept as strings on the model and checked against an
//! allow-list for the document's dialect. Whether an unknown state is an
//! error or a warning is decided by a [`StatePolicy`].

use serde::{Deserialize, Serialize};
use xliffkit_ast::Dialect;

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};

/// XLIFF 1.2 `state` values
pub const XLIFF12_STATES: [&str; 10] = [
    "new",
    "needs-translation",
    "needs-l10n",
    "needs-adaptation",
    "translated",
    "needs-review-translation",
    "needs-review-l10n",
    "needs-review-adaptation",
    "final",
    "signed-off",
];

/// XLIFF 2.0 segment `state` values
pub const XLIFF20_STATES: [&str; 4] = ["initial", "translated", "reviewed", "final"];

/// States MQXLIFF adds on top of 1.2
pub const MQXLIFF_EXTRA_STATES: [&str; 1] = ["proofread"];

/// How unknown states are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatePolicy {
    /// Unknown states are warnings
    #[default]
    Lenient,
    /// Unknown states are major errors
    Strict,
}

/// Whether a state is acceptable in a dialect
///
/// 1.2 and MQXLIFF accept user-defined states with an `x-` prefix.
pub fn is_known_state(dialect: Dialect, state: &str) -> bool {
    match dialect {
        Dialect::Xliff12 => XLIFF12_STATES.contains(&state) || state.starts_with("x-"),
        Dialect::MqXliff => {
            XLIFF12_STATES.contains(&state)
                || MQXLIFF_EXTRA_STATES.contains(&state)
                || state.starts_with("x-")
        }
        Dialect::Xliff20 => XLIFF20_STATES.contains(&state),
    }
}

/// Every listed state of a dialect
pub fn allowed_states(dialect: Dialect) -> Vec<&'static str> {
    match dialect {
        Dialect::Xliff12 => XLIFF12_STATES.to_vec(),
        Dialect::MqXliff => XLIFF12_STATES
            .iter()
            .chain(MQXLIFF_EXTRA_STATES.iter())
            .copied()
            .collect(),
        Dialect::Xliff20 => XLIFF20_STATES.to_vec(),
    }
}

/// Check one state value
///
/// `code` is the dialect-specific diagnostic code to report under.
pub fn check_state(
    dialect: Dialect,
    state: &str,
    policy: StatePolicy,
    code: &str,
) -> Option<Diagnostic> {
    if is_known_state(dialect, state) {
        return None;
    }
    let severity = match policy {
        StatePolicy::Lenient => Severity::Warning,
        StatePolicy::Strict => Severity::Major,
    };
    Some(
        Diagnostic::new(
            ErrorType::InvalidAttribute,
            ErrorCategory::Schema,
            severity,
            format!("Unknown {} state \"{}\"", dialect, state),
        )
        .with_code(code)
        .with_attribute("state")
        .with_help(format!(
            "Use one of: {}",
            allowed_states(dialect).join(", ")
        )),
    )
}

/// Map a state to the closest state of another dialect
///
/// Unknown states map to the target dialect's starting state.
pub fn map_state(from: Dialect, to: Dialect, state: &str) -> String {
    let baseline = match (from, state) {
        (Dialect::MqXliff, "proofread") => "signed-off",
        _ => state,
    };

    let mapped = match (from.baseline(), to.baseline()) {
        (a, b) if a == b => {
            if is_known_state(to, baseline) {
                baseline
            } else if to == Dialect::Xliff20 {
                "initial"
            } else {
                "new"
            }
        }
        (Dialect::Xliff12, Dialect::Xliff20) => match baseline {
            "translated" | "needs-review-translation" | "needs-review-l10n"
            | "needs-review-adaptation" => "translated",
            "signed-off" => "reviewed",
            "final" => "final",
            _ => "initial",
        },
        _ => match baseline {
            "translated" => "translated",
            "reviewed" => "signed-off",
            "final" => "final",
            _ => "new",
        },
    };
    mapped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_states() {
        assert!(is_known_state(Dialect::Xliff12, "needs-review-l10n"));
        assert!(is_known_state(Dialect::Xliff12, "x-custom"));
        assert!(!is_known_state(Dialect::Xliff12, "proofread"));
        assert!(is_known_state(Dialect::MqXliff, "proofread"));
        assert!(is_known_state(Dialect::Xliff20, "reviewed"));
        assert!(!is_known_state(Dialect::Xliff20, "signed-off"));
        assert!(!is_known_state(Dialect::Xliff20, "x-custom"));
    }

    #[test]
    fn test_policy_controls_severity() {
        let lenient = check_state(Dialect::Xliff20, "done", StatePolicy::Lenient, "V20001").unwrap();
        assert_eq!(lenient.severity, Severity::Warning);
        let strict = check_state(Dialect::Xliff20, "done", StatePolicy::Strict, "V20001").unwrap();
        assert_eq!(strict.severity, Severity::Major);
        assert_eq!(strict.code, "V20001");
        assert!(check_state(Dialect::Xliff20, "final", StatePolicy::Strict, "V20001").is_none());
    }

    #[test]
    fn test_map_state() {
        assert_eq!(map_state(Dialect::Xliff12, Dialect::Xliff20, "needs-translation"), "initial");
        assert_eq!(map_state(Dialect::Xliff12, Dialect::Xliff20, "signed-off"), "reviewed");
        assert_eq!(map_state(Dialect::Xliff20, Dialect::Xliff12, "reviewed"), "signed-off");
        assert_eq!(map_state(Dialect::MqXliff, Dialect::Xliff12, "proofread"), "signed-off");
        assert_eq!(map_state(Dialect::MqXliff, Dialect::Xliff20, "proofread"), "reviewed");
        assert_eq!(map_state(Dialect::Xliff12, Dialect::Xliff12, "final"), "final");
    }

    #[test]
    fn test_policy_deserializes() {
        let policy: StatePolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy, StatePolicy::Strict);
        assert_eq!(StatePolicy::default(), StatePolicy::Lenient);
    }
}
