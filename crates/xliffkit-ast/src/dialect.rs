//! Dialect tags
//!
//! The engine handles a closed set of interchange dialects. Each parser,
//! serializer and dialect validator is keyed by one of these tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A supported interchange dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// XLIFF 1.2, trans-unit based
    #[serde(rename = "1.2")]
    Xliff12,
    /// XLIFF 2.0, unit/segment based
    #[serde(rename = "2.0")]
    Xliff20,
    /// memoQ MQXLIFF, a vendor superset of XLIFF 1.2
    #[serde(rename = "mqxliff")]
    MqXliff,
}

impl Dialect {
    /// All dialects, in no particular order
    pub const ALL: [Dialect; 3] = [Dialect::Xliff12, Dialect::Xliff20, Dialect::MqXliff];

    /// Short tag used on the command line and in serialized reports
    pub fn tag(self) -> &'static str {
        match self {
            Dialect::Xliff12 => "1.2",
            Dialect::Xliff20 => "2.0",
            Dialect::MqXliff => "mqxliff",
        }
    }

    /// Value written to the root `version` attribute
    pub fn version_attribute(self) -> &'static str {
        match self {
            Dialect::Xliff12 | Dialect::MqXliff => "1.2",
            Dialect::Xliff20 => "2.0",
        }
    }

    /// Default namespace of the root element
    pub fn namespace(self) -> &'static str {
        match self {
            Dialect::Xliff12 | Dialect::MqXliff => "urn:oasis:names:tc:xliff:document:1.2",
            Dialect::Xliff20 => "urn:oasis:names:tc:xliff:document:2.0",
        }
    }

    /// Whether documents of this dialect share the 1.2 tree shape
    pub fn is_trans_unit_based(self) -> bool {
        matches!(self, Dialect::Xliff12 | Dialect::MqXliff)
    }

    /// The standards-compliant dialect this one normalizes to
    pub fn baseline(self) -> Dialect {
        match self {
            Dialect::Xliff12 | Dialect::MqXliff => Dialect::Xliff12,
            Dialect::Xliff20 => Dialect::Xliff20,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Xliff12 => write!(f, "XLIFF 1.2"),
            Dialect::Xliff20 => write!(f, "XLIFF 2.0"),
            Dialect::MqXliff => write!(f, "MQXLIFF"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1.2" | "xliff12" | "xliff-1.2" => Ok(Dialect::Xliff12),
            "2.0" | "xliff20" | "xliff-2.0" => Ok(Dialect::Xliff20),
            "mqxliff" | "mq" | "memoq" => Ok(Dialect::MqXliff),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("1.2".parse::<Dialect>().unwrap(), Dialect::Xliff12);
        assert_eq!("2.0".parse::<Dialect>().unwrap(), Dialect::Xliff20);
        assert_eq!("MQXLIFF".parse::<Dialect>().unwrap(), Dialect::MqXliff);
        assert!("3.0".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_vendor_baseline_is_1_2() {
        assert_eq!(Dialect::MqXliff.baseline(), Dialect::Xliff12);
        assert_eq!(Dialect::MqXliff.version_attribute(), "1.2");
        assert!(Dialect::MqXliff.is_trans_unit_based());
        assert!(!Dialect::Xliff20.is_trans_unit_based());
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&Dialect::Xliff20).unwrap();
        assert_eq!(json, "\"2.0\"");
    }
}
