#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use crate::ContractViolation;

/// Dotted-triple model version (`major.minor.patch`), ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ModelVersion {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ContractViolation> {
        let mut segments = raw.split('.');
        let (Some(major), Some(minor), Some(patch), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "must be major.minor.patch",
            });
        };
        Ok(Self {
            major: parse_segment(field, major)?,
            minor: parse_segment(field, minor)?,
            patch: parse_segment(field, patch)?,
        })
    }

    /// Lenient parse for strings already persisted in an index: missing or
    /// unparsable segments read as 0.
    fn lenient(raw: &str) -> Self {
        let mut segments = raw
            .split('.')
            .map(|s| s.parse::<u64>().unwrap_or(0));
        Self {
            major: segments.next().unwrap_or(0),
            minor: segments.next().unwrap_or(0),
            patch: segments.next().unwrap_or(0),
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn parse_segment(field: &'static str, segment: &str) -> Result<u64, ContractViolation> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be major.minor.patch",
        });
    }
    segment
        .parse::<u64>()
        .map_err(|_| ContractViolation::InvalidValue {
            field,
            reason: "version segment out of range",
        })
}

/// Total order over version strings: major, then minor, then patch.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    ModelVersion::lenient(a).cmp(&ModelVersion::lenient(b))
}
