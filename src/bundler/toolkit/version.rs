//! Numeric ordering of toolkit version directory names.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Dotted numeric version such as `6.10.0`.
///
/// Compared component by component as integers, so `6.10.0` sorts after
/// `6.9.0` and `10.0` after `9.9`. Missing trailing components count as
/// lower (`6.5` < `6.5.0`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ToolkitVersion(Vec<u64>);

impl FromStr for ToolkitVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty version".to_string());
        }
        s.split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("`{s}` is not a dotted numeric version"));
                }
                part.parse::<u64>().map_err(|e| e.to_string())
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ToolkitVersion)
    }
}

impl Ord for ToolkitVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ToolkitVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ToolkitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}
