//! Classification bucket identifiers.

use serde::{Deserialize, Serialize};

/// One of the three classification outcomes for a document's service guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    /// Guess matches neither the current nor the expected label.
    Different,
    /// Guess matches the current label.
    SameAsCurrent,
    /// Guess matches the expected label.
    SameAsExpected,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [
        Bucket::Different,
        Bucket::SameAsCurrent,
        Bucket::SameAsExpected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Different => "different",
            Self::SameAsCurrent => "sameAsCurrent",
            Self::SameAsExpected => "sameAsExpected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "different" => Some(Self::Different),
            "sameAsCurrent" => Some(Self::SameAsCurrent),
            "sameAsExpected" => Some(Self::SameAsExpected),
            _ => None,
        }
    }

    /// File name used for this bucket, both for the aggregate and its sample.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Different => "different.json",
            Self::SameAsCurrent => "same-as-current.json",
            Self::SameAsExpected => "same-as-expected.json",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trips() {
        for bucket in Bucket::ALL {
            assert_eq!(Bucket::from_str(bucket.as_str()), Some(bucket));
        }
        assert_eq!(Bucket::from_str("other"), None);
    }

    #[test]
    fn test_file_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            Bucket::ALL.iter().map(|b| b.file_name()).collect();
        assert_eq!(names.len(), 3);
    }
}
