//! Source-revision metadata stamped onto every result row of a run.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Full commit id plus commit time of the checkout a pipeline ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub git_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl RevisionInfo {
    /// Build revision info, truncating the timestamp to microseconds so it
    /// round-trips through the µs `timestamp` column unchanged.
    pub fn new(git_hash: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            git_hash: git_hash.into(),
            timestamp: timestamp.trunc_subsecs(6),
        }
    }

    /// Build from a commit time expressed in seconds since the Unix epoch.
    pub fn from_epoch_seconds(git_hash: impl Into<String>, seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|ts| Self::new(git_hash, ts))
    }

    /// First `len` characters of the commit id (the whole id if shorter).
    pub fn short_hash(&self, len: usize) -> &str {
        short_prefix(&self.git_hash, len)
    }
}

/// Char-boundary-safe prefix of at most `len` characters.
pub fn short_prefix(value: &str, len: usize) -> &str {
    match value.char_indices().nth(len) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prefix_handles_short_values() {
        assert_eq!(short_prefix("abcdef", 3), "abc");
        assert_eq!(short_prefix("ab", 3), "ab");
        assert_eq!(short_prefix("", 8), "");
    }

    #[test]
    fn timestamp_truncated_to_micros() {
        let ts = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let info = RevisionInfo::new("abc", ts);
        assert_eq!(info.timestamp.timestamp_subsec_nanos(), 123_456_000);
    }
}
