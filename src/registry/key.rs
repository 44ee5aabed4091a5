//! Registry key type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a project, participant, calibration, or recording.
///
/// Capture devices hand out plain integer ids when the caller does not pick
/// one; caller-chosen ids are free-form strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Device-assigned numeric id
    Index(u64),
    /// Caller-chosen id
    Name(String),
}

impl RecordKey {
    /// Parse a command token: digits become an index, anything else a name.
    pub fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => RecordKey::Index(n),
            Err(_) => RecordKey::Name(s.to_string()),
        }
    }

    /// Extract the numeric id if this key is an index.
    pub fn as_index(&self) -> Option<u64> {
        match self {
            RecordKey::Index(n) => Some(*n),
            _ => None,
        }
    }

    /// Next free integer id given the existing keys at one level.
    ///
    /// Name keys do not participate: a level holding only names starts at 0.
    pub fn next_index<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a RecordKey>,
    {
        let next = keys
            .into_iter()
            .filter_map(RecordKey::as_index)
            .max()
            .map_or(0, |n| n + 1);
        RecordKey::Index(next)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Index(n) => write!(f, "{}", n),
            RecordKey::Name(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for RecordKey {
    fn from(n: u64) -> Self {
        RecordKey::Index(n)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        RecordKey::Name(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digits_as_index() {
        assert_eq!(RecordKey::parse("42"), RecordKey::Index(42));
        assert_eq!(RecordKey::parse("study-a"), RecordKey::Name("study-a".into()));
        // mixed tokens are names, not numbers
        assert_eq!(RecordKey::parse("7b"), RecordKey::Name("7b".into()));
    }

    #[test]
    fn test_next_index_starts_at_zero() {
        assert_eq!(RecordKey::next_index([]), RecordKey::Index(0));
    }

    #[test]
    fn test_next_index_ignores_names() {
        let keys = [RecordKey::Name("warmup".into()), RecordKey::Index(3)];
        assert_eq!(RecordKey::next_index(&keys), RecordKey::Index(4));

        let names_only = [RecordKey::Name("warmup".into())];
        assert_eq!(RecordKey::next_index(&names_only), RecordKey::Index(0));
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(RecordKey::Index(3)).unwrap(),
            serde_json::json!(3)
        );
        assert_eq!(
            serde_json::to_value(RecordKey::Name("p1".into())).unwrap(),
            serde_json::json!("p1")
        );
        let key: RecordKey = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(key, RecordKey::Index(7));
    }
}
