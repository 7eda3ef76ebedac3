//! Current program index
//!
//! The ordinal key of the program item being performed. `"-1"` is the
//! sentinel for "nothing current". Comparison is exact string equality.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordinal key of the current program item, or the `"-1"` sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramIndex(String);

impl ProgramIndex {
    /// Wire value meaning "no item is current"
    pub const NONE: &'static str = "-1";

    /// Wrap a raw index without normalization
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The "nothing current" sentinel
    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    /// Interpret a value read from the API or the local cache
    ///
    /// Missing, null and empty values all mean "nothing current". Numbers are
    /// accepted and compared by their decimal rendering.
    pub fn from_wire(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.is_empty() => Self(s.clone()),
            Some(Value::Number(n)) => Self(n.to_string()),
            _ => Self::none(),
        }
    }

    /// Interpret an optional stored string (absent or empty = sentinel)
    pub fn from_stored(value: Option<String>) -> Self {
        match value {
            Some(s) if !s.is_empty() => Self(s),
            _ => Self::none(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this index designates the item with the given order
    ///
    /// The sentinel never matches, even an item whose order is literally "-1".
    pub fn matches(&self, order: &str) -> bool {
        !self.is_none() && self.0 == order
    }
}

impl Default for ProgramIndex {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for ProgramIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProgramIndex {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_sentinel() {
        assert!(ProgramIndex::default().is_none());
        assert_eq!(ProgramIndex::default().as_str(), "-1");
    }

    #[test]
    fn test_from_wire_normalizes_missing_values() {
        assert!(ProgramIndex::from_wire(None).is_none());
        assert!(ProgramIndex::from_wire(Some(&Value::Null)).is_none());
        assert!(ProgramIndex::from_wire(Some(&json!(""))).is_none());
        assert_eq!(ProgramIndex::from_wire(Some(&json!("3"))).as_str(), "3");
        assert_eq!(ProgramIndex::from_wire(Some(&json!(7))).as_str(), "7");
    }

    #[test]
    fn test_sentinel_never_matches() {
        let none = ProgramIndex::none();
        assert!(!none.matches("-1"));
        assert!(!none.matches("1"));

        let three = ProgramIndex::new("3");
        assert!(three.matches("3"));
        assert!(!three.matches("03"));
        assert!(!three.matches(" 3"));
    }

    #[test]
    fn test_from_stored() {
        assert!(ProgramIndex::from_stored(None).is_none());
        assert!(ProgramIndex::from_stored(Some(String::new())).is_none());
        assert_eq!(ProgramIndex::from_stored(Some("2".into())).as_str(), "2");
    }
}
