//! Performer check-in records
//!
//! Records arrive from the check-in status endpoint as loosely typed JSON.
//! They are normalized here: missing text fields get display defaults and the
//! two flags are coerced by truthiness.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const UNNAMED_PERFORMER: &str = "Unnamed Performer";
pub const MISSING_VALUE: &str = "—";

/// One of the two independent per-performer flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinField {
    CheckIn,
    CheckOut,
}

impl CheckinField {
    /// Wire name (`check_in` / `check_out`)
    pub fn as_str(self) -> &'static str {
        match self {
            CheckinField::CheckIn => "check_in",
            CheckinField::CheckOut => "check_out",
        }
    }

    /// Human label used in notices
    pub fn label(self) -> &'static str {
        match self {
            CheckinField::CheckIn => "check-in",
            CheckinField::CheckOut => "check-out",
        }
    }
}

impl fmt::Display for CheckinField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckinField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "check_in" | "in" => Ok(CheckinField::CheckIn),
            "check_out" | "out" => Ok(CheckinField::CheckOut),
            other => Err(format!(
                "unknown field '{}': expected check_in or check_out",
                other
            )),
        }
    }
}

/// Normalized performer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformerCheckinRecord {
    /// Unique key
    pub name: String,
    pub age: String,
    pub cafeteria_group: String,
    pub quick_change: String,
    pub special_instructions: String,
    pub check_in: bool,
    pub check_out: bool,
}

/// JavaScript-style truthiness, which is what the status API was written against
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    if !truthy(value) {
        return default.to_string();
    }
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    }
}

impl PerformerCheckinRecord {
    /// Normalize one raw status entry
    pub fn from_value(raw: &Value) -> Self {
        let instructions = if truthy(raw.get("other_special_instructions")) {
            raw.get("other_special_instructions")
        } else {
            raw.get("other_instructions")
        };

        Self {
            name: text_or(raw.get("name"), UNNAMED_PERFORMER),
            age: text_or(raw.get("age"), MISSING_VALUE),
            cafeteria_group: text_or(raw.get("cafeteria_group"), MISSING_VALUE),
            quick_change: text_or(raw.get("quick_change"), ""),
            special_instructions: text_or(instructions, ""),
            check_in: truthy(raw.get("check_in")),
            check_out: truthy(raw.get("check_out")),
        }
    }

    pub fn field(&self, field: CheckinField) -> bool {
        match field {
            CheckinField::CheckIn => self.check_in,
            CheckinField::CheckOut => self.check_out,
        }
    }

    /// Copy with exactly `field` flipped
    pub fn toggled(&self, field: CheckinField) -> Self {
        let mut updated = self.clone();
        match field {
            CheckinField::CheckIn => updated.check_in = !updated.check_in,
            CheckinField::CheckOut => updated.check_out = !updated.check_out,
        }
        updated
    }

    /// Age as a JSON number, when it reads as one
    pub fn numeric_age(&self) -> Option<serde_json::Number> {
        let age: f64 = self.age.trim().parse().ok()?;
        if !age.is_finite() {
            return None;
        }
        if age.fract() == 0.0 && age.abs() < i64::MAX as f64 {
            Some(serde_json::Number::from(age as i64))
        } else {
            serde_json::Number::from_f64(age)
        }
    }
}

/// Normalize a full status payload
pub fn parse_status(body: Value) -> Result<Vec<PerformerCheckinRecord>, ParseError> {
    match body {
        Value::Array(entries) => Ok(entries
            .iter()
            .map(PerformerCheckinRecord::from_value)
            .collect()),
        _ => Err(ParseError::UnexpectedShape(
            "Unexpected response format from check-in API".to_string(),
        )),
    }
}

/// Case-insensitive substring filter on the performer name
///
/// An empty (or all-whitespace) query keeps every record.
pub fn filter_by_name<'a>(
    records: &'a [PerformerCheckinRecord],
    query: &str,
) -> Vec<&'a PerformerCheckinRecord> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|record| query.is_empty() || record.name.to_lowercase().contains(&query))
        .collect()
}
