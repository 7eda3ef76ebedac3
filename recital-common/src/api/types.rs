//! Remote API request/response types

use crate::checkin::{CheckinField, PerformerCheckinRecord};
use crate::index::ProgramIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Current Program
// ========================================

/// Body of `GET` on the current-program resource
///
/// # Examples
///
/// ```
/// use recital_common::api::types::CurrentProgramResponse;
///
/// let body: CurrentProgramResponse =
///     serde_json::from_str(r#"{"currentProgramIndex": "4"}"#).unwrap();
/// assert_eq!(body.index().as_str(), "4");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentProgramResponse {
    /// Usually a string; numbers and null are tolerated
    #[serde(rename = "currentProgramIndex", default)]
    pub current_program_index: Option<Value>,
}

impl CurrentProgramResponse {
    pub fn index(&self) -> ProgramIndex {
        ProgramIndex::from_wire(self.current_program_index.as_ref())
    }
}

/// Body of `POST` on the current-program resource
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetCurrentProgramRequest {
    #[serde(rename = "currentProgramIndex")]
    pub current_program_index: String,

    /// ISO 8601 time the change was made
    pub timestamp: String,
}

impl SetCurrentProgramRequest {
    pub fn new(index: &ProgramIndex, timestamp: impl Into<String>) -> Self {
        Self {
            current_program_index: index.as_str().to_string(),
            timestamp: timestamp.into(),
        }
    }
}

// ========================================
// Check-in
// ========================================

/// Body of `POST` on the check-in update resource
///
/// Carries exactly one of the two flags: the one being toggled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckinUpdateRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<bool>,
}

impl CheckinUpdateRequest {
    /// Build the update for an already-toggled record
    pub fn for_toggle(updated: &PerformerCheckinRecord, field: CheckinField) -> Self {
        let (check_in, check_out) = match field {
            CheckinField::CheckIn => (Some(updated.check_in), None),
            CheckinField::CheckOut => (None, Some(updated.check_out)),
        };

        Self {
            name: updated.name.clone(),
            age: updated.numeric_age(),
            check_in,
            check_out,
        }
    }
}

// ========================================
// Tests
// ========================================
