//! Program model and loaders
//!
//! Two source shapes are supported:
//! - Tabular text (CSV): a header row, then one row per item with the fixed
//!   column order index, title, performances, image.
//! - A JSON array of sequence objects (`sequence`, `title`, `actors` and
//!   free-text detail fields), defaulted where fields are missing.
//!
//! In both shapes `is_current` is set by exact string comparison of the
//! item order against the externally supplied current index.

use crate::csv;
use crate::error::ParseError;
use crate::index::ProgramIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Placeholder title for sequences without one
pub const UNTITLED: &str = "Untitled";

/// Placeholder description for sequences without one
pub const DETAILS_PENDING: &str = "Details to be announced";

/// Who performs an item: a free-text line (CSV) or a list of actors (JSON)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Performers {
    Text(String),
    Actors(Vec<String>),
}

impl Performers {
    /// One-line rendering of the performers
    pub fn summary(&self) -> String {
        match self {
            Performers::Text(text) => text.clone(),
            Performers::Actors(actors) => actors.join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Performers::Text(text) => text.is_empty(),
            Performers::Actors(actors) => actors.is_empty(),
        }
    }
}

/// Free-text details carried by JSON sequences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceDetails {
    pub description: String,
    pub costume: String,
    pub notes: String,
}

/// What accompanies an item on screen: an image file (CSV) or details (JSON)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    Image { file: String },
    Details(SequenceDetails),
}

impl Presentation {
    /// Resolve the image file against an images directory
    ///
    /// Returns `None` for detail presentations and empty file names.
    pub fn image_path(&self, images_dir: &Path) -> Option<PathBuf> {
        match self {
            Presentation::Image { file } if !file.is_empty() => Some(images_dir.join(file)),
            _ => None,
        }
    }
}

/// One entry of the recital program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramItem {
    /// Stable ordinal key ("1", "2", ...)
    pub order: String,
    pub title: String,
    pub performers: Performers,
    pub presentation: Presentation,
    pub is_current: bool,
}

/// Shape of the program source payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramFormat {
    #[default]
    Csv,
    Sequences,
}

/// Parse a program payload of the given format
pub fn parse_program(
    format: ProgramFormat,
    body: &str,
    current: &ProgramIndex,
) -> Result<Vec<ProgramItem>, ParseError> {
    let mut items = match format {
        ProgramFormat::Csv => parse_program_csv(body, current),
        ProgramFormat::Sequences => parse_sequences_json(body, current)?,
    };
    // Duplicate orders must not produce two current items.
    apply_current(&mut items, current);
    Ok(items)
}

/// Parse the tabular program document
///
/// Rows shorter than four fields are padded with empty strings; extra
/// fields are ignored.
pub fn parse_program_csv(text: &str, current: &ProgramIndex) -> Vec<ProgramItem> {
    csv::data_rows(text)
        .map(|mut fields| {
            fields.resize(fields.len().max(4), String::new());
            let mut fields = fields.into_iter();
            let order = fields.next().unwrap_or_default();
            let title = fields.next().unwrap_or_default();
            let performances = fields.next().unwrap_or_default();
            let image = fields.next().unwrap_or_default();

            ProgramItem {
                is_current: current.matches(&order),
                order,
                title,
                performers: Performers::Text(performances),
                presentation: Presentation::Image { file: image },
            }
        })
        .collect()
}

/// Raw sequence object as served by the sequences API
#[derive(Debug, Deserialize)]
struct RawSequence {
    #[serde(default)]
    sequence: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    actors: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    costume: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

/// Parse the JSON sequences payload
///
/// A missing `sequence` falls back to the 1-based position in the array.
pub fn parse_sequences_json(
    body: &str,
    current: &ProgramIndex,
) -> Result<Vec<ProgramItem>, ParseError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ParseError::Json(e.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(ParseError::UnexpectedShape(
            "expected a JSON array of sequences".to_string(),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let raw: RawSequence = serde_json::from_value(entry)
                .map_err(|e| ParseError::Json(format!("sequence #{}: {}", position + 1, e)))?;

            let order = match raw.sequence {
                Some(Value::String(s)) if !s.is_empty() => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => (position + 1).to_string(),
            };

            Ok(ProgramItem {
                is_current: current.matches(&order),
                order,
                title: non_empty_or(raw.title, UNTITLED),
                performers: Performers::Actors(raw.actors.unwrap_or_default()),
                presentation: Presentation::Details(SequenceDetails {
                    description: non_empty_or(raw.description, DETAILS_PENDING),
                    costume: raw.costume.unwrap_or_default(),
                    notes: raw.notes.unwrap_or_default(),
                }),
            })
        })
        .collect()
}

/// Re-mark `is_current` on every item for a new current index
///
/// Mirrors the server-side exclusivity locally: afterwards at most one item
/// (the first whose order matches) is current.
pub fn apply_current(items: &mut [ProgramItem], current: &ProgramIndex) {
    let mut marked = false;
    for item in items.iter_mut() {
        item.is_current = !marked && current.matches(&item.order);
        marked |= item.is_current;
    }
}

/// Position of the current item, if any
pub fn current_position(items: &[ProgramItem]) -> Option<usize> {
    items.iter().position(|item| item.is_current)
}

/// Look up an item by order
pub fn find_by_order<'a>(items: &'a [ProgramItem], order: &str) -> Option<&'a ProgramItem> {
    items.iter().find(|item| item.order == order)
}
