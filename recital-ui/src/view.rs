//! Text rendering of the display, admin and check-in surfaces
//!
//! `DisplayView` is a pure view model derived from the program snapshot; the
//! `render_*` functions turn state into the plain text the binary prints.

use crate::admin::AdminState;
use crate::notice::Notice;
use recital_common::program::current_position;
use recital_common::{PerformerCheckinRecord, Presentation, ProgramItem};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// One of the two headline cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub heading: String,
    pub detail: String,
    pub image: Option<PathBuf>,
}

impl Card {
    fn message(heading: &str, detail: &str) -> Self {
        Self {
            heading: heading.to_string(),
            detail: detail.to_string(),
            image: None,
        }
    }

    fn item(item: &ProgramItem, images_dir: &Path) -> Self {
        let detail = match &item.presentation {
            Presentation::Details(details) if item.performers.is_empty() => {
                details.description.clone()
            }
            _ => item.performers.summary(),
        };
        Self {
            heading: item.title.clone(),
            detail,
            image: item.presentation.image_path(images_dir),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Completed,
    NowPlaying,
    Upcoming,
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Completed => "Completed",
            ItemStatus::NowPlaying => "Now Playing",
            ItemStatus::Upcoming => "Upcoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub order: String,
    pub title: String,
    pub performers: String,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayView {
    pub now_playing: Card,
    pub up_next: Card,
    pub list: Vec<ListEntry>,
}

/// Where the show stands relative to the list
#[derive(Clone, Copy)]
enum Progress {
    Waiting,
    At(usize),
}

/// An index that matches no item counts as nothing current
fn progress(items: &[ProgramItem]) -> Progress {
    match current_position(items) {
        Some(position) => Progress::At(position),
        None => Progress::Waiting,
    }
}

impl DisplayView {
    pub fn build(items: &[ProgramItem], images_dir: &Path) -> Self {
        let progress = progress(items);

        let now_playing = match progress {
            Progress::Waiting => Card::message("Welcome", "Program will begin shortly"),
            Progress::At(position) => Card::item(&items[position], images_dir),
        };

        let up_next = match progress {
            Progress::Waiting => match items.first() {
                Some(first) => Card::item(first, images_dir),
                None => Card::message("Loading...", "Please wait"),
            },
            Progress::At(position) if position + 1 < items.len() => {
                Card::item(&items[position + 1], images_dir)
            }
            Progress::At(_) => {
                Card::message("No more performances", "This concludes our recital")
            }
        };

        let list = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let status = match progress {
                    Progress::At(position) if i < position => ItemStatus::Completed,
                    Progress::At(position) if i == position => ItemStatus::NowPlaying,
                    _ => ItemStatus::Upcoming,
                };
                ListEntry {
                    order: item.order.clone(),
                    title: item.title.clone(),
                    performers: item.performers.summary(),
                    status,
                }
            })
            .collect();

        Self {
            now_playing,
            up_next,
            list,
        }
    }
}

fn write_card(out: &mut String, label: &str, card: &Card) {
    let _ = writeln!(out, "{}: {}", label, card.heading);
    if !card.detail.is_empty() {
        let _ = writeln!(out, "    {}", card.detail);
    }
    if let Some(image) = &card.image {
        let _ = writeln!(out, "    [{}]", image.display());
    }
}

fn write_notice(out: &mut String, notice: Option<&Notice>) {
    if let Some(notice) = notice {
        let _ = writeln!(out, "({}) {}", notice.kind.label(), notice.message);
    }
}

/// Full display screen; `header` is the formatted local date/time
pub fn render_display(view: &DisplayView, header: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out);
    write_card(&mut out, "Now Playing", &view.now_playing);
    write_card(&mut out, "Up Next", &view.up_next);

    if view.list.is_empty() {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Program");
    for entry in &view.list {
        let _ = writeln!(
            out,
            "  {:>3}. {:<32} {:<12} {}",
            entry.order,
            entry.title,
            entry.status.label(),
            entry.performers
        );
    }
    out
}

/// Admin list: one line per item with its action label
pub fn render_admin(state: &AdminState, notice: Option<&Notice>) -> String {
    let mut out = String::new();
    write_notice(&mut out, notice);

    if state.items.is_empty() {
        let _ = writeln!(out, "No program items loaded.");
        return out;
    }

    for (position, item) in state.items.iter().enumerate() {
        let marker = if item.is_current { '*' } else { ' ' };
        let action = if item.is_current { "Clear" } else { "Set Current" };
        let _ = writeln!(
            out,
            "{} [{}] {}. {}  ({})  <{}>",
            marker,
            position,
            item.order,
            item.title,
            item.performers.summary(),
            action
        );
    }
    out
}

fn flag(set: bool) -> &'static str {
    if set {
        "yes"
    } else {
        "no"
    }
}

/// Check-in table for the visible records
pub fn render_checkin(
    records: &[PerformerCheckinRecord],
    empty_message: Option<&str>,
    notice: Option<&Notice>,
) -> String {
    let mut out = String::new();
    write_notice(&mut out, notice);

    if records.is_empty() {
        let _ = writeln!(out, "{}", empty_message.unwrap_or_default());
        return out;
    }

    let _ = writeln!(
        out,
        "{:<24} {:>4} {:<10} {:<8} {:<9} {:<16} Instructions",
        "Name", "Age", "Group", "In", "Out", "Quick change"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<24} {:>4} {:<10} {:<8} {:<9} {:<16} {}",
            record.name,
            record.age,
            record.cafeteria_group,
            flag(record.check_in),
            flag(record.check_out),
            record.quick_change,
            record.special_instructions
        );
    }
    out
}
