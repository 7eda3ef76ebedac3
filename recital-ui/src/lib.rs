//! recital-ui library - display, admin and check-in clients
//!
//! Thin clients over the recital HTTP API with the local cache as fallback:
//! - `sync`: polling engine keeping the display in step with the current index
//! - `admin`: set/clear the current program item
//! - `checkin`: performer check-in board with de-duplicated toggles
//! - `view`: text rendering of all three surfaces

pub mod admin;
pub mod checkin;
pub mod client;
pub mod feed;
pub mod logging;
pub mod notice;
pub mod sync;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{AdminClient, AdminState};
pub use checkin::{CheckinBoard, ToggleOutcome};
pub use client::{ApiClient, CheckinApi, CurrentIndexApi};
pub use feed::{ProgramFeed, ProgramLocation, ProgramSource};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use sync::{ReconcileOutcome, SyncEngine, SyncPhase, SyncState, SyncTrigger};
