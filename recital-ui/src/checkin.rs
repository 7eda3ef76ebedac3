//! Performer check-in board
//!
//! Holds the performer list, the name search and the transient notice for the
//! check-in surface. Toggles are de-duplicated per `(performer, field)`: a
//! second toggle of the same flag while the first is still in flight is
//! dropped without queueing.
//!
//! All methods take `&self`; the board state sits behind `std::sync::Mutex`es
//! that are never held across an await.

use crate::client::CheckinApi;
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use recital_common::api::CheckinUpdateRequest;
use recital_common::checkin::filter_by_name;
use recital_common::{CheckinField, LoadError, MutationError, PerformerCheckinRecord};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const LOADING_NOTICE: &str = "Loading performers…";
pub const LOAD_FAILED_NOTICE: &str = "Sorry, we could not load the check-in list. Please try again.";
pub const UPDATE_FAILED_NOTICE: &str = "Update failed. Please try again.";
pub const NO_MATCHES: &str = "No performers match your search.";
pub const NO_PERFORMERS: &str = "No performers available.";
pub const NOTHING_LOADED: &str = "No performers to show.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The update was accepted; carries the record as now shown
    Applied(PerformerCheckinRecord),
    /// Same flag already in flight for this performer
    Skipped,
}

type ToggleKey = (String, CheckinField);

/// Marks a toggle in flight for as long as it lives
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<ToggleKey>>,
    key: ToggleKey,
}

impl<'a> InFlightGuard<'a> {
    /// `None` when the key is already in flight
    fn acquire(in_flight: &'a Mutex<HashSet<ToggleKey>>, key: ToggleKey) -> Option<Self> {
        if !lock(in_flight).insert(key.clone()) {
            return None;
        }
        Some(Self { in_flight, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock leaves plain data behind; keep using it.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct BoardState {
    records: Vec<PerformerCheckinRecord>,
    query: String,
    load_failed: bool,
}

impl BoardState {
    fn replace_record(&mut self, record: PerformerCheckinRecord) {
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}

pub struct CheckinBoard<A> {
    api: A,
    state: Mutex<BoardState>,
    in_flight: Mutex<HashSet<ToggleKey>>,
    notices: Mutex<NoticeBoard>,
}

impl<A: CheckinApi> CheckinBoard<A> {
    pub fn new(api: A, notice_duration: Duration) -> Self {
        Self {
            api,
            state: Mutex::new(BoardState::default()),
            in_flight: Mutex::new(HashSet::new()),
            notices: Mutex::new(NoticeBoard::new(notice_duration)),
        }
    }

    /// Load the performer list
    ///
    /// A loading notice shows while the request runs and is cleared on
    /// success. On failure the previous list is kept and an error notice
    /// replaces it.
    pub async fn fetch_status(&self) -> Result<usize, LoadError> {
        self.post(NoticeKind::Info, LOADING_NOTICE);

        match self.api.fetch_checkin_status().await {
            Ok(records) => {
                let count = records.len();
                {
                    let mut state = lock(&self.state);
                    state.records = records;
                    state.load_failed = false;
                }
                lock(&self.notices).clear();
                info!(performers = count, "Check-in list loaded");
                Ok(count)
            }
            Err(e) => {
                error!("Error loading check-in list: {}", e);
                lock(&self.state).load_failed = true;
                self.post(NoticeKind::Error, LOAD_FAILED_NOTICE);
                Err(e)
            }
        }
    }

    pub fn set_query(&self, query: impl Into<String>) {
        lock(&self.state).query = query.into();
    }

    /// Records matching the current search
    pub fn visible(&self) -> Vec<PerformerCheckinRecord> {
        let state = lock(&self.state);
        filter_by_name(&state.records, &state.query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Placeholder to show when `visible()` is empty
    pub fn empty_message(&self) -> Option<&'static str> {
        let state = lock(&self.state);
        if state.records.is_empty() {
            return Some(if state.load_failed {
                NOTHING_LOADED
            } else {
                NO_PERFORMERS
            });
        }
        filter_by_name(&state.records, &state.query)
            .is_empty()
            .then_some(NO_MATCHES)
    }

    pub fn record(&self, name: &str) -> Option<PerformerCheckinRecord> {
        lock(&self.state)
            .records
            .iter()
            .find(|record| record.name == name)
            .cloned()
    }

    pub fn active_notice(&self) -> Option<Notice> {
        lock(&self.notices).active().cloned()
    }

    fn post(&self, kind: NoticeKind, message: impl Into<String>) {
        lock(&self.notices).post(kind, message);
    }

    /// Flip one flag of one performer
    pub async fn toggle(
        &self,
        name: &str,
        field: CheckinField,
    ) -> Result<ToggleOutcome, MutationError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, (name.to_string(), field))
        else {
            debug!(performer = name, %field, "Toggle already in flight, skipping");
            return Ok(ToggleOutcome::Skipped);
        };

        let updated = self
            .record(name)
            .ok_or_else(|| MutationError::UnknownPerformer(name.to_string()))?
            .toggled(field);
        let request = CheckinUpdateRequest::for_toggle(&updated, field);

        let returned = match self.api.send_checkin_update(&request).await {
            Ok(returned) => returned,
            Err(e) => {
                error!(performer = name, %field, "Check-in update failed: {}", e);
                self.post(NoticeKind::Error, UPDATE_FAILED_NOTICE);
                return Err(e);
            }
        };

        info!(performer = name, %field, value = updated.field(field), "Check-in updated");
        self.post(
            NoticeKind::Success,
            format!("{} {} updated.", updated.name, field.label()),
        );

        match self.api.fetch_checkin_status().await {
            Ok(records) => {
                let mut state = lock(&self.state);
                state.records = records;
                state.load_failed = false;
            }
            Err(e) => {
                warn!("Could not refresh check-in list, applying update locally: {}", e);
                lock(&self.state).replace_record(returned.unwrap_or_else(|| updated.clone()));
            }
        }

        Ok(ToggleOutcome::Applied(self.record(name).unwrap_or(updated)))
    }
}
