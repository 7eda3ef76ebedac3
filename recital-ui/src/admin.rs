//! Admin mutation client
//!
//! Sets or clears the current program item. The remote API is written first;
//! whatever it answers, the local view and the local cache are updated so the
//! display keeps working on the fallback path. There is no rollback.

use crate::client::CurrentIndexApi;
use crate::feed::ProgramSource;
use crate::notice::{NoticeBoard, NoticeKind};
use crate::sync::observe_current_index;
use recital_common::program::{apply_current, find_by_order};
use recital_common::{LoadError, LocalCache, MutationError, ProgramIndex, ProgramItem};
use std::time::Duration;
use tracing::{error, info, warn};

pub const CLEARED_NOTICE: &str = "Current program cleared";
pub const UPDATE_FAILED_NOTICE: &str = "Error updating program. Using local fallback.";
pub const LOAD_FAILED_NOTICE: &str = "Error loading program data";

/// What the admin surface currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminState {
    pub current_index: ProgramIndex,
    pub items: Vec<ProgramItem>,
}

pub struct AdminClient<A, P> {
    api: Option<A>,
    source: P,
    state: AdminState,
    notices: NoticeBoard,
}

impl<A: CurrentIndexApi, P: ProgramSource> AdminClient<A, P> {
    /// `api = None` writes the local cache only
    pub fn new(api: Option<A>, source: P, notice_duration: Duration) -> Self {
        Self {
            api,
            source,
            state: AdminState::default(),
            notices: NoticeBoard::new(notice_duration),
        }
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Read the current index (remote first, then cache)
    pub async fn load_current_index(&mut self, cache: &LocalCache) -> ProgramIndex {
        let (index, origin) = observe_current_index(self.api.as_ref(), cache).await;
        info!(index = %index, ?origin, "Admin loaded current program");
        self.state.current_index = index.clone();
        index
    }

    /// Reload the program list for the current index
    pub async fn load_program(&mut self) -> Result<usize, LoadError> {
        match self.source.load(&self.state.current_index).await {
            Ok(items) => {
                self.state.items = items;
                Ok(self.state.items.len())
            }
            Err(e) => {
                error!("Error loading program data: {}", e);
                self.state.items.clear();
                self.notices.post(NoticeKind::Error, LOAD_FAILED_NOTICE);
                Err(e)
            }
        }
    }

    /// Re-read the index, then the list
    pub async fn refresh(&mut self, cache: &LocalCache) -> Result<usize, LoadError> {
        self.load_current_index(cache).await;
        self.load_program().await
    }

    /// Make `order` the current item; `"-1"` clears
    ///
    /// Returns the item now current, if it is in the loaded list. On a remote
    /// failure the local state and cache are still updated before the error
    /// is returned.
    pub async fn set_current(
        &mut self,
        order: &str,
        cache: &LocalCache,
    ) -> Result<Option<ProgramItem>, MutationError> {
        let index = ProgramIndex::from_stored(Some(order.trim().to_string()));

        let remote = match &self.api {
            Some(api) => api.post_current_index(&index).await,
            None => Ok(()),
        };

        self.state.current_index = index.clone();
        apply_current(&mut self.state.items, &index);
        if let Err(e) = cache.store_current_index(&index) {
            warn!("Failed to update local cache: {}", e);
        }

        let current = if index.is_none() {
            None
        } else {
            let item = find_by_order(&self.state.items, index.as_str()).cloned();
            if item.is_none() {
                warn!(order = %index, "Current program set to an order not in the list");
            }
            item
        };

        match remote {
            Ok(()) => {
                let message = match &current {
                    _ if index.is_none() => CLEARED_NOTICE.to_string(),
                    Some(item) => format!("Set \"{}\" as current program", item.title),
                    None => format!("Set \"{}\" as current program", index),
                };
                info!(index = %index, "Current program updated");
                self.notices.post(NoticeKind::Success, message);
                Ok(current)
            }
            Err(e) => {
                error!("Error updating current program: {}", e);
                self.notices.post(NoticeKind::Error, UPDATE_FAILED_NOTICE);
                Err(e)
            }
        }
    }

    /// Click on the item at `position`: clears it when current, sets it otherwise
    pub async fn toggle_current(
        &mut self,
        position: usize,
        cache: &LocalCache,
    ) -> Result<Option<ProgramItem>, MutationError> {
        let item = self
            .state
            .items
            .get(position)
            .ok_or(MutationError::UnknownPosition(position))?;

        let target = if item.is_current {
            ProgramIndex::NONE.to_string()
        } else {
            item.order.clone()
        };
        self.set_current(&target, cache).await
    }

    pub async fn clear_all(&mut self, cache: &LocalCache) -> Result<(), MutationError> {
        self.set_current(ProgramIndex::NONE, cache).await.map(|_| ())
    }
}
