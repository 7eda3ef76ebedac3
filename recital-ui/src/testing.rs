//! In-memory doubles for the API and program source traits
//!
//! Each double is a cheap `Arc` handle: tests keep one clone to script
//! behavior and inspect calls while the code under test owns another.

use crate::client::{CheckinApi, CurrentIndexApi};
use crate::feed::ProgramSource;
use crate::sync::SyncPhase;
use recital_common::api::CheckinUpdateRequest;
use recital_common::program::apply_current;
use recital_common::{
    FetchError, LoadError, MutationError, Performers, PerformerCheckinRecord, Presentation,
    ProgramIndex, ProgramItem,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Notify};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

fn unavailable() -> LoadError {
    FetchError::Network("connection refused".into()).into()
}

// ========================================
// Current index
// ========================================

#[derive(Default)]
struct IndexInner {
    index: ProgramIndex,
    fail_fetches: bool,
    fail_posts: bool,
    fetches: usize,
    posted: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeIndexApi {
    inner: Arc<Mutex<IndexInner>>,
}

impl FakeIndexApi {
    pub fn with_index(index: &str) -> Self {
        let api = Self::default();
        api.set_index(index);
        api
    }

    pub fn set_index(&self, index: &str) {
        lock(&self.inner).index = ProgramIndex::new(index);
    }

    pub fn index(&self) -> ProgramIndex {
        lock(&self.inner).index.clone()
    }

    pub fn fail_fetches(&self, fail: bool) {
        lock(&self.inner).fail_fetches = fail;
    }

    pub fn fail_posts(&self, fail: bool) {
        lock(&self.inner).fail_posts = fail;
    }

    pub fn fetches(&self) -> usize {
        lock(&self.inner).fetches
    }

    pub fn posted(&self) -> Vec<String> {
        lock(&self.inner).posted.clone()
    }
}

impl CurrentIndexApi for FakeIndexApi {
    async fn fetch_current_index(&self) -> Result<ProgramIndex, LoadError> {
        let mut inner = lock(&self.inner);
        inner.fetches += 1;
        if inner.fail_fetches {
            return Err(unavailable());
        }
        Ok(inner.index.clone())
    }

    async fn post_current_index(&self, index: &ProgramIndex) -> Result<(), MutationError> {
        let mut inner = lock(&self.inner);
        inner.posted.push(index.to_string());
        if inner.fail_posts {
            return Err(MutationError::Transport("connection refused".into()));
        }
        inner.index = index.clone();
        Ok(())
    }
}

// ========================================
// Program source
// ========================================

#[derive(Default)]
struct SourceInner {
    items: Vec<ProgramItem>,
    fail_loads: bool,
    loads: usize,
    phase: Option<watch::Receiver<SyncPhase>>,
    phases_seen: Vec<SyncPhase>,
}

#[derive(Clone, Default)]
pub struct FakeProgramSource {
    inner: Arc<Mutex<SourceInner>>,
}

pub fn program_item(order: &str, title: &str) -> ProgramItem {
    ProgramItem {
        order: order.to_string(),
        title: title.to_string(),
        performers: Performers::Text(format!("Seq. {}", order)),
        presentation: Presentation::Image {
            file: format!("{}.jpg", order),
        },
        is_current: false,
    }
}

impl FakeProgramSource {
    /// Items titled "Item <order>"
    pub fn with_orders(orders: &[&str]) -> Self {
        let items = orders
            .iter()
            .map(|order| program_item(order, &format!("Item {}", order)))
            .collect();
        Self::with_items(items)
    }

    pub fn with_items(items: Vec<ProgramItem>) -> Self {
        let source = Self::default();
        lock(&source.inner).items = items;
        source
    }

    pub fn fail_loads(&self, fail: bool) {
        lock(&self.inner).fail_loads = fail;
    }

    pub fn loads(&self) -> usize {
        lock(&self.inner).loads
    }

    /// Record the engine phase observed at each load
    pub fn watch_phase(&self, phase: watch::Receiver<SyncPhase>) {
        lock(&self.inner).phase = Some(phase);
    }

    pub fn phases_seen(&self) -> Vec<SyncPhase> {
        lock(&self.inner).phases_seen.clone()
    }
}

impl ProgramSource for FakeProgramSource {
    async fn load(&self, current: &ProgramIndex) -> Result<Vec<ProgramItem>, LoadError> {
        let mut inner = lock(&self.inner);
        inner.loads += 1;

        let phase = inner.phase.as_ref().map(|rx| *rx.borrow());
        if let Some(phase) = phase {
            inner.phases_seen.push(phase);
        }

        if inner.fail_loads {
            return Err(unavailable());
        }

        let mut items = inner.items.clone();
        apply_current(&mut items, current);
        Ok(items)
    }
}

// ========================================
// Check-in
// ========================================

#[derive(Default)]
struct CheckinInner {
    records: Vec<PerformerCheckinRecord>,
    fail_fetches: bool,
    fail_updates: bool,
    echo_record: bool,
    fetches: usize,
    updates: Vec<CheckinUpdateRequest>,
    gate: Option<Arc<Notify>>,
    fetch_gate: Option<Arc<Notify>>,
}

#[derive(Clone, Default)]
pub struct FakeCheckinApi {
    inner: Arc<Mutex<CheckinInner>>,
}

impl FakeCheckinApi {
    pub fn with_records(records: Vec<PerformerCheckinRecord>) -> Self {
        let api = Self::default();
        lock(&api.inner).records = records;
        api
    }

    pub fn fail_fetches(&self, fail: bool) {
        lock(&self.inner).fail_fetches = fail;
    }

    pub fn fail_updates(&self, fail: bool) {
        lock(&self.inner).fail_updates = fail;
    }

    /// Answer updates with the stored record
    pub fn echo_record(&self, echo: bool) {
        lock(&self.inner).echo_record = echo;
    }

    /// Hold every update until the returned `Notify` is signalled
    pub fn gate_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.inner).gate = Some(gate.clone());
        gate
    }

    /// Hold every status fetch until the returned `Notify` is signalled
    pub fn gate_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.inner).fetch_gate = Some(gate.clone());
        gate
    }

    pub fn fetches(&self) -> usize {
        lock(&self.inner).fetches
    }

    pub fn updates(&self) -> Vec<CheckinUpdateRequest> {
        lock(&self.inner).updates.clone()
    }
}

impl CheckinApi for FakeCheckinApi {
    async fn fetch_checkin_status(&self) -> Result<Vec<PerformerCheckinRecord>, LoadError> {
        let gate = lock(&self.inner).fetch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = lock(&self.inner);
        inner.fetches += 1;
        if inner.fail_fetches {
            return Err(unavailable());
        }
        Ok(inner.records.clone())
    }

    async fn send_checkin_update(
        &self,
        request: &CheckinUpdateRequest,
    ) -> Result<Option<PerformerCheckinRecord>, MutationError> {
        let gate = lock(&self.inner).gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = lock(&self.inner);
        inner.updates.push(request.clone());
        if inner.fail_updates {
            return Err(MutationError::Rejected(500));
        }

        let echo = inner.echo_record;
        let stored = inner
            .records
            .iter_mut()
            .find(|record| record.name == request.name)
            .ok_or_else(|| MutationError::UnknownPerformer(request.name.clone()))?;
        if let Some(check_in) = request.check_in {
            stored.check_in = check_in;
        }
        if let Some(check_out) = request.check_out {
            stored.check_out = check_out;
        }

        Ok(echo.then(|| stored.clone()))
    }
}
