//! Display synchronization engine
//!
//! Keeps a displayed program snapshot in step with the authoritative current
//! index. Every trigger (startup, poll tick, cache change, manual refresh)
//! goes through the same `reconcile` step: read the index, compare it with
//! what the snapshot was built for, reload only when it differs.
//!
//! The remote API is preferred; when it is disabled or unreachable the local
//! cache supplies the index (absent = `"-1"`).
//!
//! Reloads are serialized: `reconcile` takes `&mut self` and the driver loop
//! handles one trigger at a time, skipping ticks missed while a reload runs.

use crate::client::CurrentIndexApi;
use crate::feed::ProgramSource;
use recital_common::cache::CURRENT_PROGRAM_KEY;
use recital_common::{LocalCache, ProgramIndex, ProgramItem};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Index bookkeeping for the display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Index the current snapshot was built for
    pub current_index: ProgramIndex,
    /// Index most recently returned by the authoritative source
    pub last_observed_index: ProgramIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Reloading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Initial,
    Tick,
    CacheChanged,
    ManualRefresh,
}

impl SyncTrigger {
    /// Startup and explicit refresh reload even when the index is unchanged
    fn forces_reload(self) -> bool {
        matches!(self, SyncTrigger::Initial | SyncTrigger::ManualRefresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged,
    Reloaded { items: usize },
    ReloadFailed,
}

impl ReconcileOutcome {
    pub fn needs_render(self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }
}

/// Where an observed index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Remote,
    Cache,
}

/// Read the authoritative current index
///
/// With an API: the remote value, or the cached value if the request fails.
/// Without one: the cached value.
pub async fn observe_current_index<A: CurrentIndexApi>(
    api: Option<&A>,
    cache: &LocalCache,
) -> (ProgramIndex, IndexOrigin) {
    if let Some(api) = api {
        match api.fetch_current_index().await {
            Ok(index) => return (index, IndexOrigin::Remote),
            Err(e) => warn!("Current program API unavailable, using local cache: {}", e),
        }
    }
    (cache.current_index(), IndexOrigin::Cache)
}

pub struct SyncEngine<A, P> {
    api: Option<A>,
    source: P,
    state: SyncState,
    snapshot: Vec<ProgramItem>,
    phase: watch::Sender<SyncPhase>,
    reloads: u64,
}

impl<A: CurrentIndexApi, P: ProgramSource> SyncEngine<A, P> {
    /// `api = None` runs on the local cache only
    pub fn new(api: Option<A>, source: P) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            api,
            source,
            state: SyncState::default(),
            snapshot: Vec::new(),
            phase,
            reloads: 0,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Items of the last completed reload (empty after a failed one)
    pub fn snapshot(&self) -> &[ProgramItem] {
        &self.snapshot
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Number of reloads attempted so far
    pub fn reload_count(&self) -> u64 {
        self.reloads
    }

    /// Pull the current index, diff it, reload on change
    pub async fn reconcile(
        &mut self,
        trigger: SyncTrigger,
        cache: &LocalCache,
    ) -> ReconcileOutcome {
        let (observed, origin) = observe_current_index(self.api.as_ref(), cache).await;
        self.state.last_observed_index = observed.clone();

        if observed == self.state.current_index && !trigger.forces_reload() {
            debug!(index = %observed, ?trigger, "Current program unchanged");
            return ReconcileOutcome::Unchanged;
        }

        if observed != self.state.current_index {
            info!(
                from = %self.state.current_index,
                to = %observed,
                ?origin,
                ?trigger,
                "Current program changed"
            );
        }
        self.state.current_index = observed;
        self.reload().await
    }

    async fn reload(&mut self) -> ReconcileOutcome {
        self.phase.send_replace(SyncPhase::Reloading);
        let result = self.source.load(&self.state.current_index).await;
        self.reloads += 1;

        let outcome = match result {
            Ok(items) => {
                let count = items.len();
                self.snapshot = items;
                ReconcileOutcome::Reloaded { items: count }
            }
            Err(e) => {
                error!("Error loading program: {}", e);
                self.snapshot.clear();
                ReconcileOutcome::ReloadFailed
            }
        };

        self.phase.send_replace(SyncPhase::Idle);
        outcome
    }
}

/// Intervals driving the display loop
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    pub poll_interval: Duration,
    pub cache_watch_interval: Duration,
}

/// Drive the engine until `shutdown` resolves
///
/// `render` is called after the initial load and after every reconcile that
/// reloaded (or failed to reload) the program; unchanged polls render nothing.
/// Each `()` received on `refresh` forces a reload.
pub async fn run_display<A, P, S, R>(
    engine: &mut SyncEngine<A, P>,
    cache: &LocalCache,
    timing: LoopTiming,
    mut refresh: mpsc::Receiver<()>,
    shutdown: S,
    mut render: R,
) where
    A: CurrentIndexApi,
    P: ProgramSource,
    S: Future<Output = ()>,
    R: FnMut(&SyncState, &[ProgramItem]),
{
    let mut changes = cache.subscribe();

    engine.reconcile(SyncTrigger::Initial, cache).await;
    render(engine.state(), engine.snapshot());

    let mut poll = tokio::time::interval(timing.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    poll.tick().await;

    let mut watch_cache = tokio::time::interval(timing.cache_watch_interval);
    watch_cache.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut refresh_open = true;
    tokio::pin!(shutdown);

    loop {
        let trigger = tokio::select! {
            _ = &mut shutdown => break,
            _ = poll.tick() => SyncTrigger::Tick,
            change = changes.recv() => match change {
                Ok(change) if change.key == CURRENT_PROGRAM_KEY => SyncTrigger::CacheChanged,
                Ok(_) | Err(RecvError::Closed) => continue,
                Err(RecvError::Lagged(_)) => SyncTrigger::CacheChanged,
            },
            _ = watch_cache.tick() => {
                // Detected changes come back through `changes`.
                if let Err(e) = cache.refresh_from_disk() {
                    warn!("Failed to re-read local cache: {}", e);
                }
                continue;
            }
            request = refresh.recv(), if refresh_open => match request {
                Some(()) => SyncTrigger::ManualRefresh,
                None => {
                    refresh_open = false;
                    continue;
                }
            },
        };

        if engine.reconcile(trigger, cache).await.needs_render() {
            render(engine.state(), engine.snapshot());
        }
    }

    info!("Display loop stopped");
}
