//! The process-wide sync status state machine.

use crate::stream::{watch_stream, WatchStream};
use crate::{ItemSyncStatus, PerShareSyncAccumulator, SyncMode, SyncState};
use futures::future;
use futures::stream::StreamExt;
use lockbox_types::ShareId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Authoritative sync state of the process.
///
/// Status and mode are kept together in one `watch` channel, so every
/// subscriber reading at the same moment sees the same `(status, mode)` pair
/// and late subscribers start from the latest one.
///
/// The tracker does not serialize writers. A driver must not start a second
/// sync while one is running; such an emission is rejected and logged, and
/// the current state is left untouched.
pub struct SyncStatusTracker {
    state: watch::Sender<SyncState>,
    accumulator: Arc<PerShareSyncAccumulator>,
}

impl SyncStatusTracker {
    /// Creates a tracker in `NotStarted` that resets `accumulator` on
    /// [`clear`](Self::clear).
    pub fn new(accumulator: Arc<PerShareSyncAccumulator>) -> Self {
        Self {
            state: watch::Sender::new(SyncState::default()),
            accumulator,
        }
    }

    pub fn accumulator(&self) -> &Arc<PerShareSyncAccumulator> {
        &self.accumulator
    }

    /// Publishes a status transition.
    ///
    /// Entering `Syncing(mode)` also sets the mode. Returns `false` if the
    /// transition is illegal from the current status, in which case nothing
    /// is published.
    pub fn emit(&self, status: ItemSyncStatus) -> bool {
        let mut rejected_from = None;
        self.state.send_if_modified(|state| {
            if !state.status.can_transition_to(&status) {
                rejected_from = Some(state.status.clone());
                return false;
            }
            if let ItemSyncStatus::Syncing(mode) = &status {
                state.mode = *mode;
            }
            state.status = status.clone();
            true
        });

        match rejected_from {
            Some(from) => {
                warn!("Ignoring sync status transition {:?} -> {:?}", from, status);
                false
            }
            None => {
                match &status {
                    ItemSyncStatus::Synced | ItemSyncStatus::Failed(_) => {
                        info!("Item sync finished: {:?}", status)
                    }
                    _ => debug!("Item sync status: {:?}", status),
                }
                true
            }
        }
    }

    /// Sets the mode without touching the status.
    pub fn set_mode(&self, mode: SyncMode) {
        self.state.send_if_modified(|state| {
            let changed = state.mode != mode;
            state.mode = mode;
            changed
        });
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ItemSyncStatus {
        self.state.borrow().status.clone()
    }

    pub fn mode(&self) -> SyncMode {
        self.state.borrow().mode
    }

    pub fn is_syncing(&self) -> bool {
        self.state.borrow().status.is_syncing()
    }

    /// Whether a write touching `shares` would race the running sync.
    ///
    /// Nothing conflicts outside `Syncing`. While syncing, a share is clear
    /// once its download has completed in the accumulator.
    pub fn conflicts_with<'a>(&self, shares: impl IntoIterator<Item = &'a ShareId>) -> bool {
        if !self.is_syncing() {
            return false;
        }
        shares
            .into_iter()
            .any(|share_id| !self.accumulator.is_share_complete(share_id))
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Latest `(status, mode)`, then every change to either.
    pub fn observe_sync_state(&self) -> WatchStream<SyncState> {
        watch_stream(self.state.subscribe())
    }

    /// Latest status, then every status change.
    pub fn observe_status(&self) -> WatchStream<ItemSyncStatus> {
        let mut last: Option<ItemSyncStatus> = None;
        watch_stream(self.state.subscribe())
            .filter_map(move |state| {
                let fresh = last.as_ref() != Some(&state.status);
                if fresh {
                    last = Some(state.status.clone());
                }
                future::ready(fresh.then_some(state.status))
            })
            .boxed()
    }

    /// Latest mode, then every mode change.
    pub fn observe_mode(&self) -> WatchStream<SyncMode> {
        let mut last: Option<SyncMode> = None;
        watch_stream(self.state.subscribe())
            .filter_map(move |state| {
                let fresh = last != Some(state.mode);
                last = Some(state.mode);
                future::ready(fresh.then_some(state.mode))
            })
            .boxed()
    }

    /// Resets to `NotStarted` in the default mode and clears the
    /// accumulator. Used when the session ends.
    pub fn clear(&self) {
        self.state.send_replace(SyncState::default());
        self.accumulator.clear();
        debug!("Item sync state cleared");
    }
}

impl Default for SyncStatusTracker {
    fn default() -> Self {
        Self::new(Arc::new(PerShareSyncAccumulator::new()))
    }
}
