//! Sync status vocabulary.

use lockbox_types::ShareId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether the running sync expects UI-blocking feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncMode {
    #[default]
    Background,
    Foreground,
}

/// Why a sync ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncFailure {
    /// The driver stopped the sync.
    Cancelled,
    /// The remote store or transport reported an error.
    Upstream(String),
}

/// Lifecycle of the item sync.
///
/// ```text
/// NotStarted ──► Syncing ──► Synced
///                  ▲  │
///                  │  └────► Failed
///     Synced/Failed┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSyncStatus {
    #[default]
    NotStarted,
    Syncing(SyncMode),
    Synced,
    Failed(SyncFailure),
}

impl ItemSyncStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `NotStarted` is never a target; only a reset returns there.
    #[must_use]
    pub fn can_transition_to(&self, next: &ItemSyncStatus) -> bool {
        match next {
            Self::NotStarted => false,
            Self::Syncing(_) => !self.is_syncing(),
            Self::Synced | Self::Failed(_) => self.is_syncing(),
        }
    }

    #[must_use]
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing(_))
    }
}

/// Latest status together with the latest mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: ItemSyncStatus,
    pub mode: SyncMode,
}

/// Download counters for one share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSyncStatusPayload {
    pub downloaded: u64,
    pub total: u64,
}

impl ItemSyncStatusPayload {
    #[must_use]
    pub fn new(downloaded: u64, total: u64) -> Self {
        Self { downloaded, total }
    }

    /// Every item of the share has been downloaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.downloaded >= self.total
    }

    /// Records these counters for `share_id` in `aggregate`, replacing any
    /// earlier counters for the same share.
    pub fn merge_into(self, share_id: ShareId, aggregate: &mut BTreeMap<ShareId, Self>) {
        aggregate.insert(share_id, self);
    }
}
