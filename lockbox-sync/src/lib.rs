//! Item sync status tracking for lockbox.
//!
//! A remote-sync driver (not part of this crate) pulls encrypted items into
//! the local store and reports its progress here. UI observers and the
//! migration coordinator read it back.
//!
//! ## Components
//!
//! - **Status**: `ItemSyncStatus`, `SyncMode` and the per-share download
//!   counters (`ItemSyncStatusPayload`)
//! - **Tracker**: the single authoritative sync state of the process
//! - **Accumulator**: the per-share progress map of the running sync and the
//!   most recent inserted-items notification
//!
//! Every observable value lives in a `tokio::sync::watch` channel, so a
//! subscriber always starts from the latest value and never sees a history.
//! There is one writer (the driver) and any number of readers.
//!
//! # Example
//!
//! ```
//! use lockbox_sync::{ItemSyncStatus, SyncMode, SyncStatusTracker};
//!
//! let tracker = SyncStatusTracker::default();
//! assert!(tracker.emit(ItemSyncStatus::Syncing(SyncMode::Foreground)));
//! assert!(tracker.emit(ItemSyncStatus::Synced));
//! assert_eq!(tracker.state().mode, SyncMode::Foreground);
//! ```

mod accumulator;
mod status;
mod stream;
mod tracker;

pub use accumulator::{DownloadedItems, PerShareSyncAccumulator};
pub use status::{ItemSyncStatus, ItemSyncStatusPayload, SyncFailure, SyncMode, SyncState};
pub use stream::{watch_stream, WatchStream};
pub use tracker::SyncStatusTracker;
