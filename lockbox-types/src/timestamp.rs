//! Wall-clock timestamps for item metadata.
//!
//! Item create, modify and pin times are server-assigned seconds since the
//! Unix epoch. Ordering between items never relies on these values; the
//! per-item `revision` is the only concurrency token.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Current wall-clock time. A clock set before the epoch reads as zero.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self(secs)
    }

    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// Returns whichever of the two timestamps is later, so a modification
    /// time never moves backwards when the local clock lags the server.
    #[must_use]
    pub fn max_with_now(self) -> Self {
        self.max(Self::now())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
