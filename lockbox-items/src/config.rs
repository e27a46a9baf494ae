//! Engine configuration.

use crate::access::PlanLimits;
use serde::Deserialize;

/// Configuration for the item engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse migrations and lifecycle writes while a sync runs over the
    /// affected shares.
    pub block_writes_while_syncing: bool,
    /// Plan assumed until the account layer reports the real one.
    pub default_plan: PlanLimits,
}

impl EngineConfig {
    /// Parses a JSON settings document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_writes_while_syncing: true,
            default_plan: PlanLimits::default(),
        }
    }
}
