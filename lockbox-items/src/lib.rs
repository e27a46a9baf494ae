//! Item and vault state engine for lockbox.
//!
//! Answers three questions for the client while items keep arriving from
//! the sync driver:
//!
//! - what is the sync state now (re-exported from `lockbox-sync`)
//! - what may the user do with this item ([`CapabilityEngine`])
//! - did this move between vaults succeed ([`MigrationCoordinator`])
//!
//! [`ItemEngine`] ties them together over one [`ItemStore`] and is the
//! interface the rest of the client uses.
//!
//! # Example
//!
//! ```no_run
//! use lockbox_crypto::PassthroughEncryptor;
//! use lockbox_items::{EngineConfig, ItemEngine};
//! use lockbox_storage::MemoryItemStore;
//! use std::sync::Arc;
//!
//! let engine = ItemEngine::with_store(
//!     Arc::new(MemoryItemStore::new()),
//!     Arc::new(PassthroughEncryptor),
//!     EngineConfig::default(),
//! );
//! assert!(!engine.tracker().is_syncing());
//! ```
//!
//! [`ItemStore`]: lockbox_storage::ItemStore

pub mod access;
pub mod actions;
mod cancel;
mod config;
mod engine;
mod error;
mod item;
mod lifecycle;
pub mod migration;

pub use access::{AccessProvider, Limit, PlanLimits, PlanType, ShareAccess, StoreAccessProvider};
pub use actions::{
    derive_item_actions, ActionStatus, CanShareStatus, CannotShareReason, CapabilityEngine,
    DisabledReason, ItemActions, ResolvedItem,
};
pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use engine::{ItemEngine, ItemListStream};
pub use error::{ItemError, ItemResult};
pub use item::{Item, ItemField};
pub use lifecycle::ItemLifecycle;
pub use migration::{
    FailedMigration, MigrateItemsResult, MigratedItem, MigrationCoordinator, MigrationFailure,
    MigrationOutcome,
};
