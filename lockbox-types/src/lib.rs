//! Core type definitions for lockbox.
//!
//! This crate defines the data model shared by every engine component:
//! - Share, item and user identifiers (UUID v7)
//! - Encrypted item records and their clear metadata
//! - Share records and member roles
//! - `HiddenState` for sensitive fields
//! - Query scopes (`ShareSelection`, `ItemTypeFilter`)
//!
//! Nothing in here performs I/O or cryptography.

mod hidden;
mod ids;
mod item;
mod selection;
mod share;
mod timestamp;

pub use hidden::HiddenState;
pub use ids::{ItemId, ItemKey, ShareId, UserId};
pub use item::{
    EncryptedBlob, ItemEncrypted, ItemFlag, ItemFlags, ItemState, ItemType, ShareType,
};
pub use selection::{ItemTypeFilter, ShareSelection};
pub use share::{ShareRecord, ShareRole};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid item state code: {0}")]
    InvalidItemState(i32),

    #[error("invalid encrypted blob: {0}")]
    InvalidBlob(String),

    #[error("unknown role: {0}")]
    InvalidRole(String),
}
