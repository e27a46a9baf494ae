//! Encrypted item records as held in the local cache.

use crate::{Error, ItemId, ItemKey, ShareId, Timestamp, UserId};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque ciphertext. The engine moves these bytes around but never looks
/// inside; only an `EncryptionProvider` can open them.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes to base64 for storage.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| Error::InvalidBlob(e.to_string()))
    }
}

impl From<Vec<u8>> for EncryptedBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.0.len())
    }
}

impl Serialize for EncryptedBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of an item. Integer-coded on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ItemState {
    Active,
    Trashed,
}

impl ItemState {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Active => 1,
            Self::Trashed => 2,
        }
    }
}

impl TryFrom<i32> for ItemState {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Active),
            2 => Ok(Self::Trashed),
            other => Err(Error::InvalidItemState(other)),
        }
    }
}

impl From<ItemState> for i32 {
    fn from(state: ItemState) -> Self {
        state.code()
    }
}

/// A single bit in [`ItemFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemFlag {
    /// Excluded from password health reports.
    SkipHealthCheck,
    /// The item's email appeared in a breach report.
    EmailBreached,
    /// Alias forwarding is disabled (alias sync-disabled).
    AliasDisabled,
    HasAttachments,
    HasHadAttachments,
}

impl ItemFlag {
    pub const ALL: [ItemFlag; 5] = [
        ItemFlag::SkipHealthCheck,
        ItemFlag::EmailBreached,
        ItemFlag::AliasDisabled,
        ItemFlag::HasAttachments,
        ItemFlag::HasHadAttachments,
    ];

    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::SkipHealthCheck => 1 << 0,
            Self::EmailBreached => 1 << 1,
            Self::AliasDisabled => 1 << 2,
            Self::HasAttachments => 1 << 3,
            Self::HasHadAttachments => 1 << 4,
        }
    }
}

/// Bitset of [`ItemFlag`]s. Unknown bits from newer servers are preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemFlags(u32);

impl ItemFlags {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(&self, flag: ItemFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: ItemFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: ItemFlag) {
        self.0 &= !flag.bit();
    }

    #[must_use]
    pub fn with(mut self, flag: ItemFlag) -> Self {
        self.insert(flag);
        self
    }
}

impl FromIterator<ItemFlag> for ItemFlags {
    fn from_iter<I: IntoIterator<Item = ItemFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

/// Kind of credential an item holds. Stored in clear so queries can filter
/// without decrypting content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Login,
    Alias,
    Note,
    CreditCard,
    Identity,
    Custom,
}

/// Whether an item is reached through a full vault or through a share of
/// that single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareType {
    Vault,
    Item,
}

/// An item exactly as cached: identity and clear metadata plus encrypted
/// title, note and content.
///
/// `revision` is assigned by the server and only ever increases for a given
/// item. Every local mutation produces a copy with a higher revision through
/// [`ItemEncrypted::next_revision`]; the store rejects writes whose expected
/// revision is not the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEncrypted {
    pub id: ItemId,
    pub share_id: ShareId,
    pub user_id: UserId,
    pub revision: u64,
    pub item_type: ItemType,
    pub title: EncryptedBlob,
    pub note: EncryptedBlob,
    pub content: EncryptedBlob,
    pub alias_email: Option<String>,
    pub state: ItemState,
    pub flags: ItemFlags,
    pub is_pinned: bool,
    pub pin_time: Option<Timestamp>,
    pub create_time: Timestamp,
    pub modification_time: Timestamp,
    pub share_count: u32,
    pub share_type: ShareType,
}

impl ItemEncrypted {
    /// Creates a fresh active item at revision 1.
    #[must_use]
    pub fn new(
        share_id: ShareId,
        user_id: UserId,
        item_type: ItemType,
        title: EncryptedBlob,
        note: EncryptedBlob,
        content: EncryptedBlob,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: ItemId::new(),
            share_id,
            user_id,
            revision: 1,
            item_type,
            title,
            note,
            content,
            alias_email: None,
            state: ItemState::Active,
            flags: ItemFlags::default(),
            is_pinned: false,
            pin_time: None,
            create_time: now,
            modification_time: now,
            share_count: 0,
            share_type: ShareType::Vault,
        }
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.share_id, self.id)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ItemState::Active
    }

    #[must_use]
    pub fn is_trashed(&self) -> bool {
        self.state == ItemState::Trashed
    }

    /// Copy with the revision bumped and the modification time refreshed.
    /// Starting point for every local mutation.
    #[must_use]
    pub fn next_revision(&self) -> Self {
        Self {
            revision: self.revision + 1,
            modification_time: self.modification_time.max_with_now(),
            ..self.clone()
        }
    }

    /// Copy relocated to `destination`, with the share pointer and revision
    /// changed together.
    #[must_use]
    pub fn moved_to(&self, destination: ShareId) -> Self {
        Self {
            share_id: destination,
            ..self.next_revision()
        }
    }
}
