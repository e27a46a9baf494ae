//! Encryption provider interface used by the item engine.
//!
//! The engine depends on `Arc<dyn EncryptionProvider>` and never sees raw
//! keys. `ShareKeyring` is the in-process implementation holding one key per
//! share; tests use `PassthroughEncryptor`.

use crate::cipher::{self, EncryptionTag};
use crate::error::{EncryptorError, EncryptorResult};
use crate::key::ShareKey;
use lockbox_types::{EncryptedBlob, ShareId};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Encrypts and decrypts item fields in the context of a share.
pub trait EncryptionProvider: Send + Sync {
    /// Encrypts `plaintext` with the key of `share_id`.
    fn encrypt(
        &self,
        share_id: &ShareId,
        tag: EncryptionTag,
        plaintext: &[u8],
    ) -> EncryptorResult<EncryptedBlob>;

    /// Decrypts a blob produced by [`EncryptionProvider::encrypt`] for the same share.
    fn decrypt(
        &self,
        share_id: &ShareId,
        tag: EncryptionTag,
        blob: &EncryptedBlob,
    ) -> EncryptorResult<Vec<u8>>;

    /// Re-keys a blob from one share's key to another's.
    ///
    /// Empty blobs stay empty. The default decrypts and encrypts again;
    /// providers whose shares use a common key may return the input as is.
    fn reencrypt(
        &self,
        from: &ShareId,
        to: &ShareId,
        tag: EncryptionTag,
        blob: &EncryptedBlob,
    ) -> EncryptorResult<EncryptedBlob> {
        if blob.is_empty() || from == to {
            return Ok(blob.clone());
        }
        let clear = zeroize::Zeroizing::new(self.decrypt(from, tag, blob)?);
        self.encrypt(to, tag, &clear)
    }

    /// Whether the provider can currently encrypt (i.e. is unlocked).
    fn is_available(&self) -> bool;
}

/// No-op provider for tests and pre-unlock operation.
/// Data passes through unchanged.
pub struct PassthroughEncryptor;

impl EncryptionProvider for PassthroughEncryptor {
    fn encrypt(
        &self,
        _share_id: &ShareId,
        _tag: EncryptionTag,
        plaintext: &[u8],
    ) -> EncryptorResult<EncryptedBlob> {
        Ok(EncryptedBlob::new(plaintext.to_vec()))
    }

    fn decrypt(
        &self,
        _share_id: &ShareId,
        _tag: EncryptionTag,
        blob: &EncryptedBlob,
    ) -> EncryptorResult<Vec<u8>> {
        Ok(blob.as_bytes().to_vec())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Holds one ChaCha20-Poly1305 key per share.
#[derive(Default)]
pub struct ShareKeyring {
    keys: RwLock<HashMap<ShareId, ShareKey>>,
}

impl ShareKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads (or replaces) the key of a share.
    pub fn insert_key(&self, share_id: ShareId, key: ShareKey) -> EncryptorResult<()> {
        let mut keys = self.keys.write().map_err(|_| EncryptorError::Unavailable)?;
        keys.insert(share_id, key);
        debug!("Loaded key for share {}", share_id);
        Ok(())
    }

    /// Drops the key of a share; its blobs can no longer be opened.
    pub fn remove_key(&self, share_id: &ShareId) -> EncryptorResult<bool> {
        let mut keys = self.keys.write().map_err(|_| EncryptorError::Unavailable)?;
        Ok(keys.remove(share_id).is_some())
    }

    /// Drops every key, e.g. on logout.
    pub fn clear(&self) {
        if let Ok(mut keys) = self.keys.write() {
            keys.clear();
        }
    }

    pub fn contains(&self, share_id: &ShareId) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(share_id))
            .unwrap_or(false)
    }

    fn with_key<T>(
        &self,
        share_id: &ShareId,
        f: impl FnOnce(&ShareKey) -> EncryptorResult<T>,
    ) -> EncryptorResult<T> {
        let keys = self.keys.read().map_err(|_| EncryptorError::Unavailable)?;
        let key = keys
            .get(share_id)
            .ok_or(EncryptorError::MissingShareKey(*share_id))?;
        f(key)
    }
}

impl EncryptionProvider for ShareKeyring {
    fn encrypt(
        &self,
        share_id: &ShareId,
        tag: EncryptionTag,
        plaintext: &[u8],
    ) -> EncryptorResult<EncryptedBlob> {
        self.with_key(share_id, |key| {
            Ok(EncryptedBlob::new(cipher::seal(key, tag, plaintext)?))
        })
    }

    fn decrypt(
        &self,
        share_id: &ShareId,
        tag: EncryptionTag,
        blob: &EncryptedBlob,
    ) -> EncryptorResult<Vec<u8>> {
        self.with_key(share_id, |key| Ok(cipher::open(key, tag, blob.as_bytes())?))
    }

    fn is_available(&self) -> bool {
        self.keys.read().map(|keys| !keys.is_empty()).unwrap_or(false)
    }
}
