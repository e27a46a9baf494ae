//! Field encryption using ChaCha20-Poly1305.
//!
//! Every ciphertext is bound to an [`EncryptionTag`] through the AEAD
//! associated data, so a title blob cannot be opened as content.

use crate::error::{CryptoError, CryptoResult};
use crate::key::ShareKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Context a ciphertext was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionTag {
    ItemTitle,
    ItemNote,
    ItemContent,
}

impl EncryptionTag {
    /// Associated data fed to the AEAD.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::ItemTitle => b"lockbox.item.title",
            Self::ItemNote => b"lockbox.item.note",
            Self::ItemContent => b"lockbox.item.content",
        }
    }
}

/// Encrypts `plaintext` under `key`, returning `nonce || ciphertext`.
pub fn seal(key: &ShareKey, tag: EncryptionTag, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: tag.as_bytes(),
            },
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Opens a blob produced by [`seal`] with the same key and tag.
pub fn open(key: &ShareKey, tag: EncryptionTag, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption("data too short".to_string()));
    }

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: tag.as_bytes(),
            },
        )
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}
