//! Error types for the encryption layer.

use lockbox_types::ShareId;
use thiserror::Error;

/// Result type for cipher operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the raw AEAD primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key, wrong context or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Result type for [`crate::EncryptionProvider`] calls.
pub type EncryptorResult<T> = Result<T, EncryptorError>;

/// Errors surfaced by an encryption provider.
#[derive(Debug, Error)]
pub enum EncryptorError {
    /// The provider is locked or holds no keys at all.
    #[error("encryptor unavailable (vault locked)")]
    Unavailable,

    /// No key is loaded for the share.
    #[error("no key for share {0}")]
    MissingShareKey(ShareId),

    /// Underlying crypto failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Decrypted bytes were not valid UTF-8 text.
    #[error("invalid UTF-8 in decrypted field")]
    InvalidUtf8,
}
