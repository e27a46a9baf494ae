//! Encryption layer for lockbox.
//!
//! Items are encrypted per share: each vault (or item share) has its own
//! symmetric key, and every field ciphertext is bound to the field it was
//! produced for. The item engine only talks to [`EncryptionProvider`]; the
//! key material stays behind it.

pub mod cipher;
mod encryptor;
mod error;
mod key;

pub use cipher::{EncryptionTag, NONCE_SIZE, TAG_SIZE};
pub use encryptor::{EncryptionProvider, PassthroughEncryptor, ShareKeyring};
pub use error::{CryptoError, CryptoResult, EncryptorError, EncryptorResult};
pub use key::{ShareKey, KEY_SIZE};
