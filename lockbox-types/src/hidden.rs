//! Sensitive fields that may or may not hold decrypted plaintext.

use crate::EncryptedBlob;
use std::fmt;
use zeroize::Zeroizing;

/// A sensitive field in one of three states.
///
/// Only `Revealed` carries plaintext, held in a buffer that is wiped on drop.
/// The type deliberately has no `Serialize` impl: what gets persisted is the
/// encrypted blob returned by [`HiddenState::encrypted`].
#[derive(Clone, PartialEq, Eq)]
pub enum HiddenState {
    /// The field has no value.
    Empty(EncryptedBlob),
    /// The field has a value that has not been decrypted.
    Concealed(EncryptedBlob),
    /// The field has been decrypted on demand.
    Revealed {
        encrypted: EncryptedBlob,
        clear: Zeroizing<String>,
    },
}

impl HiddenState {
    /// `Empty` for an empty blob, `Concealed` otherwise.
    #[must_use]
    pub fn from_encrypted(blob: EncryptedBlob) -> Self {
        if blob.is_empty() {
            Self::Empty(blob)
        } else {
            Self::Concealed(blob)
        }
    }

    #[must_use]
    pub fn revealed(encrypted: EncryptedBlob, clear: String) -> Self {
        Self::Revealed {
            encrypted,
            clear: Zeroizing::new(clear),
        }
    }

    #[must_use]
    pub fn encrypted(&self) -> &EncryptedBlob {
        match self {
            Self::Empty(blob) | Self::Concealed(blob) => blob,
            Self::Revealed { encrypted, .. } => encrypted,
        }
    }

    /// Plaintext, if revealed.
    #[must_use]
    pub fn clear_text(&self) -> Option<&str> {
        match self {
            Self::Revealed { clear, .. } => Some(clear.as_str()),
            Self::Empty(_) | Self::Concealed(_) => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed { .. })
    }

    /// Drops any plaintext, going back to `Concealed` (or `Empty`).
    #[must_use]
    pub fn conceal(self) -> Self {
        match self {
            Self::Revealed { encrypted, .. } => Self::from_encrypted(encrypted),
            other => other,
        }
    }
}

impl fmt::Debug for HiddenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(_) => f.write_str("HiddenState::Empty"),
            Self::Concealed(blob) => write!(f, "HiddenState::Concealed({} bytes)", blob.len()),
            Self::Revealed { encrypted, .. } => f
                .debug_struct("HiddenState::Revealed")
                .field("encrypted", encrypted)
                .field("clear", &"[REDACTED]")
                .finish(),
        }
    }
}
