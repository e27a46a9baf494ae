//! Items as handed to observers.

use crate::{ItemError, ItemResult};
use lockbox_crypto::{EncryptionProvider, EncryptionTag};
use lockbox_types::{
    EncryptedBlob, HiddenState, ItemEncrypted, ItemFlags, ItemId, ItemKey, ItemState, ItemType,
    ShareId, ShareType, Timestamp,
};
use zeroize::Zeroizing;

/// A sensitive field of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Title,
    Note,
    Content,
}

impl ItemField {
    fn tag(self) -> EncryptionTag {
        match self {
            Self::Title => EncryptionTag::ItemTitle,
            Self::Note => EncryptionTag::ItemNote,
            Self::Content => EncryptionTag::ItemContent,
        }
    }
}

/// An item with its sensitive fields wrapped in [`HiddenState`].
///
/// Fields start concealed; [`Item::reveal`] decrypts one on demand and
/// [`Item::conceal`] wipes every decrypted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub share_id: ShareId,
    pub revision: u64,
    pub item_type: ItemType,
    pub title: HiddenState,
    pub note: HiddenState,
    pub content: HiddenState,
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

impl Item {
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.share_id, self.id)
    }

    #[must_use]
    pub fn field(&self, field: ItemField) -> &HiddenState {
        match field {
            ItemField::Title => &self.title,
            ItemField::Note => &self.note,
            ItemField::Content => &self.content,
        }
    }

    fn field_mut(&mut self, field: ItemField) -> &mut HiddenState {
        match field {
            ItemField::Title => &mut self.title,
            ItemField::Note => &mut self.note,
            ItemField::Content => &mut self.content,
        }
    }

    /// Decrypts `field` with the key of the item's share.
    ///
    /// Empty and already revealed fields are left as they are.
    pub fn reveal(
        &mut self,
        field: ItemField,
        encryption: &dyn EncryptionProvider,
    ) -> ItemResult<()> {
        let share_id = self.share_id;
        let slot = self.field_mut(field);
        let HiddenState::Concealed(blob) = &*slot else {
            return Ok(());
        };

        let blob = blob.clone();
        let bytes = Zeroizing::new(
            encryption
                .decrypt(&share_id, field.tag(), &blob)
                .map_err(|e| ItemError::upstream("decrypt", e))?,
        );
        let clear = std::str::from_utf8(&bytes)
            .map_err(|_| ItemError::upstream("decrypt", "field is not valid UTF-8"))?;
        *slot = HiddenState::revealed(blob, clear.to_owned());
        Ok(())
    }

    /// Drops every decrypted value.
    pub fn conceal(&mut self) {
        for field in [ItemField::Title, ItemField::Note, ItemField::Content] {
            let slot = self.field_mut(field);
            let current = std::mem::replace(slot, HiddenState::Empty(EncryptedBlob::empty()));
            *slot = current.conceal();
        }
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.title.is_revealed() || self.note.is_revealed() || self.content.is_revealed()
    }
}

impl From<ItemEncrypted> for Item {
    fn from(item: ItemEncrypted) -> Self {
        Self {
            id: item.id,
            share_id: item.share_id,
            revision: item.revision,
            item_type: item.item_type,
            title: HiddenState::from_encrypted(item.title),
            note: HiddenState::from_encrypted(item.note),
            content: HiddenState::from_encrypted(item.content),
            alias_email: item.alias_email,
            state: item.state,
            flags: item.flags,
            is_pinned: item.is_pinned,
            pin_time: item.pin_time,
            create_time: item.create_time,
            modification_time: item.modification_time,
            share_count: item.share_count,
            share_type: item.share_type,
        }
    }
}
