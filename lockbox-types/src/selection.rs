//! Query scopes: which shares and which item types an operation covers.

use crate::{ItemType, ShareId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of shares an item query or migration operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareSelection {
    #[default]
    AllShares,
    Share(ShareId),
    Shares(BTreeSet<ShareId>),
}

impl ShareSelection {
    #[must_use]
    pub fn contains(&self, share_id: &ShareId) -> bool {
        match self {
            Self::AllShares => true,
            Self::Share(id) => id == share_id,
            Self::Shares(ids) => ids.contains(share_id),
        }
    }

    /// Explicitly named shares, `None` for `AllShares`.
    #[must_use]
    pub fn share_ids(&self) -> Option<BTreeSet<ShareId>> {
        match self {
            Self::AllShares => None,
            Self::Share(id) => Some(BTreeSet::from([*id])),
            Self::Shares(ids) => Some(ids.clone()),
        }
    }
}

impl FromIterator<ShareId> for ShareSelection {
    fn from_iter<I: IntoIterator<Item = ShareId>>(iter: I) -> Self {
        Self::Shares(iter.into_iter().collect())
    }
}

/// Narrows a query to one kind of item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemTypeFilter {
    #[default]
    All,
    Logins,
    Aliases,
    Notes,
    CreditCards,
    Identities,
    Custom,
}

impl ItemTypeFilter {
    #[must_use]
    pub fn matches(self, item_type: ItemType) -> bool {
        match self {
            Self::All => true,
            Self::Logins => item_type == ItemType::Login,
            Self::Aliases => item_type == ItemType::Alias,
            Self::Notes => item_type == ItemType::Note,
            Self::CreditCards => item_type == ItemType::CreditCard,
            Self::Identities => item_type == ItemType::Identity,
            Self::Custom => item_type == ItemType::Custom,
        }
    }
}
