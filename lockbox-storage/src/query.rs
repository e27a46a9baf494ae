//! Item queries: scope, state, type and flag predicates combined with AND.

use lockbox_types::{
    ItemEncrypted, ItemFlag, ItemState, ItemTypeFilter, ShareId, ShareSelection,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// A filter over cached items. Every declared predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub selection: ShareSelection,
    /// `None` matches both active and trashed items.
    pub state: Option<ItemState>,
    pub filter: ItemTypeFilter,
    /// Each entry requires the flag to be set (`true`) or clear (`false`).
    pub flags: BTreeMap<ItemFlag, bool>,
    /// Whether items of hidden shares are included.
    pub include_hidden: bool,
}

impl ItemQuery {
    /// Every item in every visible share.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_shares(mut self, selection: ShareSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn in_state(mut self, state: ItemState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn of_type(mut self, filter: ItemTypeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_flag(mut self, flag: ItemFlag, set: bool) -> Self {
        self.flags.insert(flag, set);
        self
    }

    pub fn including_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Evaluates the query against one item. `hidden_shares` lists the
    /// shares currently marked hidden.
    pub fn matches(&self, item: &ItemEncrypted, hidden_shares: &HashSet<ShareId>) -> bool {
        self.selection.contains(&item.share_id)
            && self.state.is_none_or(|state| item.state == state)
            && self.filter.matches(item.item_type)
            && self
                .flags
                .iter()
                .all(|(flag, set)| item.flags.contains(*flag) == *set)
            && (self.include_hidden || !hidden_shares.contains(&item.share_id))
    }
}

/// Listing order: pinned items first (most recently pinned on top), then by
/// modification time, newest first. Item id breaks ties so the order is total.
pub fn listing_order(a: &ItemEncrypted, b: &ItemEncrypted) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.pin_time.cmp(&a.pin_time))
        .then_with(|| b.modification_time.cmp(&a.modification_time))
        .then_with(|| a.id.cmp(&b.id))
}
