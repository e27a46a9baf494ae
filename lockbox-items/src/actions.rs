//! Per-item capabilities.
//!
//! [`derive_item_actions`] is a pure function of the item, the user's access
//! to its share and the plan limits. [`CapabilityEngine`] resolves those
//! inputs and applies it.

use crate::access::{AccessProvider, PlanLimits, ShareAccess};
use crate::{ItemError, ItemResult};
use lockbox_storage::ItemStore;
use lockbox_types::{ItemEncrypted, ItemKey};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Why an action is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
pub enum DisabledReason {
    #[error("insufficient role")]
    InsufficientRole,
    /// Items reached through an item share cannot change vaults.
    #[error("item is shared on its own")]
    ItemShare,
    #[error("item is in the trash")]
    ItemTrashed,
    #[error("item is not in the trash")]
    NotTrashed,
    #[error("no other writable vault")]
    NoDestinationVault,
}

/// Why the item cannot be shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
pub enum CannotShareReason {
    #[error("insufficient role")]
    InsufficientRole,
    /// Item shares cannot invite further members.
    #[error("item is shared on its own")]
    ItemShare,
    #[error("item is in the trash")]
    ItemTrashed,
    /// The share has no free member slot.
    #[error("member limit reached")]
    MemberLimitReached,
    /// The plan's member limit is used up.
    #[error("plan limit reached")]
    PlanLimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionStatus {
    Enabled,
    Disabled(DisabledReason),
}

impl ActionStatus {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    /// `Ok` when enabled, `PermissionDenied` otherwise.
    pub fn check(self) -> ItemResult<()> {
        match self {
            Self::Enabled => Ok(()),
            Self::Disabled(reason) => Err(ItemError::PermissionDenied(reason)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanShareStatus {
    /// Sharing is possible; `invites_remaining` is always at least one.
    CanShare { invites_remaining: u32 },
    Cannot(CannotShareReason),
}

impl CanShareStatus {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::CanShare { .. })
    }
}

/// What the user may currently do with an item. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemActions {
    pub can_share: CanShareStatus,
    pub can_edit: ActionStatus,
    pub can_move_to_other_vault: ActionStatus,
    pub can_move_to_trash: bool,
    pub can_restore_from_trash: bool,
    pub can_delete: bool,
    /// Whether the item's contextual menu is shown at all.
    pub can_use_options: bool,
}

impl ItemActions {
    /// Trash permission as a checked status.
    pub fn trash_status(&self, access: &ShareAccess) -> ActionStatus {
        match (self.can_move_to_trash, access.can_write()) {
            (true, _) => ActionStatus::Enabled,
            (false, false) => ActionStatus::Disabled(DisabledReason::InsufficientRole),
            (false, true) => ActionStatus::Disabled(DisabledReason::ItemTrashed),
        }
    }

    /// Restore permission as a checked status.
    pub fn restore_status(&self, access: &ShareAccess) -> ActionStatus {
        match (self.can_restore_from_trash, access.can_write()) {
            (true, _) => ActionStatus::Enabled,
            (false, false) => ActionStatus::Disabled(DisabledReason::InsufficientRole),
            (false, true) => ActionStatus::Disabled(DisabledReason::NotTrashed),
        }
    }

    /// Permanent delete permission as a checked status.
    pub fn delete_status(&self, access: &ShareAccess) -> ActionStatus {
        match (self.can_delete, access.can_write()) {
            (true, _) => ActionStatus::Enabled,
            (false, false) => ActionStatus::Disabled(DisabledReason::InsufficientRole),
            (false, true) => ActionStatus::Disabled(DisabledReason::NotTrashed),
        }
    }
}

/// Computes the actions available on `item`.
///
/// Role is checked before state and limits, so a read-only member always
/// sees `InsufficientRole`. `has_other_vault` tells whether the user can
/// write to at least one vault besides the item's own.
#[must_use]
pub fn derive_item_actions(
    item: &ItemEncrypted,
    access: &ShareAccess,
    plan: &PlanLimits,
    has_other_vault: bool,
) -> ItemActions {
    let writable = access.can_write();
    let trashed = item.is_trashed();

    let can_edit = if !writable {
        ActionStatus::Disabled(DisabledReason::InsufficientRole)
    } else if trashed {
        ActionStatus::Disabled(DisabledReason::ItemTrashed)
    } else {
        ActionStatus::Enabled
    };

    let can_move_to_other_vault = if !writable {
        ActionStatus::Disabled(DisabledReason::InsufficientRole)
    } else if access.is_item_share() {
        ActionStatus::Disabled(DisabledReason::ItemShare)
    } else if trashed {
        ActionStatus::Disabled(DisabledReason::ItemTrashed)
    } else if !has_other_vault {
        ActionStatus::Disabled(DisabledReason::NoDestinationVault)
    } else {
        ActionStatus::Enabled
    };

    let can_share = share_status(access, plan, trashed);

    let can_move_to_trash = writable && !trashed;
    let can_restore_from_trash = writable && trashed;
    let can_delete = writable && trashed;

    let everything_disabled = !can_share.is_allowed()
        && !can_edit.is_enabled()
        && !can_move_to_other_vault.is_enabled()
        && !can_move_to_trash
        && !can_restore_from_trash
        && !can_delete;
    let read_only_shared = !writable && !access.is_owner;

    ItemActions {
        can_share,
        can_edit,
        can_move_to_other_vault,
        can_move_to_trash,
        can_restore_from_trash,
        can_delete,
        can_use_options: !(everything_disabled && read_only_shared),
    }
}

fn share_status(access: &ShareAccess, plan: &PlanLimits, trashed: bool) -> CanShareStatus {
    if !access.can_manage_members() {
        return CanShareStatus::Cannot(CannotShareReason::InsufficientRole);
    }
    if access.is_item_share() {
        return CanShareStatus::Cannot(CannotShareReason::ItemShare);
    }
    if trashed {
        return CanShareStatus::Cannot(CannotShareReason::ItemTrashed);
    }

    let used = access.member_count.saturating_add(access.pending_invites);
    if !plan.member_limit.allows(used) {
        return CanShareStatus::Cannot(CannotShareReason::PlanLimitReached);
    }
    match access.invites_remaining(plan) {
        0 => CanShareStatus::Cannot(CannotShareReason::MemberLimitReached),
        invites_remaining => CanShareStatus::CanShare { invites_remaining },
    }
}

/// An item together with everything its capabilities were derived from.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub item: ItemEncrypted,
    pub access: ShareAccess,
    pub actions: ItemActions,
}

/// Resolves items, roles and plan limits, then derives [`ItemActions`].
pub struct CapabilityEngine {
    store: Arc<dyn ItemStore>,
    access: Arc<dyn AccessProvider>,
}

impl CapabilityEngine {
    pub fn new(store: Arc<dyn ItemStore>, access: Arc<dyn AccessProvider>) -> Self {
        Self { store, access }
    }

    /// Actions on the item at `key`. Fails with `ShareNotFound` or
    /// `NotFound` rather than assuming anything about missing data.
    pub async fn get_item_actions(&self, key: &ItemKey) -> ItemResult<ItemActions> {
        Ok(self.resolve(key).await?.actions)
    }

    pub async fn resolve(&self, key: &ItemKey) -> ItemResult<ResolvedItem> {
        let access = self.access.share_access(&key.share_id).await?;
        let item = self
            .store
            .get_item(key)
            .await?
            .ok_or(ItemError::NotFound(*key))?;
        let plan = self.access.plan_limits().await?;
        let has_other_vault = self
            .access
            .writable_vaults()
            .await?
            .iter()
            .any(|share_id| *share_id != key.share_id);

        let actions = derive_item_actions(&item, &access, &plan, has_other_vault);
        Ok(ResolvedItem {
            item,
            access,
            actions,
        })
    }
}
