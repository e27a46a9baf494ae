//! Role and plan resolution.
//!
//! The item engine asks an [`AccessProvider`] for the current user's access
//! to a share and for the account's plan limits. Nothing is cached: every
//! capability query resolves both again.

use crate::{ItemError, ItemResult};
use async_trait::async_trait;
use lockbox_storage::ItemStore;
use lockbox_types::{ShareId, ShareRecord, ShareRole, ShareType};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A count limit from the account's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limit {
    Unlimited,
    Limited(u32),
}

impl Limit {
    /// Slots left after `used`, `None` when unlimited. Never negative.
    #[must_use]
    pub fn remaining(self, used: u32) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(max) => Some(max.saturating_sub(used)),
        }
    }

    #[must_use]
    pub fn allows(self, used: u32) -> bool {
        self.remaining(used).is_none_or(|left| left > 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    #[default]
    Free,
    Plus,
    Business,
}

/// Limits of the account's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub plan: PlanType,
    pub vault_limit: Limit,
    pub alias_limit: Limit,
    pub totp_limit: Limit,
    /// Members (including pending invites) per vault.
    pub member_limit: Limit,
}

impl PlanLimits {
    /// The preset limits of `plan`.
    #[must_use]
    pub fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => Self {
                plan,
                vault_limit: Limit::Limited(2),
                alias_limit: Limit::Limited(10),
                totp_limit: Limit::Limited(0),
                member_limit: Limit::Limited(3),
            },
            PlanType::Plus => Self {
                plan,
                vault_limit: Limit::Limited(50),
                alias_limit: Limit::Unlimited,
                totp_limit: Limit::Unlimited,
                member_limit: Limit::Limited(10),
            },
            PlanType::Business => Self {
                plan,
                vault_limit: Limit::Unlimited,
                alias_limit: Limit::Unlimited,
                totp_limit: Limit::Unlimited,
                member_limit: Limit::Unlimited,
            },
        }
    }
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self::for_plan(PlanType::Free)
    }
}

/// The current user's access to one share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAccess {
    pub share_id: ShareId,
    pub share_type: ShareType,
    /// Effective role; owners are always `Admin`.
    pub role: ShareRole,
    pub is_owner: bool,
    pub member_count: u32,
    pub pending_invites: u32,
    pub max_members: u32,
}

impl ShareAccess {
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.role.can_write()
    }

    #[must_use]
    pub fn can_manage_members(&self) -> bool {
        self.role.can_manage_members()
    }

    #[must_use]
    pub fn is_item_share(&self) -> bool {
        self.share_type == ShareType::Item
    }

    /// Invite slots left on this share under both the share's own member
    /// cap and the plan's member limit.
    #[must_use]
    pub fn invites_remaining(&self, plan: &PlanLimits) -> u32 {
        let used = self.member_count.saturating_add(self.pending_invites);
        let share_left = self.max_members.saturating_sub(used);
        match plan.member_limit.remaining(used) {
            Some(plan_left) => share_left.min(plan_left),
            None => share_left,
        }
    }
}

impl From<&ShareRecord> for ShareAccess {
    fn from(share: &ShareRecord) -> Self {
        Self {
            share_id: share.share_id,
            share_type: share.share_type,
            role: share.effective_role(),
            is_owner: share.is_owner,
            member_count: share.member_count,
            pending_invites: share.pending_invites,
            max_members: share.max_members,
        }
    }
}

/// Resolves roles and plan limits for the current user.
#[async_trait]
pub trait AccessProvider: Send + Sync {
    /// Access to `share_id`. Fails with `ShareNotFound` if the share is
    /// unknown.
    async fn share_access(&self, share_id: &ShareId) -> ItemResult<ShareAccess>;

    async fn plan_limits(&self) -> ItemResult<PlanLimits>;

    /// Vaults the user may write to.
    async fn writable_vaults(&self) -> ItemResult<Vec<ShareId>>;
}

/// Access provider backed by the share records of an [`ItemStore`] and a
/// plan set by the account layer.
pub struct StoreAccessProvider {
    store: Arc<dyn ItemStore>,
    plan: RwLock<PlanLimits>,
}

impl StoreAccessProvider {
    pub fn new(store: Arc<dyn ItemStore>, plan: PlanLimits) -> Self {
        Self {
            store,
            plan: RwLock::new(plan),
        }
    }

    /// Replaces the plan, e.g. after an upgrade.
    pub fn set_plan(&self, plan: PlanLimits) {
        match self.plan.write() {
            Ok(mut current) => *current = plan,
            Err(poisoned) => *poisoned.into_inner() = plan,
        }
    }
}

#[async_trait]
impl AccessProvider for StoreAccessProvider {
    async fn share_access(&self, share_id: &ShareId) -> ItemResult<ShareAccess> {
        self.store
            .get_share(share_id)
            .await?
            .map(|share| ShareAccess::from(&share))
            .ok_or(ItemError::ShareNotFound(*share_id))
    }

    async fn plan_limits(&self) -> ItemResult<PlanLimits> {
        let plan = match self.plan.read() {
            Ok(plan) => plan.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Ok(plan)
    }

    async fn writable_vaults(&self) -> ItemResult<Vec<ShareId>> {
        Ok(self
            .store
            .shares()
            .await?
            .iter()
            .filter(|share| share.is_vault() && share.effective_role().can_write())
            .map(|share| share.share_id)
            .collect())
    }
}
