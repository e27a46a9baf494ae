//! Share metadata: membership role, visibility and member counts.

use crate::{ShareId, ShareType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The current user's role on a share, in ascending order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShareRole {
    /// Read-only access.
    Viewer,
    /// Can create, edit, trash and move items.
    Editor,
    /// Editor plus member management.
    Admin,
}

impl ShareRole {
    #[must_use]
    pub fn can_write(self) -> bool {
        self >= Self::Editor
    }

    #[must_use]
    pub fn can_manage_members(self) -> bool {
        self >= Self::Admin
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Admin",
        };
        f.write_str(name)
    }
}

impl FromStr for ShareRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Viewer" => Ok(Self::Viewer),
            "Editor" => Ok(Self::Editor),
            "Admin" => Ok(Self::Admin),
            other => Err(crate::Error::InvalidRole(other.to_string())),
        }
    }
}

/// A share as known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub share_id: ShareId,
    pub share_type: ShareType,
    pub role: ShareRole,
    pub is_owner: bool,
    /// Hidden shares are left out of item listings unless asked for.
    pub hidden: bool,
    pub member_count: u32,
    pub pending_invites: u32,
    /// Server-side cap on members for this share.
    pub max_members: u32,
}

impl ShareRecord {
    /// A vault owned by the current user.
    #[must_use]
    pub fn owned_vault(share_id: ShareId) -> Self {
        Self {
            share_id,
            share_type: ShareType::Vault,
            role: ShareRole::Admin,
            is_owner: true,
            hidden: false,
            member_count: 1,
            pending_invites: 0,
            max_members: 10,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: ShareRole) -> Self {
        self.role = role;
        self.is_owner = false;
        self
    }

    #[must_use]
    pub fn is_vault(&self) -> bool {
        self.share_type == ShareType::Vault
    }

    /// The owner always holds full rights regardless of the recorded role.
    #[must_use]
    pub fn effective_role(&self) -> ShareRole {
        if self.is_owner {
            ShareRole::Admin
        } else {
            self.role
        }
    }
}
