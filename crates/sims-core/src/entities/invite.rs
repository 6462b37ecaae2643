//! Invite entity - the approval checkpoint for new accounts
//!
//! Every onboarded user owns one invite row. It starts `pending` and an admin
//! moves it to `approved` or `rejected`. Both outcomes are terminal.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Profile;
use crate::error::DomainError;

/// Code alphabet: uppercase letters and digits without I, O, 1 and 0
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const INVITE_PREFIX: &str = "SIMS";
const GROUP_LEN: usize = 4;

static INVITE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SIMS-[A-HJ-NP-Z2-9]{4}-[A-HJ-NP-Z2-9]{4}$").expect("valid regex")
});

/// Persisted invite status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Approved,
    Rejected,
}

impl InviteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::ValidationError(format!(
                "unknown invite status: {other}"
            ))),
        }
    }
}

/// Coarse status derived from a user's latest invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteState {
    None,
    Pending,
    Approved,
    Rejected,
}

impl InviteState {
    /// Derive the state from the latest invite, if any
    pub fn from_latest(latest: Option<&InviteCode>) -> Self {
        match latest.map(|invite| invite.status) {
            None => Self::None,
            Some(InviteStatus::Pending) => Self::Pending,
            Some(InviteStatus::Approved) => Self::Approved,
            Some(InviteStatus::Rejected) => Self::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Where a signed-in user should be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRoute {
    Admin,
    PendingApproval,
    Feed,
}

impl AccessRoute {
    /// Route for a profile given its latest invite
    pub fn decide(profile: &Profile, latest: Option<&InviteCode>) -> Self {
        if profile.is_admin {
            Self::Admin
        } else if can_access_feed(profile, latest) {
            Self::Feed
        } else {
            Self::PendingApproval
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::PendingApproval => "/pending",
            Self::Feed => "/feed",
        }
    }
}

/// The feed gate: admins always pass, everyone else needs an approved latest invite
pub fn can_access_feed(profile: &Profile, latest: Option<&InviteCode>) -> bool {
    profile.is_admin || InviteState::from_latest(latest) == InviteState::Approved
}

/// Invite entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub used_by: Uuid,
    pub status: InviteStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    /// Create a new pending invite owned by `used_by`
    pub fn new(code: String, used_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            used_by,
            status: InviteStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        }
    }

    /// Approve a pending invite
    pub fn approve(&mut self, admin_id: Uuid) -> Result<(), DomainError> {
        self.ensure_pending(InviteStatus::Approved)?;
        self.status = InviteStatus::Approved;
        self.approved_by = Some(admin_id);
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// Reject a pending invite
    pub fn reject(&mut self) -> Result<(), DomainError> {
        self.ensure_pending(InviteStatus::Rejected)?;
        self.status = InviteStatus::Rejected;
        Ok(())
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    fn ensure_pending(&self, to: InviteStatus) -> Result<(), DomainError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DomainError::InvalidInviteTransition {
                from: self.status,
                to,
            })
        }
    }
}

/// Invite joined with the requester's public profile fields, for admin listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteWithProfile {
    pub invite: InviteCode,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Generate a shareable invite code of the form `SIMS-XXXX-XXXX`.
///
/// Uniqueness is not guaranteed here; callers regenerate on a reported collision.
pub fn generate_invite_code() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let mut group = || -> String {
        (0..GROUP_LEN)
            .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
            .collect()
    };
    let first = group();
    let second = group();
    format!("{INVITE_PREFIX}-{first}-{second}")
}

/// Check the exact `SIMS-XXXX-XXXX` shape
pub fn is_valid_invite_format(code: &str) -> bool {
    INVITE_FORMAT.is_match(code)
}
