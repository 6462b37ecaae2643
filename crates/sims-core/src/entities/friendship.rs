//! Friendship entity - directed request that becomes a symmetric relation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored status of a friendship row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipRecordStatus {
    Pending,
    Accepted,
}

impl FriendshipRecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

/// Relation as seen from one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    None,
    PendingSent,
    PendingReceived,
    Accepted,
}

/// Friendship entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: FriendshipRecordStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// New pending request from `requester_id` to `addressee_id`
    pub fn request(requester_id: Uuid, addressee_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id,
            addressee_id,
            status: FriendshipRecordStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Whether `user_id` is one of the two parties
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.addressee_id == user_id
    }

    /// The party that isn't `viewer`
    pub fn other_party(&self, viewer: Uuid) -> Uuid {
        if self.requester_id == viewer {
            self.addressee_id
        } else {
            self.requester_id
        }
    }

    /// Status from `viewer`'s side
    pub fn status_for(&self, viewer: Uuid) -> FriendshipStatus {
        match self.status {
            FriendshipRecordStatus::Accepted if self.involves(viewer) => FriendshipStatus::Accepted,
            FriendshipRecordStatus::Pending if self.requester_id == viewer => {
                FriendshipStatus::PendingSent
            }
            FriendshipRecordStatus::Pending if self.addressee_id == viewer => {
                FriendshipStatus::PendingReceived
            }
            _ => FriendshipStatus::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_both_sides() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut f = Friendship::request(alice, bob);

        assert_eq!(f.status_for(alice), FriendshipStatus::PendingSent);
        assert_eq!(f.status_for(bob), FriendshipStatus::PendingReceived);
        assert_eq!(f.status_for(Uuid::new_v4()), FriendshipStatus::None);

        f.status = FriendshipRecordStatus::Accepted;
        assert_eq!(f.status_for(alice), FriendshipStatus::Accepted);
        assert_eq!(f.status_for(bob), FriendshipStatus::Accepted);
        assert_eq!(f.other_party(bob), alice);
    }
}
