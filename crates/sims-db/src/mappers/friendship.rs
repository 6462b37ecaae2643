//! Friendship model -> entity mapper

use sims_core::entities::{Friendship, FriendshipRecordStatus};
use sims_core::error::DomainError;

use crate::models::FriendshipModel;

/// Parse the stored friendship status
pub fn friendship_status_from_str(s: &str) -> Result<FriendshipRecordStatus, DomainError> {
    match s {
        "pending" => Ok(FriendshipRecordStatus::Pending),
        "accepted" => Ok(FriendshipRecordStatus::Accepted),
        other => Err(DomainError::DatabaseError(format!(
            "unknown friendship status: {other}"
        ))),
    }
}

impl TryFrom<FriendshipModel> for Friendship {
    type Error = DomainError;

    fn try_from(model: FriendshipModel) -> Result<Self, Self::Error> {
        Ok(Friendship {
            id: model.id,
            requester_id: model.requester_id,
            addressee_id: model.addressee_id,
            status: friendship_status_from_str(&model.status)?,
            created_at: model.created_at,
        })
    }
}
