//! Invite model -> entity mapper

use sims_core::entities::{InviteCode, InviteStatus, InviteWithProfile};
use sims_core::error::DomainError;

use crate::models::{InviteCodeModel, InviteWithProfileModel};

impl TryFrom<InviteCodeModel> for InviteCode {
    type Error = DomainError;

    fn try_from(model: InviteCodeModel) -> Result<Self, Self::Error> {
        let status: InviteStatus = model
            .status
            .parse()
            .map_err(|e: DomainError| DomainError::DatabaseError(e.to_string()))?;

        Ok(InviteCode {
            id: model.id,
            code: model.code,
            used_by: model.used_by,
            status,
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<InviteWithProfileModel> for InviteWithProfile {
    type Error = DomainError;

    fn try_from(model: InviteWithProfileModel) -> Result<Self, Self::Error> {
        Ok(InviteWithProfile {
            invite: InviteCode::try_from(model.invite)?,
            username: model.username,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
        })
    }
}
