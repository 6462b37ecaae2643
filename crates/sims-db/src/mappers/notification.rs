//! Notification model -> entity mapper

use sims_core::entities::{Notification, NotificationType};
use sims_core::error::DomainError;

use crate::models::NotificationModel;

impl TryFrom<NotificationModel> for Notification {
    type Error = DomainError;

    fn try_from(model: NotificationModel) -> Result<Self, Self::Error> {
        let notification_type: NotificationType = model
            .notification_type
            .parse()
            .map_err(|e: DomainError| DomainError::DatabaseError(e.to_string()))?;

        Ok(Notification {
            id: model.id,
            user_id: model.user_id,
            actor_id: model.actor_id,
            notification_type,
            content: model.content,
            reference_id: model.reference_id,
            read: model.read,
            created_at: model.created_at,
        })
    }
}
