//! Push subscription model -> entity mapper

use sims_core::entities::PushSubscription;

use crate::models::PushSubscriptionModel;

impl From<PushSubscriptionModel> for PushSubscription {
    fn from(model: PushSubscriptionModel) -> Self {
        PushSubscription {
            id: model.id,
            user_id: model.user_id,
            endpoint: model.endpoint,
            p256dh: model.p256dh,
            auth: model.auth,
            created_at: model.created_at,
        }
    }
}
