//! Browser push subscription registered by a device

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    pub fn new(user_id: Uuid, endpoint: String, p256dh: String, auth: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            endpoint,
            p256dh,
            auth,
            created_at: Utc::now(),
        }
    }
}
