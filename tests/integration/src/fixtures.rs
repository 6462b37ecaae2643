//! Test fixtures and data generators

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Email that the test harness bootstraps as admin
pub const ADMIN_EMAIL: &str = "admin@sims.test";

/// Password that passes the strength check
pub const TEST_PASSWORD: &str = "Plumbob2024";

static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

impl SignUpBody {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            email: format!("sim{suffix}@sims.test"),
            password: TEST_PASSWORD.to_string(),
            username: Some(format!("sim{suffix}")),
        }
    }

    pub fn admin() -> Self {
        Self {
            email: ADMIN_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
            username: Some("landlord".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteBody {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileBody {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionBody {
    pub access_token: String,
    pub refresh_token: String,
    pub profile: ProfileBody,
    pub route: RouteBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminInviteBody {
    pub id: Uuid,
    pub code: String,
    pub status: String,
    pub used_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostBody {
    pub id: Uuid,
    pub content: Option<String>,
    pub segments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageBody<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationBody {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub actor_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub read: bool,
}
