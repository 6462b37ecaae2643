//! Profile model -> entity mapper

use sims_core::entities::Profile;

use crate::models::ProfileModel;

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        Profile {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            banner_url: model.banner_url,
            bio: model.bio,
            website: model.website,
            is_admin: model.is_admin,
            invite_code_used: model.invite_code_used,
            tag_changed: model.tag_changed,
            zen_background: model.zen_background,
            created_at: model.created_at,
        }
    }
}
