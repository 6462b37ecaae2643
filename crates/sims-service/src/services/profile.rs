//! Profile service

use sims_core::entities::Profile;
use sims_core::{ChangeKind, DomainError, Table};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ChangeTagRequest, ProfileResponse, PublicProfileResponse, UpdateProfileRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::friendship::FriendshipService;

/// Image types accepted for avatars, with the extension they are stored under
const AVATAR_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn get_me(&self, user_id: Uuid) -> ServiceResult<ProfileResponse> {
        let profile = self.load(user_id).await?;
        Ok(ProfileResponse::from(profile))
    }

    /// Look up by full username, with the viewer's friendship status
    #[instrument(skip(self))]
    pub async fn get_public(
        &self,
        viewer_id: Uuid,
        username: &str,
    ) -> ServiceResult<PublicProfileResponse> {
        let profile = self
            .ctx
            .profile_repo()
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", username))?;

        let status = FriendshipService::new(self.ctx)
            .status_with(viewer_id, profile.id)
            .await?;
        Ok(PublicProfileResponse::from_profile(&profile, status))
    }

    /// Partial update. Absent fields are left alone; an empty string clears
    /// an optional field. Concurrent edits are last-write-wins.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> ServiceResult<ProfileResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let mut profile = self.load(user_id).await?;

        if let Some(display_name) = request.display_name {
            profile.display_name = display_name.trim().to_string();
        }
        if let Some(bio) = request.bio {
            profile.bio = non_empty(bio);
        }
        if let Some(website) = request.website {
            profile.website = non_empty(website);
        }
        if let Some(banner_url) = request.banner_url {
            profile.banner_url = non_empty(banner_url);
        }
        if let Some(zen_background) = request.zen_background {
            profile.zen_background = (!zen_background.is_null()).then_some(zen_background);
        }

        profile.validate()?;
        self.save(&profile).await?;
        info!(user_id = %user_id, "Profile updated");

        Ok(ProfileResponse::from(profile))
    }

    /// Replace the `#NNNN` tag. Allowed once.
    #[instrument(skip(self, request))]
    pub async fn change_tag(
        &self,
        user_id: Uuid,
        request: ChangeTagRequest,
    ) -> ServiceResult<ProfileResponse> {
        let mut profile = self.load(user_id).await?;
        profile.change_tag(&request.tag)?;

        if let Some(existing) = self
            .ctx
            .profile_repo()
            .find_by_username(&profile.username)
            .await?
        {
            if existing.id != user_id {
                return Err(DomainError::UsernameTaken(profile.username).into());
            }
        }

        self.save(&profile).await?;
        info!(user_id = %user_id, username = %profile.username, "Tag changed");

        Ok(ProfileResponse::from(profile))
    }

    /// Store an avatar at `avatars/{user_id}.{ext}` and point the profile at it
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ServiceResult<ProfileResponse> {
        let ext = AVATAR_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                ServiceError::validation(format!("Unsupported image type: {content_type}"))
            })?;

        if bytes.is_empty() {
            return Err(ServiceError::validation("Image is empty"));
        }
        let max = self.ctx.settings().max_upload_bytes;
        if bytes.len() > max {
            return Err(ServiceError::validation(format!(
                "Image exceeds {max} bytes"
            )));
        }

        let mut profile = self.load(user_id).await?;
        let path = format!("avatars/{user_id}.{ext}");
        self.ctx
            .storage()
            .upload(&path, bytes, content_type, true)
            .await?;

        profile.avatar_url = Some(self.ctx.storage().public_url(&path));
        self.save(&profile).await?;
        info!(user_id = %user_id, path = %path, "Avatar uploaded");

        Ok(ProfileResponse::from(profile))
    }

    /// Grant or revoke admin. Admins may not demote themselves.
    #[instrument(skip(self))]
    pub async fn set_admin(
        &self,
        admin_id: Uuid,
        target_id: Uuid,
        is_admin: bool,
    ) -> ServiceResult<ProfileResponse> {
        let admin = self.load(admin_id).await?;
        if !admin.is_admin {
            return Err(DomainError::NotAdmin.into());
        }
        if admin_id == target_id && !is_admin {
            return Err(ServiceError::permission_denied("admins cannot demote themselves"));
        }

        let mut target = self.load(target_id).await?;
        if target.is_admin != is_admin {
            target.is_admin = is_admin;
            self.save(&target).await?;
            info!(admin_id = %admin_id, target_id = %target_id, is_admin, "Admin flag changed");
        }

        Ok(ProfileResponse::from(target))
    }

    async fn load(&self, user_id: Uuid) -> ServiceResult<Profile> {
        self.ctx
            .profile_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::ProfileNotFound(user_id).into())
    }

    async fn save(&self, profile: &Profile) -> ServiceResult<()> {
        self.ctx.profile_repo().update(profile).await?;
        self.ctx
            .publish_change(Table::Profiles, ChangeKind::Update, profile)
            .await;
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use sims_core::FriendshipStatus;

    #[tokio::test]
    async fn test_update_sets_and_clears() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let service = ProfileService::new(&h.ctx);

        let updated = service
            .update_profile(
                bella.id,
                UpdateProfileRequest {
                    bio: Some("Collector of gnomes".to_string()),
                    website: Some("https://goth.sim".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Collector of gnomes"));

        let cleared = service
            .update_profile(
                bella.id,
                UpdateProfileRequest {
                    bio: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
        assert_eq!(cleared.website.as_deref(), Some("https://goth.sim"));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_website() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;

        let err = ProfileService::new(&h.ctx)
            .update_profile(
                bella.id,
                UpdateProfileRequest {
                    website: Some("goth.sim".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_change_tag_once() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let service = ProfileService::new(&h.ctx);

        let changed = service
            .change_tag(bella.id, ChangeTagRequest { tag: "1234".to_string() })
            .await
            .unwrap();
        assert_eq!(changed.username, "bella#1234");

        let err = service
            .change_tag(bella.id, ChangeTagRequest { tag: "4321".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TAG_ALREADY_CHANGED");
    }

    #[tokio::test]
    async fn test_upload_avatar_overwrites_same_path() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let service = ProfileService::new(&h.ctx);

        let first = service
            .upload_avatar(bella.id, vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        let second = service
            .upload_avatar(bella.id, vec![4, 5], "image/png")
            .await
            .unwrap();

        let expected = format!("avatars/{}.png", bella.id);
        assert_eq!(first.avatar_url, second.avatar_url);
        assert!(second.avatar_url.unwrap().ends_with(&expected));
        assert_eq!(h.storage.get(&expected), Some(vec![4, 5]));
    }

    #[tokio::test]
    async fn test_upload_avatar_rejects_type_and_size() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let service = ProfileService::new(&h.ctx);

        let err = service
            .upload_avatar(bella.id, vec![1], "application/pdf")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let too_big = vec![0u8; h.ctx.settings().max_upload_bytes + 1];
        let err = service
            .upload_avatar(bella.id, too_big, "image/jpeg")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_get_public_includes_friendship() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        FriendshipService::new(&h.ctx)
            .send_request(bella.id, mortimer.id)
            .await
            .unwrap();

        let view = ProfileService::new(&h.ctx)
            .get_public(mortimer.id, "bella")
            .await
            .unwrap();
        assert_eq!(view.id, bella.id);
        assert_eq!(view.friendship, FriendshipStatus::PendingReceived);
    }

    #[tokio::test]
    async fn test_set_admin_requires_admin() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let bella = h.profile("bella").await;
        let service = ProfileService::new(&h.ctx);

        let err = service.set_admin(bella.id, admin.id, false).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let promoted = service.set_admin(admin.id, bella.id, true).await.unwrap();
        assert!(promoted.is_admin);

        let err = service.set_admin(admin.id, admin.id, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }
}
