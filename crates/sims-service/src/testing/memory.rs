//! In-memory implementations of the repository and storage ports

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sims_core::entities::{
    AuthorSummary, CommentView, Credential, FeedPost, FeedPostView, Friendship,
    FriendshipRecordStatus, InviteCode, InviteStatus, InviteWithProfile, Notification,
    PostComment, Profile, PushSubscription,
};
use sims_core::traits::{
    CredentialRepository, FriendshipRepository, InviteRepository, NotificationRepository,
    ObjectStorage, PostRepository, ProfileRepository, PushSubscriptionRepository,
    RefreshTokenRecord, RefreshTokenRepository, RepoResult,
};
use sims_core::DomainError;
use uuid::Uuid;

/// Take one unit from a failure budget
fn consume(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Default)]
pub struct InMemoryProfiles {
    rows: Mutex<Vec<Profile>>,
    failing_reads: AtomicUsize,
}

impl InMemoryProfiles {
    pub fn count(&self) -> usize {
        self.rows.lock().len()
    }

    /// Make the next `n` id lookups fail
    pub fn fail_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::Release);
    }

    pub fn set_invite_code_used(&self, id: Uuid, code: &str) {
        if let Some(p) = self.rows.lock().iter_mut().find(|p| p.id == id) {
            p.invite_code_used = Some(code.to_string());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Profile> {
        self.rows.lock().iter().find(|p| p.id == id).cloned()
    }

    fn summary(&self, id: Uuid) -> AuthorSummary {
        match self.get(id) {
            Some(p) => AuthorSummary {
                id: p.id,
                username: p.username,
                display_name: p.display_name,
                avatar_url: p.avatar_url,
            },
            None => AuthorSummary {
                id,
                username: "unknown".to_string(),
                display_name: "unknown".to_string(),
                avatar_url: None,
            },
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfiles {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Profile>> {
        if consume(&self.failing_reads) {
            return Err(DomainError::DatabaseError("injected read failure".to_string()));
        }
        Ok(self.get(id))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn resolve_usernames(&self, usernames: &[String]) -> RepoResult<HashMap<String, Uuid>> {
        let rows = self.rows.lock();
        Ok(rows
            .iter()
            .filter(|p| usernames.contains(&p.username))
            .map(|p| (p.username.clone(), p.id))
            .collect())
    }

    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        if rows.iter().any(|p| p.id == profile.id) {
            return Err(DomainError::ProfileAlreadyExists);
        }
        if rows.iter().any(|p| p.username == profile.username) {
            return Err(DomainError::UsernameTaken(profile.username.clone()));
        }
        rows.push(profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|p| p.id != profile.id && p.username == profile.username)
        {
            return Err(DomainError::UsernameTaken(profile.username.clone()));
        }
        let row = rows
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or(DomainError::ProfileNotFound(profile.id))?;
        *row = profile.clone();
        Ok(())
    }

    async fn set_invite_code_used_if_empty(&self, id: Uuid, code: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|p| p.id == id) {
            Some(p) if p.invite_code_used.is_none() => {
                p.invite_code_used = Some(code.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// Invites
// ============================================================================

pub struct InMemoryInvites {
    rows: Mutex<Vec<InviteCode>>,
    profiles: Arc<InMemoryProfiles>,
    collisions: AtomicUsize,
}

impl InMemoryInvites {
    pub fn new(profiles: Arc<InMemoryProfiles>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            profiles,
            collisions: AtomicUsize::new(0),
        }
    }

    /// Report a code collision on the next `n` inserts
    pub fn force_collisions(&self, n: usize) {
        self.collisions.store(n, Ordering::Release);
    }

    pub fn all(&self) -> Vec<InviteCode> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl InviteRepository for InMemoryInvites {
    async fn create(&self, invite: &InviteCode) -> RepoResult<()> {
        if consume(&self.collisions) {
            return Err(DomainError::InviteCodeExists);
        }
        let mut rows = self.rows.lock();
        if rows.iter().any(|i| i.code == invite.code) {
            return Err(DomainError::InviteCodeExists);
        }
        if rows.iter().any(|i| i.used_by == invite.used_by) {
            return Err(DomainError::InviteAlreadyExists);
        }
        rows.push(invite.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<InviteCode>> {
        Ok(self.rows.lock().iter().find(|i| i.id == id).cloned())
    }

    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<InviteCode>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .rev()
            .find(|i| i.used_by == user_id)
            .cloned())
    }

    async fn update_status(&self, invite: &InviteCode) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|i| i.id == invite.id)
            .ok_or(DomainError::InviteNotFound(invite.id))?;
        row.status = invite.status;
        row.approved_by = invite.approved_by;
        row.approved_at = invite.approved_at;
        Ok(())
    }

    async fn list(&self, status: Option<InviteStatus>) -> RepoResult<Vec<InviteWithProfile>> {
        let rows = self.rows.lock().clone();
        Ok(rows
            .into_iter()
            .rev()
            .filter(|i| status.is_none_or(|s| i.status == s))
            .map(|invite| {
                let profile = self.profiles.get(invite.used_by);
                InviteWithProfile {
                    username: profile.as_ref().map(|p| p.username.clone()),
                    display_name: profile.as_ref().map(|p| p.display_name.clone()),
                    avatar_url: profile.and_then(|p| p.avatar_url),
                    invite,
                }
            })
            .collect())
    }
}

// ============================================================================
// Posts
// ============================================================================

pub struct InMemoryPosts {
    posts: Mutex<Vec<FeedPost>>,
    comments: Mutex<Vec<PostComment>>,
    likes: Mutex<HashSet<(Uuid, Uuid)>>,
    profiles: Arc<InMemoryProfiles>,
    list_calls: AtomicUsize,
}

impl InMemoryPosts {
    pub fn new(profiles: Arc<InMemoryProfiles>) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            likes: Mutex::new(HashSet::new()),
            profiles,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `list_feed` was called
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Acquire)
    }

    fn view(&self, post: FeedPost, viewer_id: Uuid) -> FeedPostView {
        let likes = self.likes.lock();
        let like_count = likes.iter().filter(|(p, _)| *p == post.id).count();
        let liked_by_me = likes.contains(&(post.id, viewer_id));
        drop(likes);
        let comment_count = self
            .comments
            .lock()
            .iter()
            .filter(|c| c.post_id == post.id)
            .count();

        FeedPostView {
            author: self.profiles.summary(post.author_id),
            like_count: like_count as i64,
            comment_count: comment_count as i64,
            liked_by_me,
            post,
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn create(&self, post: &FeedPost) -> RepoResult<()> {
        self.posts.lock().push(post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<FeedPost>> {
        Ok(self.posts.lock().iter().find(|p| p.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.posts.lock().retain(|p| p.id != id);
        self.comments.lock().retain(|c| c.post_id != id);
        self.likes.lock().retain(|(p, _)| *p != id);
        Ok(())
    }

    async fn find_view(&self, id: Uuid, viewer_id: Uuid) -> RepoResult<Option<FeedPostView>> {
        let post = self.posts.lock().iter().find(|p| p.id == id).cloned();
        Ok(post.map(|p| self.view(p, viewer_id)))
    }

    async fn list_feed(
        &self,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<FeedPostView>> {
        self.list_calls.fetch_add(1, Ordering::AcqRel);
        let posts = self.posts.lock().clone();
        Ok(page(posts.into_iter().rev(), limit, offset)
            .into_iter()
            .map(|p| self.view(p, viewer_id))
            .collect())
    }

    async fn add_comment(&self, comment: &PostComment) -> RepoResult<()> {
        self.comments.lock().push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>> {
        let comments = self.comments.lock().clone();
        Ok(comments
            .into_iter()
            .filter(|c| c.post_id == post_id)
            .map(|comment| CommentView {
                author: self.profiles.summary(comment.author_id),
                comment,
            })
            .collect())
    }

    async fn like(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(self.likes.lock().insert((post_id, user_id)))
    }

    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(self.likes.lock().remove(&(post_id, user_id)))
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl InMemoryNotifications {
    pub fn fail_writes(&self, fail: bool) {
        self.failing.store(fail, Ordering::Release);
    }

    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().clone()
    }

    /// Oldest first
    pub fn for_user(&self, user_id: Uuid) -> Vec<Notification> {
        self.rows
            .lock()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn create(&self, notification: &Notification) -> RepoResult<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(DomainError::DatabaseError("injected write failure".to_string()));
        }
        self.rows.lock().push(notification.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>> {
        let rows = self.for_user(user_id);
        Ok(page(
            rows.into_iter().rev().filter(|n| !unread_only || !n.read),
            limit,
            offset,
        ))
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut rows = self.rows.lock();
        let mut flipped = 0;
        for n in rows.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            n.read = true;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        let rows = self.rows.lock();
        Ok(rows.iter().filter(|n| n.user_id == user_id && !n.read).count() as i64)
    }
}

// ============================================================================
// Friendships
// ============================================================================

#[derive(Default)]
pub struct InMemoryFriendships {
    rows: Mutex<Vec<Friendship>>,
}

#[async_trait]
impl FriendshipRepository for InMemoryFriendships {
    async fn find_between(&self, a: Uuid, b: Uuid) -> RepoResult<Option<Friendship>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|f| f.involves(a) && f.involves(b))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Friendship>> {
        Ok(self.rows.lock().iter().find(|f| f.id == id).cloned())
    }

    async fn create(&self, friendship: &Friendship) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|f| f.involves(friendship.requester_id) && f.involves(friendship.addressee_id))
        {
            return Err(DomainError::FriendshipExists);
        }
        rows.push(friendship.clone());
        Ok(())
    }

    async fn accept(&self, id: Uuid) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(DomainError::FriendshipNotFound)?;
        row.status = FriendshipRecordStatus::Accepted;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.rows.lock().retain(|f| f.id != id);
        Ok(())
    }

    async fn list_accepted(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|f| f.status == FriendshipRecordStatus::Accepted && f.involves(user_id))
            .cloned()
            .collect())
    }

    async fn list_incoming(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|f| f.status == FriendshipRecordStatus::Pending && f.addressee_id == user_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Push Subscriptions
// ============================================================================

#[derive(Default)]
pub struct InMemoryPushSubscriptions {
    rows: Mutex<Vec<PushSubscription>>,
}

#[async_trait]
impl PushSubscriptionRepository for InMemoryPushSubscriptions {
    async fn upsert(&self, subscription: &PushSubscription) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|s| s.endpoint == subscription.endpoint) {
            Some(existing) => {
                existing.user_id = subscription.user_id;
                existing.p256dh = subscription.p256dh.clone();
                existing.auth = subscription.auth.clone();
            }
            None => rows.push(subscription.clone()),
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<PushSubscription>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|s| s.endpoint != endpoint);
        Ok(rows.len() != before)
    }
}

// ============================================================================
// Credentials and refresh tokens
// ============================================================================

#[derive(Default)]
pub struct InMemoryCredentials {
    rows: Mutex<Vec<Credential>>,
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Credential>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Credential>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn create(&self, credential: &Credential) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|c| c.email.eq_ignore_ascii_case(&credential.email))
        {
            return Err(DomainError::EmailAlreadyExists);
        }
        rows.push(credential.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokens {
    tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokens {
    async fn store(
        &self,
        token: &str,
        record: &RefreshTokenRecord,
        _ttl_secs: u64,
    ) -> RepoResult<()> {
        self.tokens.lock().insert(token.to_string(), record.clone());
        Ok(())
    }

    async fn validate(&self, token: &str) -> RepoResult<Option<RefreshTokenRecord>> {
        Ok(self.tokens.lock().get(token).cloned())
    }

    async fn revoke(&self, token: &str) -> RepoResult<()> {
        self.tokens.lock().remove(token);
        Ok(())
    }
}

// ============================================================================
// Object storage
// ============================================================================

pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    public_base_url: String,
}

impl InMemoryStorage {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(path).map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> RepoResult<()> {
        let mut objects = self.objects.lock();
        if !upsert && objects.contains_key(path) {
            return Err(DomainError::StorageError(format!(
                "object already exists: {path}"
            )));
        }
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}
