//! Session store
//!
//! Holds the signed-in user and their profile for one client connection.
//! The auth flow is the only writer; readers hold a [`SessionView`] and can
//! await changes.

use std::sync::Arc;

use sims_core::entities::Profile;
use sims_core::AccessRoute;
use tokio::sync::watch;
use uuid::Uuid;

/// Authenticated user and profile pair
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub profile: Profile,
    pub route: AccessRoute,
}

impl Session {
    pub fn new(profile: Profile, route: AccessRoute) -> Self {
        Self {
            user_id: profile.id,
            profile,
            route,
        }
    }
}

/// Writer side
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Option<Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the whole session
    pub fn set(&self, session: Session) {
        self.tx.send_replace(Some(Arc::new(session)));
    }

    /// Sign out
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Swap in a new profile snapshot. No-op when signed out or when the
    /// profile belongs to someone else.
    pub fn replace_profile(&self, profile: Profile) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(session) if session.user_id == profile.id && session.profile != profile => {
                let route = session.route;
                *current = Some(Arc::new(Session {
                    user_id: profile.id,
                    profile,
                    route,
                }));
                true
            }
            _ => false,
        })
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.tx.borrow().clone()
    }

    /// Read-only handle that observes future changes
    pub fn view(&self) -> SessionView {
        SessionView {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader side
#[derive(Debug, Clone)]
pub struct SessionView {
    rx: watch::Receiver<Option<Arc<Session>>>,
}

impl SessionView {
    pub fn current(&self) -> Option<Arc<Session>> {
        self.rx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.rx.borrow().as_ref().map(|s| s.user_id)
    }

    /// Wait for the next change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile::new(Uuid::new_v4(), name.to_string(), name.to_string())
    }

    #[tokio::test]
    async fn test_view_observes_set_and_clear() {
        let store = SessionStore::new();
        let mut view = store.view();
        assert!(view.current().is_none());

        let p = profile("bella");
        store.set(Session::new(p.clone(), AccessRoute::Feed));
        assert!(view.changed().await);
        assert_eq!(view.user_id(), Some(p.id));

        store.clear();
        assert!(view.changed().await);
        assert!(view.current().is_none());
    }

    #[test]
    fn test_replace_profile_only_for_same_user() {
        let store = SessionStore::new();
        let mut p = profile("bella");
        store.set(Session::new(p.clone(), AccessRoute::Feed));

        assert!(!store.replace_profile(profile("mortimer")));
        assert!(!store.replace_profile(p.clone()));

        p.avatar_url = Some("https://cdn/avatars/bella.png".to_string());
        assert!(store.replace_profile(p.clone()));
        let current = store.current().unwrap();
        assert_eq!(current.profile.avatar_url, p.avatar_url);
        assert_eq!(current.route, AccessRoute::Feed);
    }

    #[tokio::test]
    async fn test_view_ends_when_store_dropped() {
        let store = SessionStore::new();
        let mut view = store.view();
        drop(store);
        assert!(!view.changed().await);
    }
}
