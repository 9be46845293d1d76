//! Signed-in session holder

use crate::models::User;
use std::sync::{Arc, RwLock};

/// Authenticated user and the token sent with each request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Shared, swappable session
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: Session) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(session);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn user(&self) -> Option<User> {
        self.current().map(|s| s.user)
    }

    /// Replace the stored user, keeping the token
    pub fn update_user(&self, user: User) {
        if let Ok(mut guard) = self.inner.write() {
            if let Some(session) = guard.as_mut() {
                session.user = user;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            object_id: "u1".to_string(),
            email: "jane@example.com".to_string(),
            name: None,
            phone_number: None,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new();
        assert!(store.token().is_none());

        store.set(Session {
            user: user(),
            token: "tok".to_string(),
        });
        let shared = store.clone();
        assert_eq!(shared.token().as_deref(), Some("tok"));

        let mut renamed = user();
        renamed.name = Some("Jane".to_string());
        store.update_user(renamed);
        assert_eq!(shared.user().unwrap().name.as_deref(), Some("Jane"));

        store.clear();
        assert!(shared.current().is_none());
    }
}
