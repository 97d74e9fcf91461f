//! In-memory login sessions keyed by an opaque cookie token.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct SessionInner {
    map: HashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionInner {
    fn resolve(&self, token: &str) -> Option<String> {
        self.map.get(token).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.username.clone())
            } else {
                None
            }
        })
    }

    fn purge_expired(&mut self) -> usize {
        let before = self.map.len();
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
        before - self.map.len()
    }
}

/// Thread-safe token -> username map with a fixed TTL.
///
/// Sessions do not survive a restart; users sign in again.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<tokio::sync::RwLock<SessionInner>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(SessionInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }

    pub async fn ttl(&self) -> Duration {
        self.inner.read().await.ttl
    }

    /// Start a session and return its token (UUID v4, simple form).
    /// Expired sessions are dropped on the way.
    pub async fn create(&self, username: impl Into<String>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut store = self.inner.write().await;
        let purged = store.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "expired sessions dropped");
        }
        let expires_at = Instant::now() + store.ttl;
        store.map.insert(
            token.clone(),
            SessionEntry {
                username: username.into(),
                expires_at,
            },
        );
        token
    }

    /// Username for a live session; `None` when unknown or expired.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.inner.read().await.resolve(token)
    }

    /// `true` if a session was removed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.map.remove(token).is_some()
    }

    /// Drop expired sessions, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.inner.write().await.purge_expired()
    }

    /// Number of sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_resolve_revoke() {
        let sessions = SessionStore::with_default_ttl();

        let token = sessions.create("alice").await;
        assert_eq!(token.len(), 32);
        assert_eq!(sessions.resolve(&token).await.as_deref(), Some("alice"));

        assert!(sessions.revoke(&token).await);
        assert!(!sessions.revoke(&token).await);
        assert!(sessions.resolve(&token).await.is_none());
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() {
        let sessions = SessionStore::default();
        assert!(sessions.resolve("not-a-token").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_expire_after_ttl() {
        let sessions = SessionStore::new(Duration::from_millis(100));
        let token = sessions.create("bob").await;
        assert!(sessions.resolve(&token).await.is_some());

        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(sessions.resolve(&token).await.is_none());
        assert_eq!(sessions.len().await, 1);
        assert_eq!(sessions.purge_expired().await, 1);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn new_logins_drop_expired_sessions() {
        let sessions = SessionStore::new(Duration::from_millis(10));
        for index in 0..1000 {
            sessions.create(format!("user{index}")).await;
        }
        assert_eq!(sessions.len().await, 1000);

        tokio::time::advance(Duration::from_millis(30)).await;
        let token = sessions.create("latest").await;

        assert_eq!(sessions.len().await, 1);
        assert_eq!(sessions.resolve(&token).await.as_deref(), Some("latest"));
    }

    #[tokio::test]
    async fn each_login_gets_a_distinct_token() {
        let sessions = SessionStore::default();
        let first = sessions.create("carol").await;
        let second = sessions.create("carol").await;
        assert_ne!(first, second);
        assert_eq!(sessions.len().await, 2);
    }
}
