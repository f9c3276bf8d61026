//! Server-side browser sessions.
//!
//! A session carries one-shot flash notices and the post-login return path.
//! Entries live in memory, keyed by the `motors_sid` cookie, and expire after
//! a period of inactivity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::debug;

/// Idle lifetime of a session (2 hours).
pub const SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

const SESSION_ID_LEN: usize = 48;

#[derive(Debug)]
struct SessionData {
    notices: Vec<String>,
    return_to: Option<String>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            notices: Vec::new(),
            return_to: None,
            last_seen: Instant::now(),
        }
    }
}

/// In-memory session store.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, SessionData>,
    ttl: Duration,
}

/// Random session identifier.
pub fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Whether `id` names a live session. Expired entries are dropped.
    pub fn contains(&self, id: &str) -> bool {
        let expired = match self.sessions.get(id) {
            None => return false,
            Some(data) => data.last_seen.elapsed() > self.ttl,
        };
        if expired {
            self.sessions.remove(id);
        }
        !expired
    }

    /// Refresh the idle timer.
    pub fn touch(&self, id: &str) {
        if let Some(mut data) = self.sessions.get_mut(id) {
            data.last_seen = Instant::now();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn with_entry<T>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> T) -> T {
        if !self.contains(id) {
            self.sessions.insert(id.to_string(), SessionData::new());
        }
        let mut entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(SessionData::new);
        entry.last_seen = Instant::now();
        f(&mut entry)
    }

    /// Queue a flash notice for the next rendered page.
    pub fn push_notice(&self, id: &str, message: impl Into<String>) {
        let message = message.into();
        self.with_entry(id, |data| data.notices.push(message));
    }

    /// Drain queued notices.
    pub fn take_notices(&self, id: &str) -> Vec<String> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.sessions
            .get_mut(id)
            .map(|mut data| std::mem::take(&mut data.notices))
            .unwrap_or_default()
    }

    /// Remember where to send the user after login.
    pub fn set_return_to(&self, id: &str, path: impl Into<String>) {
        let path = path.into();
        self.with_entry(id, |data| data.return_to = Some(path));
    }

    /// Consume the stored return path.
    pub fn take_return_to(&self, id: &str) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        self.sessions.get_mut(id)?.return_to.take()
    }

    /// Evict expired entries.
    pub fn cleanup(&self) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, data| data.last_seen.elapsed() <= self.ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, "expired sessions removed");
        }
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                store.cleanup();
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped handle to the caller's session.
///
/// The entry is only materialised on first write, so anonymous requests that
/// never touch the session do not receive a cookie.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    store: Arc<SessionStore>,
}

impl Session {
    pub fn new(id: String, store: Arc<SessionStore>) -> Self {
        Self { id, store }
    }

    pub fn push_notice(&self, message: impl Into<String>) {
        self.store.push_notice(&self.id, message);
    }

    pub fn take_notices(&self) -> Vec<String> {
        self.store.take_notices(&self.id)
    }

    pub fn set_return_to(&self, path: impl Into<String>) {
        self.store.set_return_to(&self.id, path);
    }

    pub fn take_return_to(&self) -> Option<String> {
        self.store.take_return_to(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_random_alphanumerics() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), SESSION_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn notices_are_drained_once() {
        let store = SessionStore::new();
        store.push_notice("s1", "one");
        store.push_notice("s1", "two");
        assert_eq!(store.take_notices("s1"), ["one", "two"]);
        assert!(store.take_notices("s1").is_empty());
    }

    #[test]
    fn return_to_is_consumed() {
        let store = SessionStore::new();
        store.set_return_to("s1", "/inv/");
        assert_eq!(store.take_return_to("s1").as_deref(), Some("/inv/"));
        assert!(store.take_return_to("s1").is_none());
    }

    #[test]
    fn reads_do_not_create_sessions() {
        let store = SessionStore::new();
        assert!(store.take_notices("ghost").is_empty());
        assert!(store.take_return_to("ghost").is_none());
        assert!(!store.contains("ghost"));
        assert!(store.is_empty());
    }

    #[test]
    fn expired_sessions_are_forgotten() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        store.set_return_to("s1", "/account/");
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.take_return_to("s1").is_none());
        store.push_notice("s2", "hi");
        std::thread::sleep(Duration::from_millis(5));
        store.cleanup();
        assert!(store.is_empty());
    }

    #[test]
    fn handle_delegates_to_store() {
        let store = Arc::new(SessionStore::new());
        let id = generate_session_id();
        let session = Session::new(id.clone(), Arc::clone(&store));
        assert!(!store.contains(&id));
        session.push_notice("saved");
        assert!(store.contains(&id));
        assert_eq!(session.take_notices(), ["saved"]);
        assert_eq!(store.len(), 1);
    }
}
