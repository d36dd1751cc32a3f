use std::sync::Mutex;
use uuid::Uuid;

use crate::clock;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    created_at: Option<String>,
}

/// The single active check-in session for this process. Rotating mints a new
/// token and immediately invalidates the old one; nothing is persisted, so a
/// restart orphans any QR codes already handed out.
pub struct SessionManager {
    inner: Mutex<SessionState>,
}

impl SessionManager {
    /// Mints an initial token so the process always has an active session.
    pub fn new() -> Self {
        let mgr = SessionManager {
            inner: Mutex::new(SessionState::default()),
        };
        mgr.start_new_session();
        mgr
    }

    /// Replaces the current token with a fresh 128-bit random one and returns
    /// it. No history of prior tokens is kept.
    pub fn start_new_session(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.token = Some(token.clone());
        state.created_at = Some(clock::utc_now_iso());
        token
    }

    pub fn current_token(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .clone()
    }

    pub fn created_at(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .created_at
            .clone()
    }

    pub fn is_active(&self, candidate: &str) -> bool {
        let state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.token.as_deref() == Some(candidate)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        SessionManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_has_an_active_token() {
        let mgr = SessionManager::new();
        let token = mgr.current_token().expect("token at startup");
        assert!(mgr.is_active(&token));
        assert!(mgr.created_at().is_some());
    }

    #[test]
    fn rotation_invalidates_the_previous_token() {
        let mgr = SessionManager::new();
        let old = mgr.current_token().expect("initial token");
        let new = mgr.start_new_session();
        assert_ne!(old, new);
        assert!(!mgr.is_active(&old));
        assert!(mgr.is_active(&new));
        assert_eq!(mgr.current_token().as_deref(), Some(new.as_str()));
    }

    #[test]
    fn tokens_are_opaque_hex() {
        let mgr = SessionManager::new();
        let token = mgr.start_new_session();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
