use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Teacher auth tokens expire after the same window the original cookie used.
const TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug)]
struct IssuedToken {
    token: String,
    issued_at: Instant,
}

/// Guard for teacher-only operations. Holds the SHA-256 digest of the
/// configured password and at most one outstanding auth token; handlers call
/// `is_authorized` before touching privileged state, keeping the gate
/// separate from the check-in core.
pub struct TeacherAuth {
    password_digest: [u8; 32],
    issued: Mutex<Option<IssuedToken>>,
}

impl TeacherAuth {
    pub fn new(password: &str) -> Self {
        TeacherAuth {
            password_digest: Sha256::digest(password.as_bytes()).into(),
            issued: Mutex::new(None),
        }
    }

    /// From the environment, matching the original deployment knob.
    pub fn from_env() -> Self {
        let password = std::env::var("TEACHER_PASSWORD").unwrap_or_else(|_| "admin".to_string());
        TeacherAuth::new(&password)
    }

    /// Checks the password and, on a match, mints a fresh auth token. A new
    /// login replaces any previously issued token.
    pub fn login(&self, password: &str) -> Option<String> {
        let digest: [u8; 32] = Sha256::digest(password.as_bytes()).into();
        if digest != self.password_digest {
            return None;
        }
        let token = Uuid::new_v4().simple().to_string();
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        *issued = Some(IssuedToken {
            token: token.clone(),
            issued_at: Instant::now(),
        });
        Some(token)
    }

    pub fn is_authorized(&self, token: &str) -> bool {
        let issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        match issued.as_ref() {
            Some(t) => t.token == token && t.issued_at.elapsed() < TOKEN_TTL,
            None => false,
        }
    }
}
