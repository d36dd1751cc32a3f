use std::path::PathBuf;

use serde::Deserialize;

use crate::auth::TeacherAuth;
use crate::directory::StudentDirectory;
use crate::ledger::AttendanceLedger;
use crate::session::SessionManager;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub base_url: String,
    pub auth: TeacherAuth,
    pub session: SessionManager,
    pub ledger: Option<AttendanceLedger>,
    pub directory: Option<StudentDirectory>,
}

impl AppState {
    /// A fresh session token is minted here, so the process starts with an
    /// active (if not yet advertised) session.
    pub fn new(auth: TeacherAuth) -> Self {
        AppState {
            workspace: None,
            base_url: "http://localhost:5000".to_string(),
            auth,
            session: SessionManager::new(),
            ledger: None,
            directory: None,
        }
    }

    pub fn checkin_url(&self, token: &str) -> String {
        format!("{}/checkin/{}", self.base_url.trim_end_matches('/'), token)
    }
}
