pub mod checkin;
pub mod core;
pub mod ledger;
pub mod session;
pub mod students;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

/// Gate for teacher-only methods: checks `params.authToken` against the
/// issued teacher token before the handler runs.
pub(crate) fn require_teacher(state: &AppState, req: &Request) -> Result<(), serde_json::Value> {
    let token = req
        .params
        .get("authToken")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if state.auth.is_authorized(token) {
        Ok(())
    } else {
        Err(err(&req.id, "auth_required", "teacher login required", None))
    }
}
