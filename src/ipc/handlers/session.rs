use crate::ipc::error::{err, ok};
use crate::ipc::handlers::require_teacher;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_teacher_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match state.auth.login(password) {
        Some(token) => ok(&req.id, json!({ "token": token })),
        None => err(&req.id, "auth_failed", "wrong password", None),
    }
}

/// Start and rotate are the same operation: mint a fresh token, drop the old
/// one on the floor.
fn handle_session_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_teacher(state, req) {
        return resp;
    }
    let token = state.session.start_new_session();
    ok(
        &req.id,
        json!({
            "token": token,
            "createdAt": state.session.created_at(),
        }),
    )
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_teacher(state, req) {
        return resp;
    }
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let records = match ledger.list() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "io_failed", format!("{e:?}"), None),
    };
    let total = records.len();
    // Last 100, most recent first, for the teacher panel.
    let recent: Vec<serde_json::Value> = records
        .iter()
        .rev()
        .take(100)
        .map(|r| serde_json::to_value(r).unwrap_or(serde_json::Value::Null))
        .collect();
    let token = state.session.current_token();
    let checkin_url = token.as_deref().map(|t| state.checkin_url(t));
    ok(
        &req.id,
        json!({
            "token": token,
            "createdAt": state.session.created_at(),
            "checkinUrl": checkin_url,
            "recent": recent,
            "total": total,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teacher.login" => Some(handle_teacher_login(state, req)),
        "session.start" | "session.rotate" => Some(handle_session_start(state, req)),
        "session.current" => Some(handle_session_current(state, req)),
        _ => None,
    }
}
