use crate::clock;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::require_teacher;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_attendance_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_teacher(state, req) {
        return resp;
    }
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ledger.export_csv() {
        Ok(csv) => ok(
            &req.id,
            json!({
                "filename": format!("attendance_{}.csv", clock::export_stamp()),
                "csv": csv,
            }),
        ),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

fn handle_attendance_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_teacher(state, req) {
        return resp;
    }
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ledger.clear() {
        Ok(()) => ok(&req.id, json!({ "cleared": true })),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

fn handle_attendance_raw(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_teacher(state, req) {
        return resp;
    }
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ledger.raw().and_then(|doc| Ok(serde_json::to_value(&doc)?)) {
        Ok(doc) => ok(&req.id, doc),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.export" => Some(handle_attendance_export(state, req)),
        "attendance.clear" => Some(handle_attendance_clear(state, req)),
        "attendance.raw" => Some(handle_attendance_raw(state, req)),
        _ => None,
    }
}
