use crate::directory::StudentDirectory;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ledger::AttendanceLedger;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let ledger = match AttendanceLedger::open(&path) {
        Ok(l) => l,
        Err(e) => return err(&req.id, "io_failed", format!("{e:?}"), None),
    };
    let directory = match StudentDirectory::open(&path) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "io_failed", format!("{e:?}"), None),
    };

    if let Some(base_url) = req.params.get("baseUrl").and_then(|v| v.as_str()) {
        if !base_url.trim().is_empty() {
            state.base_url = base_url.trim().to_string();
        }
    }
    state.workspace = Some(path.clone());
    state.ledger = Some(ledger);
    state.directory = Some(directory);
    ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
