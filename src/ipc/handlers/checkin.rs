use crate::checkin::{
    ApiCheckin, AssertedVerification, CheckinController, CheckinError, FormCheckin, Provenance,
};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn param_str(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn param_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn provenance(params: &serde_json::Value) -> Provenance {
    Provenance {
        user_agent: param_str(params, "userAgent"),
        ip: param_str(params, "ip"),
    }
}

fn checkin_error(id: &str, e: CheckinError) -> serde_json::Value {
    match e {
        CheckinError::InvalidSession => err(id, "invalid_session", e.to_string(), None),
        CheckinError::MissingName | CheckinError::MissingStudentId => {
            err(id, "bad_params", e.to_string(), None)
        }
        CheckinError::FaceVerificationRequired => {
            err(id, "verification_required", e.to_string(), None)
        }
        CheckinError::Storage(_) => err(id, "io_failed", e.to_string(), None),
    }
}

/// GET /checkin/{token} equivalent: tells the host layer whether to render
/// the form or the stale-token page (which it serves with a 400).
fn handle_checkin_page(state: &mut AppState, req: &Request) -> serde_json::Value {
    let token = param_str(&req.params, "token");
    ok(
        &req.id,
        json!({
            "valid": state.session.is_active(&token),
            "token": token,
        }),
    )
}

fn handle_checkin_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let token = param_str(&req.params, "token");
    let submission = FormCheckin {
        name: param_str(&req.params, "name"),
        student_id: param_str(&req.params, "studentId"),
        face_verified: param_bool(&req.params, "faceVerified"),
        voice_verified: param_bool(&req.params, "voiceVerified"),
        verification_data: param_str(&req.params, "verificationData"),
        provenance: provenance(&req.params),
    };
    let controller = CheckinController::new(&state.session, ledger, &AssertedVerification);
    match controller.submit_form(&token, submission) {
        Ok(entry) => ok(
            &req.id,
            json!({ "entry": serde_json::to_value(&entry).unwrap_or(serde_json::Value::Null) }),
        ),
        Err(e) => checkin_error(&req.id, e),
    }
}

/// The programmatic path: session token travels in the payload and only the
/// name is required.
fn handle_checkin_api(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ledger) = state.ledger.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let token = param_str(&req.params, "sessionId");
    let submission = ApiCheckin {
        name: param_str(&req.params, "name"),
        student_id: param_str(&req.params, "studentId"),
        provenance: provenance(&req.params),
    };
    let controller = CheckinController::new(&state.session, ledger, &AssertedVerification);
    match controller.submit_api(&token, submission) {
        Ok(entry) => ok(
            &req.id,
            json!({ "entry": serde_json::to_value(&entry).unwrap_or(serde_json::Value::Null) }),
        ),
        Err(e) => checkin_error(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "checkin.page" => Some(handle_checkin_page(state, req)),
        "checkin.submit" => Some(handle_checkin_submit(state, req)),
        "checkin.api" => Some(handle_checkin_api(state, req)),
        _ => None,
    }
}
