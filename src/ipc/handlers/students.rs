use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn trimmed_param(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Face enrollment. Re-enrolling an existing student overwrites their face
/// data; `speechVerified` is stored as a verified-flag container.
fn handle_students_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(directory) = state.directory.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = trimmed_param(&req.params, "name");
    let student_id = trimmed_param(&req.params, "studentId");
    if name.is_empty() || student_id.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "please provide both name and student ID",
            None,
        );
    }
    let Some(face_descriptor) = req.params.get("faceDescriptor").cloned() else {
        return err(&req.id, "bad_params", "face data not captured", None);
    };
    if face_descriptor.is_null() {
        return err(&req.id, "bad_params", "face data not captured", None);
    }
    let speech_verified = req
        .params
        .get("speechVerified")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let voice_features = if speech_verified {
        Some(json!({ "verified": true }))
    } else {
        None
    };

    match directory.upsert(&name, &student_id, face_descriptor, voice_features) {
        Ok(is_new) => {
            let mut message = if is_new {
                format!("Successfully enrolled {}!", name)
            } else {
                format!("Updated data for {}.", name)
            };
            if speech_verified {
                message.push_str(" (Speech verified)");
            }
            ok(&req.id, json!({ "isNew": is_new, "message": message }))
        }
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

fn handle_students_face_descriptor(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(directory) = state.directory.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = trimmed_param(&req.params, "studentId");
    if student_id.is_empty() {
        return err(&req.id, "bad_params", "missing studentId", None);
    }
    match directory.get(&student_id) {
        Ok(Some(student)) => ok(
            &req.id,
            json!({
                "descriptor": student.face_descriptor,
                "name": student.name,
            }),
        ),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

/// Voice enrollment takes the feature vector the host layer extracted from
/// the uploaded audio. Requires an existing (face-enrolled) student.
fn handle_students_enroll_voice(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(directory) = state.directory.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = trimmed_param(&req.params, "studentId");
    let features = req.params.get("voiceFeatures");
    if student_id.is_empty() || features.is_none() {
        return err(
            &req.id,
            "bad_params",
            "missing studentId or voiceFeatures",
            None,
        );
    }
    let features = features.cloned().unwrap_or(serde_json::Value::Null);
    if !features.is_array() {
        return err(&req.id, "bad_params", "could not process audio", None);
    }
    match directory.set_voice(&student_id, features) {
        Ok(true) => ok(&req.id, json!({ "message": "Voice enrolled successfully" })),
        Ok(false) => err(
            &req.id,
            "not_found",
            "student not found (enroll face first)",
            None,
        ),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

/// Simplified voice verification: confirms enrollment and echoes the
/// caller-asserted flag. No feature comparison happens here.
fn handle_students_verify_voice(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(directory) = state.directory.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = trimmed_param(&req.params, "studentId");
    if student_id.is_empty() {
        return err(&req.id, "bad_params", "missing studentId", None);
    }
    let speech_verified = req
        .params
        .get("speechVerified")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let student = match directory.get(&student_id) {
        Ok(Some(s)) => s,
        Ok(None) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return err(&req.id, "io_failed", format!("{e:?}"), None),
    };
    let Some(stored_voice) = student.voice_features else {
        return err(
            &req.id,
            "bad_params",
            "speech not enrolled for this student",
            None,
        );
    };
    let enrolled_verified = stored_voice
        .get("verified")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let verified = speech_verified && enrolled_verified;
    ok(
        &req.id,
        json!({
            "verified": verified,
            "confidence": if verified { 100 } else { 0 },
            "distance": 0,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.enroll" => Some(handle_students_enroll(state, req)),
        "students.faceDescriptor" => Some(handle_students_face_descriptor(state, req)),
        "students.enrollVoice" => Some(handle_students_enroll_voice(state, req)),
        "students.verifyVoice" => Some(handle_students_verify_voice(state, req)),
        _ => None,
    }
}
