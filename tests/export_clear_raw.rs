use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_daemon() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendd");
    let mut child = Command::new(exe)
        .env("TEACHER_PASSWORD", "test-pass")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn result(value: serde_json::Value, method: &str) -> serde_json::Value {
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn setup(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) -> (String, String) {
    let _ = result(
        request(
            stdin,
            reader,
            "ws",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        ),
        "workspace.select",
    );
    let auth = result(
        request(
            stdin,
            reader,
            "login",
            "teacher.login",
            json!({ "password": "test-pass" }),
        ),
        "teacher.login",
    )
    .get("token")
    .and_then(|v| v.as_str())
    .expect("auth token")
    .to_string();
    let token = result(
        request(
            stdin,
            reader,
            "start",
            "session.start",
            json!({ "authToken": auth }),
        ),
        "session.start",
    )
    .get("token")
    .and_then(|v| v.as_str())
    .expect("session token")
    .to_string();
    (auth, token)
}

#[test]
fn export_matches_ledger_and_clear_empties_it() {
    let workspace = temp_dir("attendd-export");
    let (_child, mut stdin, mut reader) = spawn_daemon();
    let (auth, token) = setup(&mut stdin, &mut reader, &workspace);

    for (i, (name, sid)) in [("Jane Doe", "S1"), ("Bob, Jr.", "S2")].iter().enumerate() {
        let _ = result(
            request(
                &mut stdin,
                &mut reader,
                &format!("c{}", i),
                "checkin.submit",
                json!({ "token": token, "name": name, "studentId": sid, "faceVerified": true }),
            ),
            "checkin.submit",
        );
    }

    let export = result(
        request(
            &mut stdin,
            &mut reader,
            "exp",
            "attendance.export",
            json!({ "authToken": auth }),
        ),
        "attendance.export",
    );
    let filename = export.get("filename").and_then(|v| v.as_str()).expect("filename");
    assert!(filename.starts_with("attendance_"));
    assert!(filename.ends_with("Z.csv"));
    let csv = export.get("csv").and_then(|v| v.as_str()).expect("csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "name,student_id,timestamp_utc,session_id,user_agent,ip");
    assert_eq!(lines.len(), 3);
    // Comma-bearing name comes through quoted.
    assert!(lines[2].starts_with("\"Bob, Jr.\",S2,"));

    // Raw dump shows the same two records with verification flags intact.
    let raw = result(
        request(
            &mut stdin,
            &mut reader,
            "raw",
            "attendance.raw",
            json!({ "authToken": auth }),
        ),
        "attendance.raw",
    );
    let records = raw.get("records").and_then(|v| v.as_array()).expect("records");
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].get("face_verified").and_then(|v| v.as_bool()),
        Some(true)
    );

    let _ = result(
        request(
            &mut stdin,
            &mut reader,
            "clear",
            "attendance.clear",
            json!({ "authToken": auth }),
        ),
        "attendance.clear",
    );
    let export = result(
        request(
            &mut stdin,
            &mut reader,
            "exp2",
            "attendance.export",
            json!({ "authToken": auth }),
        ),
        "attendance.export",
    );
    let csv = export.get("csv").and_then(|v| v.as_str()).expect("csv");
    assert_eq!(csv.lines().count(), 1);

    // Store stays usable after clear.
    let resp = request(
        &mut stdin,
        &mut reader,
        "c3",
        "checkin.submit",
        json!({ "token": token, "name": "Ada", "studentId": "S3", "faceVerified": true }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn export_clear_and_raw_are_teacher_only() {
    let workspace = temp_dir("attendd-export-auth");
    let (_child, mut stdin, mut reader) = spawn_daemon();
    let _ = result(
        request(
            &mut stdin,
            &mut reader,
            "ws",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        ),
        "workspace.select",
    );

    for (i, method) in ["attendance.export", "attendance.clear", "attendance.raw"]
        .iter()
        .enumerate()
    {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("{}", i),
            method,
            json!({ "authToken": "forged" }),
        );
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("auth_required"),
            "{} must be gated",
            method
        );
    }
}
