use chrono::Utc;

/// ISO-8601 UTC with microseconds and a trailing Z, the format every stored
/// timestamp in the two documents uses.
pub fn utc_now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Compact stamp for export filenames, e.g. 20260829T153000Z.
pub fn export_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}
