use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::store::DurableStore;

/// One committed check-in. Immutable once appended; the only way an entry
/// leaves the ledger is the bulk clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub name: String,
    #[serde(default)]
    pub student_id: String,
    pub timestamp: String,
    pub session_id: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub ip: String,
    // Verification flags exist only on entries committed through the
    // interactive path; the JSON API path omits them entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_data: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerDoc {
    #[serde(default)]
    pub records: Vec<AttendanceEntry>,
}

/// Append-only ledger of check-ins, backed by one durable JSON document.
/// Appends are linearized by the document lock, so concurrent submissions
/// never lose entries to interleaved read-modify-write cycles.
pub struct AttendanceLedger {
    store: DurableStore<LedgerDoc>,
}

const CSV_HEADER: &str = "name,student_id,timestamp_utc,session_id,user_agent,ip\n";

impl AttendanceLedger {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(AttendanceLedger {
            store: DurableStore::open(workspace, "attendance.json")?,
        })
    }

    /// Appends one entry and persists the full updated sequence before
    /// returning. A failed write propagates; the entry is then not committed.
    pub fn append(&self, entry: AttendanceEntry) -> anyhow::Result<()> {
        self.store.update(|doc| doc.records.push(entry))
    }

    /// Full read in commit order.
    pub fn list(&self) -> anyhow::Result<Vec<AttendanceEntry>> {
        Ok(self.store.read()?.records)
    }

    /// Irreversibly replaces the ledger with an empty sequence.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.store.write(&LedgerDoc::default())
    }

    /// The raw document, for the teacher-only JSON dump.
    pub fn raw(&self) -> anyhow::Result<LedgerDoc> {
        self.store.read()
    }

    /// Projects the ledger into CSV with a fixed column order. Verification
    /// fields are deliberately not exported.
    pub fn export_csv(&self) -> anyhow::Result<String> {
        let records = self.list()?;
        let mut csv = String::from(CSV_HEADER);
        for r in &records {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                csv_quote(&r.name),
                csv_quote(&r.student_id),
                csv_quote(&r.timestamp),
                csv_quote(&r.session_id),
                csv_quote(&r.user_agent),
                csv_quote(&r.ip),
            ));
        }
        Ok(csv)
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
