use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clock;
use crate::store::DurableStore;

/// Enrollment record for one student. `face_descriptor` and `voice_features`
/// are opaque caller-supplied structures, stored verbatim; nothing here
/// recomputes or compares them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub student_id: String,
    pub face_descriptor: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_features: Option<serde_json::Value>,
    pub enrolled_at: String,
    pub updated_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DirectoryDoc {
    #[serde(default)]
    pub students: Vec<StudentRecord>,
}

/// Keyed store of enrolled students, backed by one durable JSON document.
/// `student_id` is the unique key.
pub struct StudentDirectory {
    store: DurableStore<DirectoryDoc>,
}

impl StudentDirectory {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(StudentDirectory {
            store: DurableStore::open(workspace, "students.json")?,
        })
    }

    pub fn get(&self, student_id: &str) -> anyhow::Result<Option<StudentRecord>> {
        let doc = self.store.read()?;
        Ok(doc.students.into_iter().find(|s| s.student_id == student_id))
    }

    /// Inserts a new record or overwrites the existing one for `student_id`.
    /// Overwrite refreshes `updated_at` and leaves `enrolled_at` untouched;
    /// `voice_features` is only replaced when a new value is supplied.
    /// Returns whether a new record was created.
    pub fn upsert(
        &self,
        name: &str,
        student_id: &str,
        face_descriptor: serde_json::Value,
        voice_features: Option<serde_json::Value>,
    ) -> anyhow::Result<bool> {
        let now = clock::utc_now_iso();
        self.store.update(|doc| {
            if let Some(existing) = doc
                .students
                .iter_mut()
                .find(|s| s.student_id == student_id)
            {
                existing.name = name.to_string();
                existing.face_descriptor = face_descriptor;
                if voice_features.is_some() {
                    existing.voice_features = voice_features;
                }
                existing.updated_at = now;
                return false;
            }
            doc.students.push(StudentRecord {
                name: name.to_string(),
                student_id: student_id.to_string(),
                face_descriptor,
                voice_features,
                enrolled_at: now.clone(),
                updated_at: now,
            });
            true
        })
    }

    /// Updates voice data for an existing record only. Returns false without
    /// creating anything if the student is unknown.
    pub fn set_voice(
        &self,
        student_id: &str,
        voice_features: serde_json::Value,
    ) -> anyhow::Result<bool> {
        let now = clock::utc_now_iso();
        self.store.update(|doc| {
            match doc
                .students
                .iter_mut()
                .find(|s| s.student_id == student_id)
            {
                Some(student) => {
                    student.voice_features = Some(voice_features);
                    student.updated_at = now;
                    true
                }
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_workspace(prefix: &str) -> PathBuf {
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

    #[test]
    fn upsert_inserts_then_overwrites() {
        let dir = StudentDirectory::open(&temp_workspace("attendd-dir-upsert")).expect("open");
        let is_new = dir
            .upsert("Jane Doe", "S1", json!([0.1, 0.2]), None)
            .expect("insert");
        assert!(is_new);
        let enrolled_at = dir.get("S1").expect("get").expect("record").enrolled_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        let is_new = dir
            .upsert("Jane D.", "S1", json!([0.3]), Some(json!({"verified": true})))
            .expect("overwrite");
        assert!(!is_new);

        let rec = dir.get("S1").expect("get").expect("record");
        assert_eq!(rec.name, "Jane D.");
        assert_eq!(rec.face_descriptor, json!([0.3]));
        assert_eq!(rec.voice_features, Some(json!({"verified": true})));
        assert_eq!(rec.enrolled_at, enrolled_at);
        assert!(rec.updated_at > enrolled_at);
    }

    #[test]
    fn upsert_without_voice_keeps_existing_voice() {
        let dir = StudentDirectory::open(&temp_workspace("attendd-dir-voice-keep")).expect("open");
        dir.upsert("Jane", "S1", json!([1.0]), Some(json!({"verified": true})))
            .expect("insert");
        dir.upsert("Jane", "S1", json!([2.0]), None).expect("overwrite");
        let rec = dir.get("S1").expect("get").expect("record");
        assert_eq!(rec.voice_features, Some(json!({"verified": true})));
    }

    #[test]
    fn set_voice_requires_existing_student() {
        let dir = StudentDirectory::open(&temp_workspace("attendd-dir-setvoice")).expect("open");
        assert!(!dir.set_voice("ghost", json!([1, 2, 3])).expect("set_voice"));
        assert!(dir.get("ghost").expect("get").is_none());

        dir.upsert("Bob", "S2", json!([0.5]), None).expect("insert");
        assert!(dir.set_voice("S2", json!([1, 2, 3])).expect("set_voice"));
        let rec = dir.get("S2").expect("get").expect("record");
        assert_eq!(rec.voice_features, Some(json!([1, 2, 3])));
    }
}
