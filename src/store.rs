use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One JSON document on disk, read and replaced whole under a per-document
/// lock. Callers that need read-modify-write must go through `update` so the
/// whole cycle sits inside a single critical section.
pub struct DurableStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _doc: PhantomData<T>,
}

impl<T> DurableStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn open(workspace: &Path, file_name: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)
            .with_context(|| format!("create workspace dir {}", workspace.display()))?;
        Ok(DurableStore {
            path: workspace.join(file_name),
            lock: Mutex::new(()),
            _doc: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> anyhow::Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_locked()
    }

    pub fn write(&self, doc: &T) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_locked(doc)
    }

    /// Read, mutate, and persist the document without releasing the lock in
    /// between. Returns whatever the closure returns once the replacement
    /// document is durably on disk.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> anyhow::Result<R> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.read_locked()?;
        let out = f(&mut doc);
        self.write_locked(&doc)?;
        Ok(out)
    }

    fn read_locked(&self) -> anyhow::Result<T> {
        if !self.path.exists() {
            // Create-on-first-use: an empty-but-valid default document.
            let doc = T::default();
            self.write_locked(&doc)?;
            return Ok(doc);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", self.path.display()))
    }

    fn write_locked(&self, doc: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(doc).context("serialize document")?;
        // Whole replacement or nothing: land the bytes in a sibling temp file,
        // then rename over the target.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}
