//! File-backed [`ChatStore`] used when no database-backed store is wired in.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatEntry, ChatId},
    ports::ChatStore,
    Result,
};

/// Persists the chat mirror as a single JSON document, rewritten per change.
///
/// Per-call atomicity only, which is all the registry assumes of its store.
pub struct JsonChatStore {
    path: PathBuf,
    // Serializes read-modify-write cycles between concurrent mutations.
    lock: Mutex<()>,
}

impl JsonChatStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<Vec<ChatEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let txt = std::fs::read_to_string(&self.path)?;
        if txt.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&txt)?)
    }

    fn write_entries(&self, entries: &[ChatEntry]) -> Result<()> {
        let txt = serde_json::to_string(entries)?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for JsonChatStore {
    async fn list_all(&self) -> Result<Vec<ChatEntry>> {
        let _guard = self.lock.lock().await;
        self.read_entries()
    }

    async fn insert(&self, entry: ChatEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries()?;
        if !entries.iter().any(|e| e.id == entry.id) {
            entries.push(entry);
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: ChatId) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() != before {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
