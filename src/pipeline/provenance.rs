use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::FileMeta;

/// Tracks which source documents have been ingested and how many records each contributed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceLedger {
    entries: Vec<FileMeta>,
}

impl ProvenanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<FileMeta>) -> Self {
        Self { entries }
    }

    /// Whether a document with this exact name has already been ingested
    pub fn has(&self, file_name: &str) -> bool {
        self.entries.iter().any(|e| e.name == file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&FileMeta> {
        self.entries.iter().find(|e| e.name == file_name)
    }

    /// Register a freshly ingested document
    pub fn register(&mut self, file_name: &str, record_count: usize) -> FileMeta {
        self.register_document(file_name, record_count, None)
    }

    /// Register a document along with the fingerprint of its bytes.
    ///
    /// Names are unique: registering an existing name replaces its entry.
    pub fn register_document(
        &mut self,
        file_name: &str,
        record_count: usize,
        checksum: Option<String>,
    ) -> FileMeta {
        let meta = FileMeta {
            id: Uuid::new_v4(),
            name: file_name.to_string(),
            processed_at: Utc::now(),
            record_count,
            checksum,
        };

        self.entries.retain(|e| e.name != file_name);
        self.entries.push(meta.clone());

        debug!(file = %file_name, record_count, id = %meta.id, "Registered file");
        meta
    }

    /// Remove the entry for a document. Returns the removed entry, if any.
    ///
    /// Callers go through `Dataset::remove_file` so the attributed records
    /// are removed in the same step.
    pub fn remove_file(&mut self, file_name: &str) -> Option<FileMeta> {
        let pos = self.entries.iter().position(|e| e.name == file_name)?;
        Some(self.entries.remove(pos))
    }

    pub fn wipe(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[FileMeta] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
