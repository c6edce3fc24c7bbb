use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::{FileMeta, TrafficRecord, MANUAL_SOURCE};
use crate::pipeline::identity::IdentityKey;
use crate::pipeline::provenance::ProvenanceLedger;

/// The canonical record set together with the ledger certifying it.
///
/// Records and ledger only change together: a document's records are added
/// along with its `FileMeta`, and removing a document removes both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<TrafficRecord>,
    ledger: ProvenanceLedger,
}

/// What a cascading file deletion removed
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedFile {
    pub meta: Option<FileMeta>,
    pub records_removed: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(records: Vec<TrafficRecord>, ledger: ProvenanceLedger) -> Self {
        Self { records, ledger }
    }

    pub fn records(&self) -> &[TrafficRecord] {
        &self.records
    }

    pub fn ledger(&self) -> &ProvenanceLedger {
        &self.ledger
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a document's accepted records and register the document.
    ///
    /// Every appended record is attributed to `file_name`. The registered
    /// count is taken from the live records attributed to the file after the
    /// append.
    pub fn commit_file(
        &mut self,
        file_name: &str,
        checksum: Option<String>,
        accepted: Vec<TrafficRecord>,
    ) -> FileMeta {
        self.records.extend(accepted.into_iter().map(|mut record| {
            record.source_file = Some(file_name.to_string());
            record
        }));
        let record_count = self.count_from(file_name);
        let meta = self.ledger.register_document(file_name, record_count, checksum);
        info!(file = %file_name, record_count, "Committed file");
        meta
    }

    /// Add a hand-entered record unless its identity key is already present
    pub fn insert_manual(&mut self, mut record: TrafficRecord) -> bool {
        let key = IdentityKey::for_record(&record);
        if self.records.iter().any(|r| IdentityKey::for_record(r) == key) {
            debug!(key = %key, "Manual record already present");
            return false;
        }
        record.source_file = Some(MANUAL_SOURCE.to_string());
        self.records.push(record);
        true
    }

    /// Remove a document's ledger entry and every record it contributed
    pub fn remove_file(&mut self, file_name: &str) -> RemovedFile {
        let before = self.records.len();
        self.records.retain(|r| !r.is_from(file_name));
        let records_removed = before - self.records.len();
        let meta = self.ledger.remove_file(file_name);

        info!(file = %file_name, records_removed, "Removed file");
        RemovedFile { meta, records_removed }
    }

    pub fn wipe(&mut self) {
        self.records.clear();
        self.ledger.wipe();
        info!("Wiped dataset");
    }

    /// Live records attributed to a document
    pub fn count_from(&self, file_name: &str) -> usize {
        self.records.iter().filter(|r| r.is_from(file_name)).count()
    }

    /// Identity keys shared by more than one live record
    pub fn duplicate_keys(&self) -> Vec<IdentityKey> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for record in &self.records {
            let key = IdentityKey::for_record(record);
            if !seen.insert(key.clone()) && !dupes.contains(&key) {
                dupes.push(key);
            }
        }
        dupes
    }

    /// Whether every ledger entry's count matches its live records
    pub fn ledger_is_consistent(&self) -> bool {
        self.ledger
            .entries()
            .iter()
            .all(|meta| meta.record_count == self.count_from(&meta.name))
    }
}
