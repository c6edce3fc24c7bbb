use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::common::constants::{FILES_BLOB_KEY, RECORDS_BLOB_KEY};
use crate::common::error::Result;
use crate::domain::{FileMeta, TrafficRecord};
use crate::pipeline::dataset::Dataset;
use crate::pipeline::provenance::ProvenanceLedger;
use crate::pipeline::storage::BlobStore;

/// Loads and persists the dataset through a `BlobStore`
#[derive(Clone)]
pub struct DatasetRepository {
    store: Arc<dyn BlobStore>,
}

impl DatasetRepository {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Read the persisted dataset.
    ///
    /// Records and ledger load as one unit: if either blob is unparseable, or
    /// the two disagree on per-file counts, the whole dataset starts empty.
    pub async fn load(&self) -> Result<Dataset> {
        let records = self.store.load(RECORDS_BLOB_KEY).await?;
        let files = self.store.load(FILES_BLOB_KEY).await?;

        let (records, files) = match (
            parse_blob::<Vec<TrafficRecord>>(RECORDS_BLOB_KEY, records),
            parse_blob::<Vec<FileMeta>>(FILES_BLOB_KEY, files),
        ) {
            (Some(records), Some(files)) => (records, files),
            _ => {
                warn!("Persisted dataset is unreadable, starting from an empty dataset");
                return Ok(Dataset::new());
            }
        };

        let dataset = Dataset::from_parts(records, ProvenanceLedger::from_entries(files));
        if !dataset.ledger_is_consistent() {
            warn!("Persisted ledger does not match the persisted records, starting from an empty dataset");
            return Ok(Dataset::new());
        }

        info!(records = dataset.len(), files = dataset.ledger().len(), "Loaded dataset");
        Ok(dataset)
    }

    /// Persist records and ledger in a single store write
    pub async fn save(&self, dataset: &Dataset) -> Result<()> {
        let records = serde_json::to_vec(dataset.records())?;
        let files = serde_json::to_vec(dataset.ledger())?;
        let entries = [
            (RECORDS_BLOB_KEY, records.as_slice()),
            (FILES_BLOB_KEY, files.as_slice()),
        ];
        self.store.save_many(&entries).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}

/// Absent blobs parse as empty; `None` means the bytes were unparseable
fn parse_blob<T: DeserializeOwned + Default>(key: &str, bytes: Option<Vec<u8>>) -> Option<T> {
    let Some(bytes) = bytes else {
        return Some(T::default());
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding unparseable blob {}: {}", key, e);
            None
        }
    }
}
