mod in_memory;
mod sqlite;

pub use in_memory::InMemoryBlobStore;
pub use sqlite::SqliteBlobStore;

use crate::common::error::Result;
use async_trait::async_trait;

/// Key/value blob persistence the dataset is written to
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn save(&self, key: &str, blob: &[u8]) -> Result<()>;
    /// Write several blobs as one unit: either every entry is stored or none is
    async fn save_many(&self, entries: &[(&str, &[u8])]) -> Result<()>;
    /// Remove every stored blob
    async fn clear(&self) -> Result<()>;
}
