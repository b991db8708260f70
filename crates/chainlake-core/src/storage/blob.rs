use async_trait::async_trait;

use super::{BlockMeta, StorageError};

/// Read interface to the payload object store.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Downloads the payload blob for the given metadata. Callers must not
    /// ask for `skipped` blocks; there is no object behind them.
    async fn download(&self, meta: &BlockMeta) -> Result<Vec<u8>, StorageError>;

    /// Returns a presigned, time-limited URL for direct download of the
    /// object.
    async fn pre_sign(&self, object_key: &str) -> Result<String, StorageError>;
}
