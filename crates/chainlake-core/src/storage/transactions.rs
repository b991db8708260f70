use async_trait::async_trait;

use super::{StorageError, TransactionRecord};

/// Read interface to the transaction index.
#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Returns every index entry for the transaction hash, including entries
    /// left behind by historical reorgs, or
    /// [`StorageError::ItemNotFound`] when the hash was never indexed.
    async fn get_transactions(
        &self,
        tag: u32,
        transaction_hash: &str,
    ) -> Result<Vec<TransactionRecord>, StorageError>;
}
