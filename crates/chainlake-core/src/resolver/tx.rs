//! Transaction-hash to canonical-block resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::ServerError;
use crate::storage::{BlockMeta, MetaStorage, TransactionStorage};

use super::validate_block_tag;

/// Resolves a transaction hash to the canonical block(s) containing it.
///
/// The transaction index keeps every historical inclusion, including ones
/// that were reorged out. A record only counts when the canonical block at
/// its height still carries the hash the record was written under.
pub struct TxResolver {
    config: Arc<AppConfig>,
    meta: Arc<dyn MetaStorage>,
    transactions: Arc<dyn TransactionStorage>,
}

impl TxResolver {
    pub fn new(
        config: Arc<AppConfig>,
        meta: Arc<dyn MetaStorage>,
        transactions: Arc<dyn TransactionStorage>,
    ) -> Self {
        Self { config, meta, transactions }
    }

    /// Returns canonical metadata in the order of the index records.
    pub async fn resolve_blocks(
        &self,
        tag: u32,
        transaction_hash: &str,
    ) -> Result<Vec<BlockMeta>, ServerError> {
        let tag = self.config.effective_block_tag(tag);
        validate_block_tag(&self.config, tag)?;

        let records = self.transactions.get_transactions(tag, transaction_hash).await?;

        let mut heights: Vec<u64> = records.iter().map(|record| record.block_height).collect();
        heights.sort_unstable();
        heights.dedup();

        let canonical = self.meta.get_blocks_by_heights(tag, &heights).await?;
        let by_height: HashMap<u64, BlockMeta> =
            canonical.into_iter().map(|meta| (meta.height, meta)).collect();

        let mut results = Vec::new();
        for record in &records {
            match by_height.get(&record.block_height) {
                // The inclusion survived: the canonical block still carries
                // the hash the record was written under.
                Some(canonical) if canonical.hash == record.block_hash => {
                    results.push(canonical.clone());
                }
                // Reorged out, or the height fell off the canonical chain.
                _ => {}
            }
        }

        Ok(results)
    }
}
