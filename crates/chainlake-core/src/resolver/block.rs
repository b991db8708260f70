//! Block identifier and range resolution.

use std::sync::Arc;

use tonic::Status;

use crate::config::AppConfig;
use crate::errors::ServerError;
use crate::storage::{BlockMeta, MetaStorage};

use super::validate_block_tag;

/// Resolves block identifiers to canonical metadata.
///
/// Range reads are validated twice: argument checks up front, and a
/// watermark re-read afterwards. A reorg can shorten the chain between the
/// range fetch and the response; the second check turns that race into a
/// distinguished `FAILED_PRECONDITION` so the client retries instead of
/// consuming blocks that are no longer canonical.
pub struct BlockResolver {
    config: Arc<AppConfig>,
    meta: Arc<dyn MetaStorage>,
}

impl BlockResolver {
    pub fn new(config: Arc<AppConfig>, meta: Arc<dyn MetaStorage>) -> Self {
        Self { config, meta }
    }

    pub async fn get_latest(&self, tag: u32) -> Result<BlockMeta, ServerError> {
        let tag = self.config.effective_block_tag(tag);
        validate_block_tag(&self.config, tag)?;
        Ok(self.meta.get_latest_block(tag).await?)
    }

    pub async fn get_by_hash(
        &self,
        tag: u32,
        height: u64,
        hash: &str,
    ) -> Result<BlockMeta, ServerError> {
        let tag = self.config.effective_block_tag(tag);
        validate_block_tag(&self.config, tag)?;
        Ok(self.meta.get_block_by_hash(tag, height, hash).await?)
    }

    /// Resolves `[start_height, end_height)` ascending. An `end_height` of 0
    /// means a single block at `start_height`.
    pub async fn get_range(
        &self,
        tag: u32,
        start_height: u64,
        end_height: u64,
        max_blocks: u64,
    ) -> Result<Vec<BlockMeta>, ServerError> {
        let tag = self.config.effective_block_tag(tag);
        let end_height = if end_height == 0 { start_height + 1 } else { end_height };

        validate_block_tag(&self.config, tag)?;
        validate_block_range(start_height, end_height, max_blocks)?;

        let blocks = self
            .meta
            .get_blocks_by_height_range(tag, start_height, end_height)
            .await?;

        // A reorg may have landed after the range read. Never hand out
        // heights above the current watermark.
        let latest = self.meta.get_latest_block(tag).await?;
        if end_height - 1 > latest.height {
            return Err(Status::failed_precondition(format!(
                "block end height exceeded latest watermark {}",
                latest.height
            ))
            .into());
        }

        Ok(blocks)
    }
}

fn validate_block_range(
    start_height: u64,
    end_height: u64,
    max_blocks: u64,
) -> Result<(), ServerError> {
    if start_height >= end_height {
        return Err(Status::invalid_argument(
            "invalid range: start_height must be less than end_height",
        )
        .into());
    }

    if end_height - start_height > max_blocks {
        return Err(Status::invalid_argument(format!(
            "block range size exceeded limit of {max_blocks}"
        ))
        .into());
    }

    Ok(())
}
