//! Payload retrieval from the object store.
//!
//! Range reads fan out downloads with bounded parallelism. Results keep
//! their request positions regardless of completion order, and the first
//! failure fails the whole batch, dropping in-flight siblings.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::api::{Block, BlockFile};
use crate::errors::ServerError;
use crate::storage::{compression_for_key, BlobStorage, BlockMeta};

pub struct PayloadFetcher {
    blob: Arc<dyn BlobStorage>,
    num_workers: usize,
}

impl PayloadFetcher {
    pub fn new(blob: Arc<dyn BlobStorage>, num_workers: usize) -> Self {
        Self { blob, num_workers: num_workers.max(1) }
    }

    /// Downloads one payload. Skipped heights have no object; they come back
    /// as an empty-bodied block.
    pub async fn download_one(&self, meta: &BlockMeta) -> Result<Block, ServerError> {
        let data = if meta.skipped { Vec::new() } else { self.blob.download(meta).await? };
        Ok(block_from_meta(meta, data))
    }

    /// Downloads a batch with at most `num_workers` transfers in flight.
    ///
    /// The returned blocks are positioned exactly like the input metadata.
    /// On the first error the batch fails and the remaining transfers are
    /// dropped cooperatively.
    pub async fn download_many(&self, metas: &[BlockMeta]) -> Result<Vec<Block>, ServerError> {
        let mut futures: Vec<Pin<Box<dyn Future<Output = Result<Block, ServerError>> + Send + '_>>> =
            Vec::with_capacity(metas.len());
        for meta in metas {
            futures.push(Box::pin(self.download_one(meta)));
        }
        stream::iter(futures).buffered(self.num_workers).try_collect().await
    }

    /// Builds the presigned-file view of a block. Skipped heights return the
    /// `{tag, height, skipped}` sentinel without touching the object store.
    pub async fn pre_sign_file(&self, meta: &BlockMeta) -> Result<BlockFile, ServerError> {
        if meta.skipped {
            return Ok(BlockFile {
                tag: meta.tag,
                height: meta.height,
                skipped: true,
                ..Default::default()
            });
        }

        let compression = compression_for_key(&meta.object_key);
        let file_url = self.blob.pre_sign(&meta.object_key).await?;

        Ok(BlockFile {
            tag: meta.tag,
            hash: meta.hash.clone(),
            parent_hash: meta.parent_hash.clone(),
            height: meta.height,
            parent_height: meta.parent_height,
            file_url,
            compression: compression as i32,
            skipped: false,
        })
    }
}

fn block_from_meta(meta: &BlockMeta, data: Vec<u8>) -> Block {
    Block {
        tag: meta.tag,
        hash: meta.hash.clone(),
        parent_hash: meta.parent_hash.clone(),
        height: meta.height,
        parent_height: meta.parent_height,
        skipped: meta.skipped,
        timestamp: meta.timestamp,
        data,
    }
}
