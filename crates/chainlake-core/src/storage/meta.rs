use async_trait::async_trait;

use super::{BlockMeta, EventEntry, StorageError};

/// Read interface to the metadata index maintained by ingestion.
///
/// Block lookups are namespaced by schema `tag`; event lookups by
/// `event_tag`. Implementations must be safe for concurrent callers.
#[async_trait]
pub trait MetaStorage: Send + Sync {
    /// Returns the watermark block: the current maximum canonical height for
    /// the tag.
    async fn get_latest_block(&self, tag: u32) -> Result<BlockMeta, StorageError>;

    /// Looks a block up by `(height, hash)`. An empty hash resolves to the
    /// canonical block at that height.
    async fn get_block_by_hash(
        &self,
        tag: u32,
        height: u64,
        hash: &str,
    ) -> Result<BlockMeta, StorageError>;

    /// Returns canonical metadata for heights in `[start_height, end_height)`
    /// ascending.
    async fn get_blocks_by_height_range(
        &self,
        tag: u32,
        start_height: u64,
        end_height: u64,
    ) -> Result<Vec<BlockMeta>, StorageError>;

    /// Batch lookup of canonical metadata for an arbitrary height set.
    async fn get_blocks_by_heights(
        &self,
        tag: u32,
        heights: &[u64],
    ) -> Result<Vec<BlockMeta>, StorageError>;

    /// Returns up to `limit` events with ids strictly greater than
    /// `event_id`, in ascending id order.
    async fn get_events_after_event_id(
        &self,
        event_tag: u32,
        event_id: i64,
        limit: u64,
    ) -> Result<Vec<EventEntry>, StorageError>;

    /// Returns the maximum event id for the tag, or
    /// [`StorageError::NoEventHistory`] when the log is empty.
    async fn get_max_event_id(&self, event_tag: u32) -> Result<i64, StorageError>;

    /// Returns the id of the first event whose `block_height` matches, or
    /// [`StorageError::ItemNotFound`].
    async fn get_first_event_id_by_block_height(
        &self,
        event_tag: u32,
        height: u64,
    ) -> Result<i64, StorageError>;

    async fn get_event_by_event_id(
        &self,
        event_tag: u32,
        event_id: i64,
    ) -> Result<EventEntry, StorageError>;

    /// All events that touched the given block height, ascending by id.
    async fn get_events_by_block_height(
        &self,
        event_tag: u32,
        height: u64,
    ) -> Result<Vec<EventEntry>, StorageError>;
}
