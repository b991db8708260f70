//! In-memory storage backends.
//!
//! These back the dev server profile and the test suites. The metadata index
//! keeps an explicit per-tag watermark, like the production index does, so a
//! reorg that shortens the chain can be simulated by moving the watermark
//! below already-indexed heights.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    BlobStorage, BlockMeta, EventEntry, MetaStorage, StorageError, TransactionRecord,
    TransactionStorage,
};

#[derive(Default)]
struct MetaState {
    canonical: HashMap<u32, BTreeMap<u64, BlockMeta>>,
    by_hash: HashMap<(u32, u64, String), BlockMeta>,
    watermark: HashMap<u32, u64>,
    events: HashMap<u32, BTreeMap<i64, EventEntry>>,
}

#[derive(Default)]
pub struct InMemoryMetaStorage {
    state: RwLock<MetaState>,
}

impl InMemoryMetaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes canonical metadata, advancing the tag watermark when the
    /// new height is above it.
    pub fn insert_block(&self, meta: BlockMeta) {
        let mut state = self.state.write();
        state
            .by_hash
            .insert((meta.tag, meta.height, meta.hash.clone()), meta.clone());
        let watermark = state.watermark.entry(meta.tag).or_insert(meta.height);
        if meta.height > *watermark {
            *watermark = meta.height;
        }
        state
            .canonical
            .entry(meta.tag)
            .or_default()
            .insert(meta.height, meta);
    }

    /// Moves the watermark for a tag, regardless of indexed heights.
    pub fn set_watermark(&self, tag: u32, height: u64) {
        self.state.write().watermark.insert(tag, height);
    }

    pub fn append_event(&self, event: EventEntry) {
        self.state
            .write()
            .events
            .entry(event.event_tag)
            .or_default()
            .insert(event.event_id, event);
    }
}

#[async_trait]
impl MetaStorage for InMemoryMetaStorage {
    async fn get_latest_block(&self, tag: u32) -> Result<BlockMeta, StorageError> {
        let state = self.state.read();
        let height = state
            .watermark
            .get(&tag)
            .copied()
            .ok_or(StorageError::ItemNotFound)?;
        state
            .canonical
            .get(&tag)
            .and_then(|blocks| blocks.get(&height))
            .cloned()
            .ok_or(StorageError::ItemNotFound)
    }

    async fn get_block_by_hash(
        &self,
        tag: u32,
        height: u64,
        hash: &str,
    ) -> Result<BlockMeta, StorageError> {
        let state = self.state.read();
        if hash.is_empty() {
            return state
                .canonical
                .get(&tag)
                .and_then(|blocks| blocks.get(&height))
                .cloned()
                .ok_or(StorageError::ItemNotFound);
        }
        state
            .by_hash
            .get(&(tag, height, hash.to_string()))
            .cloned()
            .ok_or(StorageError::ItemNotFound)
    }

    async fn get_blocks_by_height_range(
        &self,
        tag: u32,
        start_height: u64,
        end_height: u64,
    ) -> Result<Vec<BlockMeta>, StorageError> {
        let state = self.state.read();
        let blocks = state.canonical.get(&tag).ok_or(StorageError::ItemNotFound)?;
        let found: Vec<BlockMeta> = blocks
            .range(start_height..end_height)
            .map(|(_, meta)| meta.clone())
            .collect();
        if found.is_empty() {
            return Err(StorageError::ItemNotFound);
        }
        Ok(found)
    }

    async fn get_blocks_by_heights(
        &self,
        tag: u32,
        heights: &[u64],
    ) -> Result<Vec<BlockMeta>, StorageError> {
        let state = self.state.read();
        let Some(blocks) = state.canonical.get(&tag) else {
            return Ok(Vec::new());
        };
        Ok(heights
            .iter()
            .filter_map(|height| blocks.get(height).cloned())
            .collect())
    }

    async fn get_events_after_event_id(
        &self,
        event_tag: u32,
        event_id: i64,
        limit: u64,
    ) -> Result<Vec<EventEntry>, StorageError> {
        let state = self.state.read();
        let Some(events) = state.events.get(&event_tag) else {
            return Ok(Vec::new());
        };
        Ok(events
            .range((Bound::Excluded(event_id), Bound::Unbounded))
            .take(limit as usize)
            .map(|(_, event)| event.clone())
            .collect())
    }

    async fn get_max_event_id(&self, event_tag: u32) -> Result<i64, StorageError> {
        let state = self.state.read();
        state
            .events
            .get(&event_tag)
            .and_then(|events| events.keys().next_back().copied())
            .ok_or(StorageError::NoEventHistory)
    }

    async fn get_first_event_id_by_block_height(
        &self,
        event_tag: u32,
        height: u64,
    ) -> Result<i64, StorageError> {
        let state = self.state.read();
        state
            .events
            .get(&event_tag)
            .and_then(|events| {
                events
                    .values()
                    .find(|event| event.block_height == height)
                    .map(|event| event.event_id)
            })
            .ok_or(StorageError::ItemNotFound)
    }

    async fn get_event_by_event_id(
        &self,
        event_tag: u32,
        event_id: i64,
    ) -> Result<EventEntry, StorageError> {
        let state = self.state.read();
        state
            .events
            .get(&event_tag)
            .and_then(|events| events.get(&event_id))
            .cloned()
            .ok_or(StorageError::ItemNotFound)
    }

    async fn get_events_by_block_height(
        &self,
        event_tag: u32,
        height: u64,
    ) -> Result<Vec<EventEntry>, StorageError> {
        let state = self.state.read();
        let Some(events) = state.events.get(&event_tag) else {
            return Ok(Vec::new());
        };
        Ok(events
            .values()
            .filter(|event| event.block_height == height)
            .cloned()
            .collect())
    }
}

pub struct InMemoryBlobStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    endpoint: String,
}

impl Default for InMemoryBlobStorage {
    fn default() -> Self {
        Self::new("https://objects.chainlake.local")
    }
}

impl InMemoryBlobStorage {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { objects: RwLock::new(HashMap::new()), endpoint: endpoint.into() }
    }

    pub fn put_object(&self, key: impl Into<String>, data: Vec<u8>) {
        self.objects.write().insert(key.into(), data);
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn download(&self, meta: &BlockMeta) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .get(&meta.object_key)
            .cloned()
            .ok_or(StorageError::ItemNotFound)
    }

    async fn pre_sign(&self, object_key: &str) -> Result<String, StorageError> {
        Ok(format!("{}/{}?X-Expires=900&X-Signature=local", self.endpoint, object_key))
    }
}

#[derive(Default)]
pub struct InMemoryTransactionStorage {
    records: RwLock<HashMap<(u32, String), Vec<TransactionRecord>>>,
}

impl InMemoryTransactionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&self, record: TransactionRecord) {
        self.records
            .write()
            .entry((record.tag, record.transaction_hash.clone()))
            .or_default()
            .push(record);
    }
}

#[async_trait]
impl TransactionStorage for InMemoryTransactionStorage {
    async fn get_transactions(
        &self,
        tag: u32,
        transaction_hash: &str,
    ) -> Result<Vec<TransactionRecord>, StorageError> {
        self.records
            .read()
            .get(&(tag, transaction_hash.to_string()))
            .filter(|records| !records.is_empty())
            .cloned()
            .ok_or(StorageError::ItemNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EventType;

    fn meta(height: u64, hash: &str) -> BlockMeta {
        BlockMeta {
            tag: 1,
            height,
            hash: hash.to_string(),
            parent_hash: format!("0x{:x}", height.saturating_sub(1)),
            parent_height: height.saturating_sub(1),
            timestamp: 1_700_000_000 + height as i64,
            skipped: false,
            object_key: format!("blocks/1/{height}.json.gz"),
        }
    }

    fn event(event_id: i64, height: u64) -> EventEntry {
        EventEntry {
            event_id,
            event_tag: 1,
            event_type: EventType::BlockAdded,
            block_tag: 1,
            block_height: height,
            block_hash: format!("0x{height:x}"),
            parent_hash: format!("0x{:x}", height.saturating_sub(1)),
            block_skipped: false,
            block_timestamp: 1_700_000_000 + height as i64,
        }
    }

    #[tokio::test]
    async fn watermark_tracks_highest_insert_until_overridden() {
        let storage = InMemoryMetaStorage::new();
        for height in 100..110 {
            storage.insert_block(meta(height, &format!("0x{height:x}")));
        }

        let latest = storage.get_latest_block(1).await.unwrap();
        assert_eq!(latest.height, 109);

        storage.set_watermark(1, 108);
        let latest = storage.get_latest_block(1).await.unwrap();
        assert_eq!(latest.height, 108);

        // The already-indexed range is still fully readable.
        let range = storage.get_blocks_by_height_range(1, 100, 110).await.unwrap();
        assert_eq!(range.len(), 10);
    }

    #[tokio::test]
    async fn events_after_cursor_are_ordered_and_bounded() {
        let storage = InMemoryMetaStorage::new();
        for id in 1..=5 {
            storage.append_event(event(id, 100 + id as u64));
        }

        let events = storage.get_events_after_event_id(1, 2, 2).await.unwrap();
        let ids: Vec<i64> = events.iter().map(|event| event.event_id).collect();
        assert_eq!(ids, vec![3, 4]);

        assert_eq!(storage.get_max_event_id(1).await.unwrap(), 5);
        assert!(matches!(
            storage.get_max_event_id(9).await,
            Err(StorageError::NoEventHistory)
        ));
        assert_eq!(storage.get_first_event_id_by_block_height(1, 103).await.unwrap(), 3);
    }
}
