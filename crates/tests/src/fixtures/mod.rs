//! Reusable test fixtures: a seeded in-memory lake behind the real server,
//! a download-counting object store and a deterministic parser.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use chainlake_core::api::{
    AccountProof, AccountState, AccountStateQuery, Block, EventType, NativeBlock,
    NativeTransaction, RosettaBlock,
};
use chainlake_core::client::{ChainClient, ClientError};
use chainlake_core::config::AppConfig;
use chainlake_core::parser::{Parser, ParserError, ValidateAccountStateInput};
use chainlake_core::storage::memory::{
    InMemoryBlobStorage, InMemoryMetaStorage, InMemoryTransactionStorage,
};
use chainlake_core::storage::{
    BlobStorage, BlockMeta, EventEntry, StorageError, TransactionRecord,
};
use chainlake_server::Server;

/// Object store wrapper that counts downloads, so tests can assert which
/// paths never touch payload storage.
#[derive(Default)]
pub struct CountingBlob {
    inner: InMemoryBlobStorage,
    downloads: AtomicUsize,
}

impl CountingBlob {
    pub fn put_object(&self, key: impl Into<String>, data: Vec<u8>) {
        self.inner.put_object(key, data);
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStorage for CountingBlob {
    async fn download(&self, meta: &BlockMeta) -> Result<Vec<u8>, StorageError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.inner.download(meta).await
    }

    async fn pre_sign(&self, object_key: &str) -> Result<String, StorageError> {
        self.inner.pre_sign(object_key).await
    }
}

/// Parser with fully deterministic output derived from the raw block, good
/// enough to follow data through the native and Rosetta paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeParser;

#[async_trait]
impl Parser for FakeParser {
    async fn parse_native_block(&self, block: &Block) -> Result<NativeBlock, ParserError> {
        Ok(NativeBlock {
            tag: block.tag,
            hash: block.hash.clone(),
            parent_hash: block.parent_hash.clone(),
            height: block.height,
            parent_height: block.parent_height,
            timestamp: block.timestamp,
            skipped: block.skipped,
            transactions: vec![NativeTransaction {
                hash: format!("0xtx{:x}", block.height),
                block_hash: block.hash.clone(),
                block_height: block.height,
                payload: block.data.clone(),
            }],
        })
    }

    async fn parse_rosetta_block(&self, block: &Block) -> Result<RosettaBlock, ParserError> {
        Ok(RosettaBlock {
            tag: block.tag,
            hash: block.hash.clone(),
            parent_hash: block.parent_hash.clone(),
            height: block.height,
            timestamp: block.timestamp,
            payload: block.data.clone(),
        })
    }

    async fn get_native_transaction(
        &self,
        block: &NativeBlock,
        transaction_hash: &str,
    ) -> Result<NativeTransaction, ParserError> {
        Ok(NativeTransaction {
            hash: transaction_hash.to_string(),
            block_hash: block.hash.clone(),
            block_height: block.height,
            payload: Vec::new(),
        })
    }

    async fn validate_account_state(
        &self,
        input: ValidateAccountStateInput,
    ) -> Result<AccountState, ParserError> {
        Ok(AccountState {
            account: input.query.account,
            balance: "1000000000".to_string(),
            nonce: 7,
            storage_hash: input.block.hash,
            code_hash: "0xc0de".to_string(),
        })
    }
}

/// Chain client returning a canned proof for the queried account.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubChainClient;

#[async_trait]
impl ChainClient for StubChainClient {
    async fn get_account_proof(
        &self,
        query: &AccountStateQuery,
    ) -> Result<AccountProof, ClientError> {
        Ok(AccountProof { account: query.account.clone(), payload: b"proof".to_vec() })
    }
}

/// A fully wired server over in-memory backends.
pub struct TestLake {
    pub config: Arc<AppConfig>,
    pub meta: Arc<InMemoryMetaStorage>,
    pub blob: Arc<CountingBlob>,
    pub transactions: Arc<InMemoryTransactionStorage>,
    pub server: Server,
}

pub struct TestLakeBuilder {
    config: AppConfig,
}

impl TestLakeBuilder {
    pub fn with_config(mut self, mutate: impl FnOnce(&mut AppConfig)) -> Self {
        mutate(&mut self.config);
        self
    }

    /// Fast streaming pace for tests: 20 ms polls.
    pub fn with_fast_streaming(self, max_no_event_ms: u64) -> Self {
        self.with_config(|config| {
            config.api.streaming_interval_ms = 20;
            config.api.streaming_max_no_event_time_ms = max_no_event_ms;
        })
    }

    pub fn build(self) -> TestLake {
        let config = Arc::new(self.config);
        let meta = Arc::new(InMemoryMetaStorage::new());
        let blob = Arc::new(CountingBlob::default());
        let transactions = Arc::new(InMemoryTransactionStorage::new());

        let server = Server::new(
            Arc::clone(&config),
            Arc::clone(&meta) as _,
            Arc::clone(&blob) as _,
            Arc::clone(&transactions) as _,
            Arc::new(FakeParser),
            Arc::new(StubChainClient),
        );

        TestLake { config, meta, blob, transactions, server }
    }
}

impl TestLake {
    pub fn builder() -> TestLakeBuilder {
        TestLakeBuilder { config: AppConfig::default() }
    }

    /// Seeds canonical metadata plus payload objects for a height range.
    pub fn seed_blocks(&self, tag: u32, heights: std::ops::Range<u64>) {
        for height in heights {
            let meta = block_meta(tag, height);
            self.blob
                .put_object(meta.object_key.clone(), payload_for(height));
            self.meta.insert_block(meta);
        }
    }

    pub fn seed_events(&self, events: Vec<EventEntry>) {
        for event in events {
            self.meta.append_event(event);
        }
    }
}

pub fn block_meta(tag: u32, height: u64) -> BlockMeta {
    BlockMeta {
        tag,
        height,
        hash: format!("0x{height:x}"),
        parent_hash: format!("0x{:x}", height.saturating_sub(1)),
        parent_height: height.saturating_sub(1),
        timestamp: 1_700_000_000 + height as i64,
        skipped: false,
        object_key: format!("blocks/{tag}/{height}.json.gz"),
    }
}

pub fn payload_for(height: u64) -> Vec<u8> {
    format!("payload-{height}").into_bytes()
}

pub fn added_event(event_id: i64, height: u64) -> EventEntry {
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

pub fn removed_event(event_id: i64, height: u64) -> EventEntry {
    EventEntry { event_type: EventType::BlockRemoved, ..added_event(event_id, height) }
}

pub fn transaction_record(tag: u32, hash: &str, height: u64, block_hash: &str) -> TransactionRecord {
    TransactionRecord {
        tag,
        transaction_hash: hash.to_string(),
        block_height: height,
        block_hash: block_hash.to_string(),
    }
}
