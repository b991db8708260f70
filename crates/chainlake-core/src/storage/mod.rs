//! Interfaces to the out-of-band storage tiers.
//!
//! Ingestion (out of scope here) writes canonical block payloads to a
//! large-object store and maintains a metadata index describing the canonical
//! chain plus a monotonic event log of chain mutations. The serving tier only
//! reads. Production backends implement these traits elsewhere; the
//! [`memory`] module carries the in-memory implementation used by the dev
//! profile and the test suites.

mod blob;
mod errors;
pub mod memory;
mod meta;
mod transactions;

pub use blob::BlobStorage;
pub use errors::StorageError;
pub use meta::MetaStorage;
pub use transactions::TransactionStorage;

use crate::api::Compression;

/// First event id ever assigned within an event-tag namespace. An
/// `EARLIEST` stream cursor starts just before this value.
pub const EVENT_ID_START: i64 = 1;

/// Canonical block metadata, immutable once published by ingestion.
///
/// `skipped` marks a height that is reserved but produced no payload; there
/// is no object to fetch for it. `object_key` identifies the payload blob,
/// with the compression scheme encoded in the key suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockMeta {
    pub tag: u32,
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub parent_height: u64,
    pub timestamp: i64,
    pub skipped: bool,
    pub object_key: String,
}

/// One entry of the chain-mutation event log.
///
/// `event_id` is strictly monotonically increasing within an `event_tag`
/// namespace. A reorg materializes as `BlockRemoved` for the old tip(s)
/// followed by `BlockAdded` for the new tip(s), possibly at the same height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub event_id: i64,
    pub event_tag: u32,
    pub event_type: crate::api::EventType,
    pub block_tag: u32,
    pub block_height: u64,
    pub block_hash: String,
    pub parent_hash: String,
    pub block_skipped: bool,
    pub block_timestamp: i64,
}

/// Transaction index entry. Multiple records may exist for one hash across
/// historical reorgs; canonicality is decided against current [`BlockMeta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub tag: u32,
    pub transaction_hash: String,
    pub block_height: u64,
    pub block_hash: String,
}

/// Infers the payload compression from the object-key suffix.
pub fn compression_for_key(object_key: &str) -> Compression {
    if object_key.ends_with(".gz") || object_key.ends_with(".gzip") {
        Compression::Gzip
    } else if object_key.ends_with(".zst") || object_key.ends_with(".zstd") {
        Compression::Zstd
    } else {
        Compression::None
    }
}
