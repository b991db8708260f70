//! Wire messages for the `chainlake.ChainLake` service.
//!
//! The message set is hand-maintained prost derives kept in lockstep with
//! `proto/chainlake.proto`; the service trait and transport glue live in
//! [`service`].

mod service;

pub use service::chain_lake_server;

/// Fully qualified gRPC service name. The admission layer and the error
/// mapper act only on methods of this service so that co-registered services
/// (e.g. reflection) pass through untouched.
pub const FULL_SERVICE_NAME: &str = "chainlake.ChainLake";

/// Stream cursor positions accepted in `initial_position_in_stream`, besides
/// a decimal block height.
pub const INITIAL_POSITION_LATEST: &str = "LATEST";
pub const INITIAL_POSITION_EARLIEST: &str = "EARLIEST";

/// Payload compression, inferred from the object-key suffix at presign time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Compression {
    None = 0,
    Gzip = 1,
    Zstd = 2,
}

impl Compression {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Gzip => "GZIP",
            Compression::Zstd => "ZSTD",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    Unknown = 0,
    BlockAdded = 1,
    BlockRemoved = 2,
}

impl EventType {
    /// Lenient decode for wire values; unrecognized values collapse to
    /// `Unknown`.
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => EventType::BlockAdded,
            2 => EventType::BlockRemoved,
            _ => EventType::Unknown,
        }
    }

    pub fn as_str_name(&self) -> &'static str {
        match self {
            EventType::Unknown => "UNKNOWN",
            EventType::BlockAdded => "BLOCK_ADDED",
            EventType::BlockRemoved => "BLOCK_REMOVED",
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockIdentifier {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub height: u64,
    #[prost(bool, tag = "4")]
    pub skipped: bool,
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
}

/// A raw block payload as stored in the object store.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub parent_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub height: u64,
    #[prost(uint64, tag = "5")]
    pub parent_height: u64,
    #[prost(bool, tag = "6")]
    pub skipped: bool,
    #[prost(int64, tag = "7")]
    pub timestamp: i64,
    #[prost(bytes = "vec", tag = "8")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

/// A presigned handle to a block payload; `skipped` blocks carry no URL.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockFile {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub parent_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub height: u64,
    #[prost(uint64, tag = "5")]
    pub parent_height: u64,
    #[prost(string, tag = "6")]
    pub file_url: ::prost::alloc::string::String,
    #[prost(enumeration = "Compression", tag = "7")]
    pub compression: i32,
    #[prost(bool, tag = "8")]
    pub skipped: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NativeTransaction {
    #[prost(string, tag = "1")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub block_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub block_height: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NativeBlock {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub parent_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub height: u64,
    #[prost(uint64, tag = "5")]
    pub parent_height: u64,
    #[prost(int64, tag = "6")]
    pub timestamp: i64,
    #[prost(bool, tag = "7")]
    pub skipped: bool,
    #[prost(message, repeated, tag = "8")]
    pub transactions: ::prost::alloc::vec::Vec<NativeTransaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RosettaBlock {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub parent_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub height: u64,
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
    #[prost(bytes = "vec", tag = "6")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

/// Merkle account proof fetched from a full node; opaque to this tier.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountProof {
    #[prost(string, tag = "1")]
    pub account: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountState {
    #[prost(string, tag = "1")]
    pub account: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub balance: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub nonce: u64,
    #[prost(string, tag = "4")]
    pub storage_hash: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub code_hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockchainEvent {
    /// Deprecated: decimal-string form of `sequence_num`. Kept for clients
    /// that predate the numeric cursor; both encodings round-trip.
    #[prost(string, tag = "1")]
    pub sequence: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub sequence_num: i64,
    #[prost(enumeration = "EventType", tag = "3")]
    pub event_type: i32,
    #[prost(message, optional, tag = "4")]
    pub block: ::core::option::Option<BlockIdentifier>,
    #[prost(uint32, tag = "5")]
    pub event_tag: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetLatestBlockRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetLatestBlockResponse {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub parent_hash: ::prost::alloc::string::String,
    #[prost(uint64, tag = "4")]
    pub height: u64,
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockFileRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
    #[prost(string, tag = "3")]
    pub hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockFileResponse {
    #[prost(message, optional, tag = "1")]
    pub file: ::core::option::Option<BlockFile>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockFilesByRangeRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub start_height: u64,
    #[prost(uint64, tag = "3")]
    pub end_height: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockFilesByRangeResponse {
    #[prost(message, repeated, tag = "1")]
    pub files: ::prost::alloc::vec::Vec<BlockFile>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRawBlockRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
    #[prost(string, tag = "3")]
    pub hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRawBlockResponse {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<Block>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRawBlocksByRangeRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub start_height: u64,
    #[prost(uint64, tag = "3")]
    pub end_height: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRawBlocksByRangeResponse {
    #[prost(message, repeated, tag = "1")]
    pub blocks: ::prost::alloc::vec::Vec<Block>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeBlockRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
    #[prost(string, tag = "3")]
    pub hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeBlockResponse {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<NativeBlock>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeBlocksByRangeRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub start_height: u64,
    #[prost(uint64, tag = "3")]
    pub end_height: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeBlocksByRangeResponse {
    #[prost(message, repeated, tag = "1")]
    pub blocks: ::prost::alloc::vec::Vec<NativeBlock>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRosettaBlockRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
    #[prost(string, tag = "3")]
    pub hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRosettaBlockResponse {
    #[prost(message, optional, tag = "1")]
    pub block: ::core::option::Option<RosettaBlock>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRosettaBlocksByRangeRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub start_height: u64,
    #[prost(uint64, tag = "3")]
    pub end_height: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRosettaBlocksByRangeResponse {
    #[prost(message, repeated, tag = "1")]
    pub blocks: ::prost::alloc::vec::Vec<RosettaBlock>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockByTransactionRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub transaction_hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockByTransactionResponse {
    #[prost(message, repeated, tag = "1")]
    pub blocks: ::prost::alloc::vec::Vec<BlockIdentifier>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeTransactionRequest {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(string, tag = "2")]
    pub transaction_hash: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNativeTransactionResponse {
    #[prost(message, repeated, tag = "1")]
    pub transactions: ::prost::alloc::vec::Vec<NativeTransaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountStateQuery {
    #[prost(uint32, tag = "1")]
    pub tag: u32,
    #[prost(uint64, tag = "2")]
    pub height: u64,
    #[prost(string, tag = "3")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub account: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVerifiedAccountStateRequest {
    #[prost(message, optional, tag = "1")]
    pub req: ::core::option::Option<AccountStateQuery>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVerifiedAccountStateResponse {
    #[prost(message, optional, tag = "1")]
    pub response: ::core::option::Option<AccountState>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainEventsRequest {
    /// Deprecated: use `sequence_num`.
    #[prost(string, tag = "1")]
    pub sequence: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub initial_position_in_stream: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub event_tag: u32,
    #[prost(int64, tag = "4")]
    pub sequence_num: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainEventsResponse {
    #[prost(message, optional, tag = "1")]
    pub event: ::core::option::Option<BlockchainEvent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetChainEventsRequest {
    /// Deprecated: use `sequence_num`.
    #[prost(string, tag = "1")]
    pub sequence: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub initial_position_in_stream: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub event_tag: u32,
    #[prost(int64, tag = "4")]
    pub sequence_num: i64,
    #[prost(uint64, tag = "5")]
    pub max_num_events: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetChainEventsResponse {
    #[prost(message, repeated, tag = "1")]
    pub events: ::prost::alloc::vec::Vec<BlockchainEvent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVersionedChainEventRequest {
    #[prost(uint32, tag = "1")]
    pub from_event_tag: u32,
    #[prost(uint32, tag = "2")]
    pub to_event_tag: u32,
    /// Deprecated: use `from_sequence_num`.
    #[prost(string, tag = "3")]
    pub from_sequence: ::prost::alloc::string::String,
    #[prost(int64, tag = "4")]
    pub from_sequence_num: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVersionedChainEventResponse {
    #[prost(message, optional, tag = "1")]
    pub event: ::core::option::Option<BlockchainEvent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetChainMetadataRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetChainMetadataResponse {
    #[prost(uint32, tag = "1")]
    pub latest_block_tag: u32,
    #[prost(uint32, tag = "2")]
    pub stable_block_tag: u32,
    #[prost(uint32, tag = "3")]
    pub latest_event_tag: u32,
    #[prost(uint32, tag = "4")]
    pub stable_event_tag: u32,
}
