//! Interface to the blockchain-specific payload parsers.
//!
//! Parsers are provided per chain by external crates; the serving tier only
//! drives them. `NotImplemented` from a parser surfaces to clients as
//! `UNIMPLEMENTED`, so a chain without e.g. a Rosetta parser degrades
//! gracefully.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{
    AccountProof, AccountState, AccountStateQuery, Block, NativeBlock, NativeTransaction,
    RosettaBlock,
};

#[derive(Debug, Error)]
pub enum ParserError {
    /// The payload does not extend the chain it claims to; usually a reorg
    /// raced the read.
    #[error("invalid chain")]
    InvalidChain,

    /// Malformed input to the parser.
    #[error("invalid parser input parameters")]
    InvalidParameters,

    /// The parser does not implement the requested format for this chain.
    #[error("parser method not implemented")]
    NotImplemented,

    #[error("parser failure")]
    Internal(#[from] anyhow::Error),
}

/// Input to [`Parser::validate_account_state`]: the account query, the
/// parsed block it is anchored to, and the proof fetched from a full node.
#[derive(Debug, Clone)]
pub struct ValidateAccountStateInput {
    pub query: AccountStateQuery,
    pub block: NativeBlock,
    pub proof: AccountProof,
}

/// Chain-specific payload decoding.
#[async_trait]
pub trait Parser: Send + Sync {
    /// Decodes a raw payload into the chain's native block representation.
    async fn parse_native_block(&self, block: &Block) -> Result<NativeBlock, ParserError>;

    /// Decodes a raw payload into the Rosetta block representation.
    async fn parse_rosetta_block(&self, block: &Block) -> Result<RosettaBlock, ParserError>;

    /// Extracts a single transaction from an already-parsed native block.
    async fn get_native_transaction(
        &self,
        block: &NativeBlock,
        transaction_hash: &str,
    ) -> Result<NativeTransaction, ParserError>;

    /// Verifies an account proof against the block state root and returns
    /// the proven account state.
    async fn validate_account_state(
        &self,
        input: ValidateAccountStateInput,
    ) -> Result<AccountState, ParserError>;
}

/// Parser for deployments that serve raw payloads only. Every method
/// answers `NotImplemented`, which the boundary maps to `UNIMPLEMENTED`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedParser;

#[async_trait]
impl Parser for UnimplementedParser {
    async fn parse_native_block(&self, _block: &Block) -> Result<NativeBlock, ParserError> {
        Err(ParserError::NotImplemented)
    }

    async fn parse_rosetta_block(&self, _block: &Block) -> Result<RosettaBlock, ParserError> {
        Err(ParserError::NotImplemented)
    }

    async fn get_native_transaction(
        &self,
        _block: &NativeBlock,
        _transaction_hash: &str,
    ) -> Result<NativeTransaction, ParserError> {
        Err(ParserError::NotImplemented)
    }

    async fn validate_account_state(
        &self,
        _input: ValidateAccountStateInput,
    ) -> Result<AccountState, ParserError> {
        Err(ParserError::NotImplemented)
    }
}
