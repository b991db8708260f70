//! Interface to the upstream full node used for account proofs.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{AccountProof, AccountStateQuery};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("account proof unavailable: {0}")]
    ProofUnavailable(String),

    #[error("node client failure")]
    Internal(#[from] anyhow::Error),
}

/// Thin client over the chain's full node. Only the account-proof fetch is
/// needed by the serving tier; everything else the node offers belongs to
/// ingestion.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_account_proof(
        &self,
        query: &AccountStateQuery,
    ) -> Result<AccountProof, ClientError>;
}

/// Client for deployments without a full-node connection. The account-state
/// feature is normally disabled alongside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredChainClient;

#[async_trait]
impl ChainClient for UnconfiguredChainClient {
    async fn get_account_proof(
        &self,
        _query: &AccountStateQuery,
    ) -> Result<AccountProof, ClientError> {
        Err(ClientError::ProofUnavailable("no full node configured".to_string()))
    }
}
