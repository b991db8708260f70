//! Request handlers for the `chainlake.ChainLake` service.
//!
//! Handlers produce typed [`ServerError`]s; the dispatch wrappers in
//! [`crate::rpc`] push every completion through the boundary error mapper
//! and the request counter, so the policy is identical across methods.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tonic::{Code, Status};

use chainlake_core::api::{
    BlockIdentifier, EventType, GetBlockByTransactionRequest, GetBlockByTransactionResponse,
    GetBlockFileRequest, GetBlockFileResponse, GetBlockFilesByRangeRequest,
    GetBlockFilesByRangeResponse, GetChainEventsRequest, GetChainEventsResponse,
    GetChainMetadataRequest, GetChainMetadataResponse, GetLatestBlockRequest,
    GetLatestBlockResponse, GetNativeBlockRequest, GetNativeBlockResponse,
    GetNativeBlocksByRangeRequest, GetNativeBlocksByRangeResponse, GetNativeTransactionRequest,
    GetNativeTransactionResponse, GetRawBlockRequest, GetRawBlockResponse,
    GetRawBlocksByRangeRequest, GetRawBlocksByRangeResponse, GetRosettaBlockRequest,
    GetRosettaBlockResponse, GetRosettaBlocksByRangeRequest, GetRosettaBlocksByRangeResponse,
    GetVerifiedAccountStateRequest, GetVerifiedAccountStateResponse,
    GetVersionedChainEventRequest, GetVersionedChainEventResponse, FULL_SERVICE_NAME,
};
use chainlake_core::auth::ClientContext;
use chainlake_core::client::ChainClient;
use chainlake_core::config::AppConfig;
use chainlake_core::errors::{code_label, ErrorMapper, ServerError};
use chainlake_core::events::{decode_sequence, event_to_wire, EventStreamer};
use chainlake_core::fetcher::PayloadFetcher;
use chainlake_core::metrics::{
    ServerMetrics, EVENT_TYPE_BLOCK_ADDED, EVENT_TYPE_BLOCK_REMOVED, FORMAT_FILE, FORMAT_NATIVE,
    FORMAT_RAW, FORMAT_ROSETTA,
};
use chainlake_core::parser::{Parser, ParserError, ValidateAccountStateInput};
use chainlake_core::resolver::{BlockResolver, TxResolver};
use chainlake_core::storage::{BlobStorage, MetaStorage, TransactionStorage};

pub struct Server {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) blocks: BlockResolver,
    pub(crate) transactions: TxResolver,
    pub(crate) fetcher: PayloadFetcher,
    pub(crate) streamer: Arc<EventStreamer>,
    pub(crate) meta: Arc<dyn MetaStorage>,
    pub(crate) parser: Arc<dyn Parser>,
    pub(crate) chain_client: Arc<dyn ChainClient>,
    pub(crate) metrics: ServerMetrics,
    pub(crate) mapper: ErrorMapper,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(
        config: Arc<AppConfig>,
        meta: Arc<dyn MetaStorage>,
        blob: Arc<dyn BlobStorage>,
        transaction_storage: Arc<dyn TransactionStorage>,
        parser: Arc<dyn Parser>,
        chain_client: Arc<dyn ChainClient>,
    ) -> Self {
        let metrics = ServerMetrics::new();
        let shutdown = CancellationToken::new();

        Self {
            blocks: BlockResolver::new(Arc::clone(&config), Arc::clone(&meta)),
            transactions: TxResolver::new(
                Arc::clone(&config),
                Arc::clone(&meta),
                transaction_storage,
            ),
            fetcher: PayloadFetcher::new(blob, config.api.num_workers),
            streamer: Arc::new(EventStreamer::new(
                Arc::clone(&config),
                Arc::clone(&meta),
                metrics,
                shutdown.clone(),
            )),
            meta,
            parser,
            chain_client,
            metrics,
            mapper: ErrorMapper::new(metrics),
            shutdown,
            config,
        }
    }

    /// Token observed by every active stream. Cancelled exactly once, at
    /// graceful shutdown; streams then end with a retryable `ABORTED` while
    /// unary calls in flight run to completion.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Recovers the identity attached by the admission layer, falling back
    /// to metadata extraction for direct trait-level calls.
    pub(crate) fn client_context<T>(&self, request: &tonic::Request<T>) -> ClientContext {
        request
            .extensions()
            .get::<ClientContext>()
            .cloned()
            .unwrap_or_else(|| ClientContext::from_metadata(request.metadata()))
    }

    /// Single completion path for unary methods: error mapping, request
    /// counter, debug log.
    pub(crate) fn finish_unary<T>(
        &self,
        method: &'static str,
        ctx: &ClientContext,
        request: &dyn std::fmt::Debug,
        result: Result<T, ServerError>,
    ) -> Result<tonic::Response<T>, Status> {
        let (status_label, out) = match result {
            Ok(response) => (code_label(Code::Ok), Ok(tonic::Response::new(response))),
            Err(err) => {
                let status = self.mapper.map(method, request, err);
                (code_label(status.code()), Err(status))
            }
        };
        self.metrics
            .record_request(FULL_SERVICE_NAME, method, ctx.client_id(), status_label);
        tracing::debug!(method, client_id = ctx.client_id(), status = status_label, "request");
        out
    }

    pub(crate) async fn handle_get_latest_block(
        &self,
        _ctx: &ClientContext,
        req: &GetLatestBlockRequest,
    ) -> Result<GetLatestBlockResponse, ServerError> {
        let block = self.blocks.get_latest(req.tag).await?;
        Ok(GetLatestBlockResponse {
            tag: block.tag,
            hash: block.hash,
            parent_hash: block.parent_hash,
            height: block.height,
            timestamp: block.timestamp,
        })
    }

    pub(crate) async fn handle_get_block_file(
        &self,
        ctx: &ClientContext,
        req: &GetBlockFileRequest,
    ) -> Result<GetBlockFileResponse, ServerError> {
        let meta = self.blocks.get_by_hash(req.tag, req.height, &req.hash).await?;
        let file = self.fetcher.pre_sign_file(&meta).await?;

        self.metrics.record_blocks_served(FORMAT_FILE, ctx.client_id(), 1);
        Ok(GetBlockFileResponse { file: Some(file) })
    }

    pub(crate) async fn handle_get_block_files_by_range(
        &self,
        ctx: &ClientContext,
        req: &GetBlockFilesByRangeRequest,
    ) -> Result<GetBlockFilesByRangeResponse, ServerError> {
        let metas = self
            .blocks
            .get_range(req.tag, req.start_height, req.end_height, self.config.api.max_num_block_files)
            .await?;

        let mut files = Vec::with_capacity(metas.len());
        for meta in &metas {
            files.push(self.fetcher.pre_sign_file(meta).await?);
        }

        self.metrics
            .record_blocks_served(FORMAT_FILE, ctx.client_id(), files.len() as u64);
        Ok(GetBlockFilesByRangeResponse { files })
    }

    pub(crate) async fn handle_get_raw_block(
        &self,
        ctx: &ClientContext,
        req: &GetRawBlockRequest,
    ) -> Result<GetRawBlockResponse, ServerError> {
        let meta = self.blocks.get_by_hash(req.tag, req.height, &req.hash).await?;
        let block = self.fetcher.download_one(&meta).await?;

        self.metrics.record_blocks_served(FORMAT_RAW, ctx.client_id(), 1);
        Ok(GetRawBlockResponse { block: Some(block) })
    }

    pub(crate) async fn handle_get_raw_blocks_by_range(
        &self,
        ctx: &ClientContext,
        req: &GetRawBlocksByRangeRequest,
    ) -> Result<GetRawBlocksByRangeResponse, ServerError> {
        let metas = self
            .blocks
            .get_range(req.tag, req.start_height, req.end_height, self.config.api.max_num_blocks)
            .await?;
        let blocks = self.fetcher.download_many(&metas).await?;

        self.metrics
            .record_blocks_served(FORMAT_RAW, ctx.client_id(), blocks.len() as u64);
        Ok(GetRawBlocksByRangeResponse { blocks })
    }

    pub(crate) async fn handle_get_native_block(
        &self,
        ctx: &ClientContext,
        req: &GetNativeBlockRequest,
    ) -> Result<GetNativeBlockResponse, ServerError> {
        let meta = self.blocks.get_by_hash(req.tag, req.height, &req.hash).await?;
        let raw = self.fetcher.download_one(&meta).await?;
        let block = self.parser.parse_native_block(&raw).await?;

        self.metrics.record_blocks_served(FORMAT_NATIVE, ctx.client_id(), 1);
        Ok(GetNativeBlockResponse { block: Some(block) })
    }

    pub(crate) async fn handle_get_native_blocks_by_range(
        &self,
        ctx: &ClientContext,
        req: &GetNativeBlocksByRangeRequest,
    ) -> Result<GetNativeBlocksByRangeResponse, ServerError> {
        let metas = self
            .blocks
            .get_range(req.tag, req.start_height, req.end_height, self.config.api.max_num_blocks)
            .await?;
        let raws = self.fetcher.download_many(&metas).await?;

        let mut blocks = Vec::with_capacity(raws.len());
        for raw in &raws {
            blocks.push(self.parser.parse_native_block(raw).await?);
        }

        self.metrics
            .record_blocks_served(FORMAT_NATIVE, ctx.client_id(), blocks.len() as u64);
        Ok(GetNativeBlocksByRangeResponse { blocks })
    }

    pub(crate) async fn handle_get_rosetta_block(
        &self,
        ctx: &ClientContext,
        req: &GetRosettaBlockRequest,
    ) -> Result<GetRosettaBlockResponse, ServerError> {
        // Without a Rosetta parser there is no point fetching the payload.
        if !self.config.chain.feature.rosetta_parser {
            return Err(ParserError::NotImplemented.into());
        }

        let meta = self.blocks.get_by_hash(req.tag, req.height, &req.hash).await?;
        let raw = self.fetcher.download_one(&meta).await?;
        let block = self.parser.parse_rosetta_block(&raw).await?;

        self.metrics.record_blocks_served(FORMAT_ROSETTA, ctx.client_id(), 1);
        Ok(GetRosettaBlockResponse { block: Some(block) })
    }

    pub(crate) async fn handle_get_rosetta_blocks_by_range(
        &self,
        ctx: &ClientContext,
        req: &GetRosettaBlocksByRangeRequest,
    ) -> Result<GetRosettaBlocksByRangeResponse, ServerError> {
        if !self.config.chain.feature.rosetta_parser {
            return Err(ParserError::NotImplemented.into());
        }

        let metas = self
            .blocks
            .get_range(req.tag, req.start_height, req.end_height, self.config.api.max_num_blocks)
            .await?;
        let raws = self.fetcher.download_many(&metas).await?;

        let mut blocks = Vec::with_capacity(raws.len());
        for raw in &raws {
            blocks.push(self.parser.parse_rosetta_block(raw).await?);
        }

        self.metrics
            .record_blocks_served(FORMAT_ROSETTA, ctx.client_id(), blocks.len() as u64);
        Ok(GetRosettaBlocksByRangeResponse { blocks })
    }

    pub(crate) async fn handle_get_block_by_transaction(
        &self,
        ctx: &ClientContext,
        req: &GetBlockByTransactionRequest,
    ) -> Result<GetBlockByTransactionResponse, ServerError> {
        if !self.config.chain.feature.transaction_indexing {
            return Err(ServerError::NotImplemented);
        }

        let blocks = self
            .transactions
            .resolve_blocks(req.tag, &req.transaction_hash)
            .await?;

        let results = blocks
            .into_iter()
            .map(|block| BlockIdentifier {
                tag: block.tag,
                hash: block.hash,
                height: block.height,
                skipped: block.skipped,
                timestamp: block.timestamp,
            })
            .collect();

        self.metrics.record_transactions_served(FORMAT_RAW, ctx.client_id(), 1);
        Ok(GetBlockByTransactionResponse { blocks: results })
    }

    pub(crate) async fn handle_get_native_transaction(
        &self,
        ctx: &ClientContext,
        req: &GetNativeTransactionRequest,
    ) -> Result<GetNativeTransactionResponse, ServerError> {
        if !self.config.chain.feature.transaction_indexing {
            return Err(ServerError::NotImplemented);
        }

        let blocks = self
            .transactions
            .resolve_blocks(req.tag, &req.transaction_hash)
            .await?;
        let raws = self.fetcher.download_many(&blocks).await?;

        let mut transactions = Vec::with_capacity(raws.len());
        for raw in &raws {
            let native = self.parser.parse_native_block(raw).await?;
            let transaction = self
                .parser
                .get_native_transaction(&native, &req.transaction_hash)
                .await?;
            transactions.push(transaction);
        }

        self.metrics
            .record_transactions_served(FORMAT_NATIVE, ctx.client_id(), 1);
        Ok(GetNativeTransactionResponse { transactions })
    }

    pub(crate) async fn handle_get_verified_account_state(
        &self,
        ctx: &ClientContext,
        req: &GetVerifiedAccountStateRequest,
    ) -> Result<GetVerifiedAccountStateResponse, ServerError> {
        if !self.config.chain.feature.verified_account_state {
            return Err(ServerError::NotImplemented);
        }

        let query = req
            .req
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("account state query is required"))?;

        let meta = self
            .blocks
            .get_by_hash(query.tag, query.height, &query.hash)
            .await?;
        let raw = self.fetcher.download_one(&meta).await?;
        let block = self.parser.parse_native_block(&raw).await?;

        let proof = self.chain_client.get_account_proof(query).await?;

        let state = self
            .parser
            .validate_account_state(ValidateAccountStateInput {
                query: query.clone(),
                block,
                proof,
            })
            .await?;

        self.metrics.record_account_state_served(ctx.client_id(), 1);
        Ok(GetVerifiedAccountStateResponse { response: Some(state) })
    }

    pub(crate) async fn handle_get_chain_events(
        &self,
        ctx: &ClientContext,
        req: &GetChainEventsRequest,
    ) -> Result<GetChainEventsResponse, ServerError> {
        let max_num_events = if req.max_num_events == 0 { 1 } else { req.max_num_events };
        let event_tag = self.config.effective_event_tag(req.event_tag);

        let cursor = self.streamer.resolve_cursor(req, event_tag).await?;
        let entries = self
            .meta
            .get_events_after_event_id(event_tag, cursor, max_num_events)
            .await?;

        let mut num_added: u64 = 0;
        let mut num_removed: u64 = 0;
        let events = entries
            .iter()
            .map(|entry| {
                match entry.event_type {
                    EventType::BlockAdded => num_added += 1,
                    EventType::BlockRemoved => num_removed += 1,
                    EventType::Unknown => {}
                }
                event_to_wire(entry)
            })
            .collect();

        if num_added > 0 {
            self.metrics.record_events_served(
                EVENT_TYPE_BLOCK_ADDED,
                ctx.client_id(),
                event_tag,
                num_added,
            );
        }
        if num_removed > 0 {
            self.metrics.record_events_served(
                EVENT_TYPE_BLOCK_REMOVED,
                ctx.client_id(),
                event_tag,
                num_removed,
            );
        }

        Ok(GetChainEventsResponse { events })
    }

    pub(crate) async fn handle_get_versioned_chain_event(
        &self,
        _ctx: &ClientContext,
        req: &GetVersionedChainEventRequest,
    ) -> Result<GetVersionedChainEventResponse, ServerError> {
        let from_event_id = if req.from_sequence.is_empty() {
            req.from_sequence_num
        } else {
            decode_sequence(&req.from_sequence).map_err(|err| {
                Status::invalid_argument(format!(
                    "invalid sequence: failed to decode {:?} to an event id: {err}",
                    req.from_sequence
                ))
            })?
        };

        let from_event = self
            .meta
            .get_event_by_event_id(req.from_event_tag, from_event_id)
            .await?;
        let candidates = self
            .meta
            .get_events_by_block_height(req.to_event_tag, from_event.block_height)
            .await?;

        // The same logical event can appear repeatedly in the target
        // namespace (e.g. +h -h +h); take the newest match.
        let matched = candidates
            .into_iter()
            .filter(|candidate| {
                candidate.block_hash == from_event.block_hash
                    && candidate.parent_hash == from_event.parent_hash
                    && candidate.event_type == from_event.event_type
                    && candidate.block_skipped == from_event.block_skipped
                    && candidate.block_tag == from_event.block_tag
            })
            .max_by_key(|candidate| candidate.event_id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "cannot find matching event for from_event_tag={}, to_event_tag={}, \
                     sequence={from_event_id}; please use another event",
                    req.from_event_tag,
                    req.to_event_tag,
                )
            })?;

        Ok(GetVersionedChainEventResponse { event: Some(event_to_wire(&matched)) })
    }

    pub(crate) async fn handle_get_chain_metadata(
        &self,
        _ctx: &ClientContext,
        _req: &GetChainMetadataRequest,
    ) -> Result<GetChainMetadataResponse, ServerError> {
        Ok(GetChainMetadataResponse {
            latest_block_tag: self.config.chain.latest_block_tag,
            stable_block_tag: self.config.chain.stable_block_tag,
            latest_event_tag: self.config.chain.latest_event_tag,
            stable_event_tag: self.config.chain.stable_event_tag,
        })
    }
}
