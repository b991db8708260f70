//! Dispatch of the `ChainLake` service trait onto the handlers.
//!
//! Every unary method runs the same shape: recover the client context,
//! invoke the handler, and push the outcome through `finish_unary` so the
//! error mapper and the request counter see every completion. The stream
//! method spawns its delivery loop and reports its terminal status when the
//! loop ends.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Code, Request, Response, Status};

use chainlake_core::api::chain_lake_server::ChainLake;
use chainlake_core::api::{
    ChainEventsRequest, ChainEventsResponse, GetBlockByTransactionRequest,
    GetBlockByTransactionResponse, GetBlockFileRequest, GetBlockFileResponse,
    GetBlockFilesByRangeRequest, GetBlockFilesByRangeResponse, GetChainEventsRequest,
    GetChainEventsResponse, GetChainMetadataRequest, GetChainMetadataResponse,
    GetLatestBlockRequest, GetLatestBlockResponse, GetNativeBlockRequest,
    GetNativeBlockResponse, GetNativeBlocksByRangeRequest, GetNativeBlocksByRangeResponse,
    GetNativeTransactionRequest, GetNativeTransactionResponse, GetRawBlockRequest,
    GetRawBlockResponse, GetRawBlocksByRangeRequest, GetRawBlocksByRangeResponse,
    GetRosettaBlockRequest, GetRosettaBlockResponse, GetRosettaBlocksByRangeRequest,
    GetRosettaBlocksByRangeResponse, GetVerifiedAccountStateRequest,
    GetVerifiedAccountStateResponse, GetVersionedChainEventRequest,
    GetVersionedChainEventResponse, FULL_SERVICE_NAME,
};
use chainlake_core::errors::code_label;

use crate::handler::Server;

const STREAM_CHANNEL_CAPACITY: usize = 64;

#[tonic::async_trait]
impl ChainLake for Server {
    async fn get_latest_block(
        &self,
        request: Request<GetLatestBlockRequest>,
    ) -> Result<Response<GetLatestBlockResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_latest_block(&ctx, &req).await;
        self.finish_unary("GetLatestBlock", &ctx, &req, result)
    }

    async fn get_block_file(
        &self,
        request: Request<GetBlockFileRequest>,
    ) -> Result<Response<GetBlockFileResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_block_file(&ctx, &req).await;
        self.finish_unary("GetBlockFile", &ctx, &req, result)
    }

    async fn get_block_files_by_range(
        &self,
        request: Request<GetBlockFilesByRangeRequest>,
    ) -> Result<Response<GetBlockFilesByRangeResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_block_files_by_range(&ctx, &req).await;
        self.finish_unary("GetBlockFilesByRange", &ctx, &req, result)
    }

    async fn get_raw_block(
        &self,
        request: Request<GetRawBlockRequest>,
    ) -> Result<Response<GetRawBlockResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_raw_block(&ctx, &req).await;
        self.finish_unary("GetRawBlock", &ctx, &req, result)
    }

    async fn get_raw_blocks_by_range(
        &self,
        request: Request<GetRawBlocksByRangeRequest>,
    ) -> Result<Response<GetRawBlocksByRangeResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_raw_blocks_by_range(&ctx, &req).await;
        self.finish_unary("GetRawBlocksByRange", &ctx, &req, result)
    }

    async fn get_native_block(
        &self,
        request: Request<GetNativeBlockRequest>,
    ) -> Result<Response<GetNativeBlockResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_native_block(&ctx, &req).await;
        self.finish_unary("GetNativeBlock", &ctx, &req, result)
    }

    async fn get_native_blocks_by_range(
        &self,
        request: Request<GetNativeBlocksByRangeRequest>,
    ) -> Result<Response<GetNativeBlocksByRangeResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_native_blocks_by_range(&ctx, &req).await;
        self.finish_unary("GetNativeBlocksByRange", &ctx, &req, result)
    }

    async fn get_rosetta_block(
        &self,
        request: Request<GetRosettaBlockRequest>,
    ) -> Result<Response<GetRosettaBlockResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_rosetta_block(&ctx, &req).await;
        self.finish_unary("GetRosettaBlock", &ctx, &req, result)
    }

    async fn get_rosetta_blocks_by_range(
        &self,
        request: Request<GetRosettaBlocksByRangeRequest>,
    ) -> Result<Response<GetRosettaBlocksByRangeResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_rosetta_blocks_by_range(&ctx, &req).await;
        self.finish_unary("GetRosettaBlocksByRange", &ctx, &req, result)
    }

    async fn get_block_by_transaction(
        &self,
        request: Request<GetBlockByTransactionRequest>,
    ) -> Result<Response<GetBlockByTransactionResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_block_by_transaction(&ctx, &req).await;
        self.finish_unary("GetBlockByTransaction", &ctx, &req, result)
    }

    async fn get_native_transaction(
        &self,
        request: Request<GetNativeTransactionRequest>,
    ) -> Result<Response<GetNativeTransactionResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_native_transaction(&ctx, &req).await;
        self.finish_unary("GetNativeTransaction", &ctx, &req, result)
    }

    async fn get_verified_account_state(
        &self,
        request: Request<GetVerifiedAccountStateRequest>,
    ) -> Result<Response<GetVerifiedAccountStateResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_verified_account_state(&ctx, &req).await;
        self.finish_unary("GetVerifiedAccountState", &ctx, &req, result)
    }

    type StreamChainEventsStream = ReceiverStream<Result<ChainEventsResponse, Status>>;

    async fn stream_chain_events(
        &self,
        request: Request<ChainEventsRequest>,
    ) -> Result<Response<Self::StreamChainEventsStream>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let event_tag = self.config.effective_event_tag(req.event_tag);

        // Cursor problems fail the call before the stream opens.
        let cursor = match self.streamer.resolve_cursor(&req, event_tag).await {
            Ok(cursor) => cursor,
            Err(err) => {
                let status = self.mapper.map("StreamChainEvents", &req, err);
                self.metrics.record_request(
                    FULL_SERVICE_NAME,
                    "StreamChainEvents",
                    ctx.client_id(),
                    code_label(status.code()),
                );
                return Err(status);
            }
        };

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let streamer = Arc::clone(&self.streamer);
        let metrics = self.metrics;
        let mapper = self.mapper;
        let client_id = ctx.client_id().to_string();

        tokio::spawn(async move {
            let result = streamer.run(event_tag, cursor, &client_id, tx.clone()).await;
            let status_label = match result {
                Ok(()) => code_label(Code::Ok),
                Err(err) => {
                    let status = mapper.map("StreamChainEvents", &"(stream)", err);
                    let label = code_label(status.code());
                    // Best effort: the subscriber may already be gone.
                    let _ = tx.send(Err(status)).await;
                    label
                }
            };
            metrics.record_request(FULL_SERVICE_NAME, "StreamChainEvents", &client_id, status_label);
            tracing::debug!(
                method = "StreamChainEvents",
                client_id = %client_id,
                status = status_label,
                "stream ended"
            );
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn get_chain_events(
        &self,
        request: Request<GetChainEventsRequest>,
    ) -> Result<Response<GetChainEventsResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_chain_events(&ctx, &req).await;
        self.finish_unary("GetChainEvents", &ctx, &req, result)
    }

    async fn get_versioned_chain_event(
        &self,
        request: Request<GetVersionedChainEventRequest>,
    ) -> Result<Response<GetVersionedChainEventResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_versioned_chain_event(&ctx, &req).await;
        self.finish_unary("GetVersionedChainEvent", &ctx, &req, result)
    }

    async fn get_chain_metadata(
        &self,
        request: Request<GetChainMetadataRequest>,
    ) -> Result<Response<GetChainMetadataResponse>, Status> {
        let ctx = self.client_context(&request);
        let req = request.into_inner();
        let result = self.handle_get_chain_metadata(&ctx, &req).await;
        self.finish_unary("GetChainMetadata", &ctx, &req, result)
    }
}
