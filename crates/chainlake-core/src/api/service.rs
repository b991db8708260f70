//! Service trait and transport glue for `chainlake.ChainLake`.
//!
//! The dispatch below is hand-maintained rather than emitted by a build
//! script so the crate builds without a protoc toolchain; it follows the
//! standard tonic server shape (`Grpc` + `ProstCodec` per method arm).

pub mod chain_lake_server {
    use std::sync::Arc;

    use tonic::codegen::*;

    use crate::api::*;

    /// The read surface of the data lake.
    #[tonic::async_trait]
    pub trait ChainLake: Send + Sync + 'static {
        async fn get_latest_block(
            &self,
            request: tonic::Request<GetLatestBlockRequest>,
        ) -> Result<tonic::Response<GetLatestBlockResponse>, tonic::Status>;

        async fn get_block_file(
            &self,
            request: tonic::Request<GetBlockFileRequest>,
        ) -> Result<tonic::Response<GetBlockFileResponse>, tonic::Status>;

        async fn get_block_files_by_range(
            &self,
            request: tonic::Request<GetBlockFilesByRangeRequest>,
        ) -> Result<tonic::Response<GetBlockFilesByRangeResponse>, tonic::Status>;

        async fn get_raw_block(
            &self,
            request: tonic::Request<GetRawBlockRequest>,
        ) -> Result<tonic::Response<GetRawBlockResponse>, tonic::Status>;

        async fn get_raw_blocks_by_range(
            &self,
            request: tonic::Request<GetRawBlocksByRangeRequest>,
        ) -> Result<tonic::Response<GetRawBlocksByRangeResponse>, tonic::Status>;

        async fn get_native_block(
            &self,
            request: tonic::Request<GetNativeBlockRequest>,
        ) -> Result<tonic::Response<GetNativeBlockResponse>, tonic::Status>;

        async fn get_native_blocks_by_range(
            &self,
            request: tonic::Request<GetNativeBlocksByRangeRequest>,
        ) -> Result<tonic::Response<GetNativeBlocksByRangeResponse>, tonic::Status>;

        async fn get_rosetta_block(
            &self,
            request: tonic::Request<GetRosettaBlockRequest>,
        ) -> Result<tonic::Response<GetRosettaBlockResponse>, tonic::Status>;

        async fn get_rosetta_blocks_by_range(
            &self,
            request: tonic::Request<GetRosettaBlocksByRangeRequest>,
        ) -> Result<tonic::Response<GetRosettaBlocksByRangeResponse>, tonic::Status>;

        async fn get_block_by_transaction(
            &self,
            request: tonic::Request<GetBlockByTransactionRequest>,
        ) -> Result<tonic::Response<GetBlockByTransactionResponse>, tonic::Status>;

        async fn get_native_transaction(
            &self,
            request: tonic::Request<GetNativeTransactionRequest>,
        ) -> Result<tonic::Response<GetNativeTransactionResponse>, tonic::Status>;

        async fn get_verified_account_state(
            &self,
            request: tonic::Request<GetVerifiedAccountStateRequest>,
        ) -> Result<tonic::Response<GetVerifiedAccountStateResponse>, tonic::Status>;

        /// Server streaming response type for the `StreamChainEvents` method.
        type StreamChainEventsStream: tokio_stream::Stream<Item = Result<ChainEventsResponse, tonic::Status>>
            + Send
            + 'static;

        async fn stream_chain_events(
            &self,
            request: tonic::Request<ChainEventsRequest>,
        ) -> Result<tonic::Response<Self::StreamChainEventsStream>, tonic::Status>;

        async fn get_chain_events(
            &self,
            request: tonic::Request<GetChainEventsRequest>,
        ) -> Result<tonic::Response<GetChainEventsResponse>, tonic::Status>;

        async fn get_versioned_chain_event(
            &self,
            request: tonic::Request<GetVersionedChainEventRequest>,
        ) -> Result<tonic::Response<GetVersionedChainEventResponse>, tonic::Status>;

        async fn get_chain_metadata(
            &self,
            request: tonic::Request<GetChainMetadataRequest>,
        ) -> Result<tonic::Response<GetChainMetadataResponse>, tonic::Status>;
    }

    /// Tower service routing gRPC requests to a [`ChainLake`] implementation.
    #[derive(Debug)]
    pub struct ChainLakeServer<T> {
        inner: Arc<T>,
    }

    impl<T> ChainLakeServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T> Clone for ChainLakeServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    macro_rules! unary {
        ($inner:ident, $req:ident, $handler:ident, $request:ty, $response:ty) => {{
            struct Svc<T>(Arc<T>);
            impl<T: ChainLake> tonic::server::UnaryService<$request> for Svc<T> {
                type Response = $response;
                type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

                fn call(&mut self, request: tonic::Request<$request>) -> Self::Future {
                    let inner = Arc::clone(&self.0);
                    Box::pin(async move { inner.$handler(request).await })
                }
            }
            Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                Ok(grpc.unary(Svc($inner), $req).await)
            })
        }};
    }

    impl<T, B> Service<http::Request<B>> for ChainLakeServer<T>
    where
        T: ChainLake,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = Arc::clone(&self.inner);
            match req.uri().path() {
                "/chainlake.ChainLake/GetLatestBlock" => unary!(
                    inner,
                    req,
                    get_latest_block,
                    GetLatestBlockRequest,
                    GetLatestBlockResponse
                ),
                "/chainlake.ChainLake/GetBlockFile" => {
                    unary!(inner, req, get_block_file, GetBlockFileRequest, GetBlockFileResponse)
                }
                "/chainlake.ChainLake/GetBlockFilesByRange" => unary!(
                    inner,
                    req,
                    get_block_files_by_range,
                    GetBlockFilesByRangeRequest,
                    GetBlockFilesByRangeResponse
                ),
                "/chainlake.ChainLake/GetRawBlock" => {
                    unary!(inner, req, get_raw_block, GetRawBlockRequest, GetRawBlockResponse)
                }
                "/chainlake.ChainLake/GetRawBlocksByRange" => unary!(
                    inner,
                    req,
                    get_raw_blocks_by_range,
                    GetRawBlocksByRangeRequest,
                    GetRawBlocksByRangeResponse
                ),
                "/chainlake.ChainLake/GetNativeBlock" => unary!(
                    inner,
                    req,
                    get_native_block,
                    GetNativeBlockRequest,
                    GetNativeBlockResponse
                ),
                "/chainlake.ChainLake/GetNativeBlocksByRange" => unary!(
                    inner,
                    req,
                    get_native_blocks_by_range,
                    GetNativeBlocksByRangeRequest,
                    GetNativeBlocksByRangeResponse
                ),
                "/chainlake.ChainLake/GetRosettaBlock" => unary!(
                    inner,
                    req,
                    get_rosetta_block,
                    GetRosettaBlockRequest,
                    GetRosettaBlockResponse
                ),
                "/chainlake.ChainLake/GetRosettaBlocksByRange" => unary!(
                    inner,
                    req,
                    get_rosetta_blocks_by_range,
                    GetRosettaBlocksByRangeRequest,
                    GetRosettaBlocksByRangeResponse
                ),
                "/chainlake.ChainLake/GetBlockByTransaction" => unary!(
                    inner,
                    req,
                    get_block_by_transaction,
                    GetBlockByTransactionRequest,
                    GetBlockByTransactionResponse
                ),
                "/chainlake.ChainLake/GetNativeTransaction" => unary!(
                    inner,
                    req,
                    get_native_transaction,
                    GetNativeTransactionRequest,
                    GetNativeTransactionResponse
                ),
                "/chainlake.ChainLake/GetVerifiedAccountState" => unary!(
                    inner,
                    req,
                    get_verified_account_state,
                    GetVerifiedAccountStateRequest,
                    GetVerifiedAccountStateResponse
                ),
                "/chainlake.ChainLake/StreamChainEvents" => {
                    struct Svc<T>(Arc<T>);
                    impl<T: ChainLake> tonic::server::ServerStreamingService<ChainEventsRequest>
                        for Svc<T>
                    {
                        type Response = ChainEventsResponse;
                        type ResponseStream = T::StreamChainEventsStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;

                        fn call(
                            &mut self,
                            request: tonic::Request<ChainEventsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.stream_chain_events(request).await })
                        }
                    }
                    Box::pin(async move {
                        let mut grpc =
                            tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                        Ok(grpc.server_streaming(Svc(inner), req).await)
                    })
                }
                "/chainlake.ChainLake/GetChainEvents" => unary!(
                    inner,
                    req,
                    get_chain_events,
                    GetChainEventsRequest,
                    GetChainEventsResponse
                ),
                "/chainlake.ChainLake/GetVersionedChainEvent" => unary!(
                    inner,
                    req,
                    get_versioned_chain_event,
                    GetVersionedChainEventRequest,
                    GetVersionedChainEventResponse
                ),
                "/chainlake.ChainLake/GetChainMetadata" => unary!(
                    inner,
                    req,
                    get_chain_metadata,
                    GetChainMetadataRequest,
                    GetChainMetadataResponse
                ),
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", tonic::Code::Unimplemented as i32)
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T> tonic::server::NamedService for ChainLakeServer<T> {
        const NAME: &'static str = crate::api::FULL_SERVICE_NAME;
    }
}
