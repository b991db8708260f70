//! Admission control in front of the gRPC service.
//!
//! The layer runs once per request, before any handler: it derives the
//! service and method from the request path, attaches the sanitized client
//! identity to the request extensions, and charges the method's RCU weight
//! against the caller's token bucket. Rejections answer `RESOURCE_EXHAUSTED`
//! without invoking the handler.
//!
//! Methods of foreign services registered on the same port (reflection,
//! health) pass through untouched.

use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use futures::future::{self, Either, Ready};
use regex::Regex;
use tonic::codegen::empty_body;
use tower::{Layer, Service};

use chainlake_core::api::FULL_SERVICE_NAME;
use chainlake_core::auth::{resolve_client, AuthClients, ClientContext};
use chainlake_core::errors::code_label;
use chainlake_core::metrics::ServerMetrics;
use chainlake_core::middleware::Throttler;

/// RCU weight charged for a method. Everything unlisted costs 1.
pub fn rcu_for_method(method: &str) -> u32 {
    match method {
        "GetRawBlock"
        | "GetNativeBlock"
        | "GetRosettaBlock"
        | "GetNativeTransaction"
        | "GetVerifiedAccountState" => 10,
        "GetRawBlocksByRange" | "GetNativeBlocksByRange" | "GetRosettaBlocksByRange" => 50,
        _ => 1,
    }
}

static METHOD_REGEX: OnceLock<Regex> = OnceLock::new();

/// Splits a full method path like `/chainlake.ChainLake/GetRawBlock` into
/// `(service, method)`. Paths that do not match yield an empty service.
pub fn split_full_method(path: &str) -> (&str, &str) {
    let regex = METHOD_REGEX.get_or_init(|| Regex::new(r"/(.+)/(.+)$").expect("valid regex"));
    match regex.captures(path) {
        Some(captures) => {
            let service = captures.get(1).map_or("", |capture| capture.as_str());
            let method = captures.get(2).map_or("", |capture| capture.as_str());
            (service, method)
        }
        None => ("", path),
    }
}

#[derive(Clone)]
pub struct AdmissionLayer {
    throttler: Arc<Throttler>,
    auth_clients: Arc<AuthClients>,
    metrics: ServerMetrics,
}

impl AdmissionLayer {
    pub fn new(
        throttler: Arc<Throttler>,
        auth_clients: Arc<AuthClients>,
        metrics: ServerMetrics,
    ) -> Self {
        Self { throttler, auth_clients, metrics }
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = Admission<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Admission {
            inner,
            throttler: Arc::clone(&self.throttler),
            auth_clients: Arc::clone(&self.auth_clients),
            metrics: self.metrics,
        }
    }
}

#[derive(Clone)]
pub struct Admission<S> {
    inner: S,
    throttler: Arc<Throttler>,
    auth_clients: Arc<AuthClients>,
    metrics: ServerMetrics,
}

impl<S, B> Service<http::Request<B>> for Admission<S>
where
    S: Service<http::Request<B>, Response = http::Response<tonic::body::BoxBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Either<S::Future, Ready<Result<Self::Response, Self::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        let (service, method) = split_full_method(req.uri().path());
        if service != FULL_SERVICE_NAME {
            return Either::Left(self.inner.call(req));
        }

        let client = resolve_client(req.headers(), &self.auth_clients);
        let rcu = rcu_for_method(method);

        if !self.throttler.allow_n(&client, rcu) {
            tracing::warn!(client_id = %client.client_id, method, rcu, "rate limit exceeded");
            self.metrics.record_request(
                service,
                method,
                &client.client_id,
                code_label(tonic::Code::ResourceExhausted),
            );
            return Either::Right(future::ready(Ok(throttled_response())));
        }

        req.extensions_mut().insert(ClientContext::new(client.client_id));
        Either::Left(self.inner.call(req))
    }
}

/// Trailers-only gRPC response carrying `RESOURCE_EXHAUSTED`.
fn throttled_response() -> http::Response<tonic::body::BoxBody> {
    http::Response::builder()
        .status(200)
        .header("content-type", "application/grpc")
        .header("grpc-status", tonic::Code::ResourceExhausted as i32)
        .header("grpc-message", "rate limit exceeded")
        .body(empty_body())
        .expect("static response")
}
