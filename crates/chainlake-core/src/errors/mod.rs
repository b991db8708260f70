//! Internal error taxonomy and the boundary mapping to RPC status codes.
//!
//! Handlers raise typed kinds and wrap them with context; [`ErrorMapper`] is
//! the single place that converts to a wire status, increments the error
//! counter and logs at the level the code deserves. Client cancellation and
//! idle timeouts are not errors to operators, so they log at info.

use thiserror::Error;
use tonic::{Code, Status};

use crate::client::ClientError;
use crate::metrics::ServerMetrics;
use crate::parser::ParserError;
use crate::storage::StorageError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// Already classified at the raise site (e.g. argument validation, the
    /// range watermark check); carried through unchanged.
    #[error(transparent)]
    Rpc(#[from] Status),

    #[error("handler method not implemented")]
    NotImplemented,

    #[error("server is shutting down")]
    ShuttingDown,

    #[error("there was no new event for quite a while")]
    NoEventForTooLong,

    /// Unclassified handler failure; surfaces as `INTERNAL`.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Stable label for a status code, used on metrics and in logs.
pub fn code_label(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
    }
}

fn classify(err: &ServerError) -> (Code, &'static str) {
    match err {
        ServerError::Rpc(status) => (status.code(), "pre-classified"),
        ServerError::Storage(StorageError::ItemNotFound) => (Code::NotFound, "block not found"),
        ServerError::Storage(StorageError::NoEventHistory) => {
            (Code::InvalidArgument, "no event history available")
        }
        ServerError::Storage(StorageError::InvalidEventId) => {
            (Code::InvalidArgument, "invalid event id")
        }
        ServerError::Storage(StorageError::OutOfRange | StorageError::InvalidHeight) => {
            (Code::InvalidArgument, "invalid height or out of range")
        }
        ServerError::Storage(StorageError::RequestCanceled) => {
            (Code::Cancelled, "storage request canceled")
        }
        ServerError::Storage(StorageError::Timeout) => {
            (Code::DeadlineExceeded, "context deadline exceeded")
        }
        ServerError::Parser(ParserError::InvalidChain) => {
            (Code::FailedPrecondition, "invalid chain")
        }
        ServerError::Parser(ParserError::InvalidParameters) => {
            (Code::InvalidArgument, "invalid parser input parameters")
        }
        ServerError::Parser(ParserError::NotImplemented) => {
            (Code::Unimplemented, "parser method not implemented")
        }
        ServerError::NotImplemented => (Code::Unimplemented, "handler method not implemented"),
        ServerError::ShuttingDown | ServerError::NoEventForTooLong => {
            (Code::Aborted, "please retry after a moment")
        }
        ServerError::Storage(StorageError::Internal(_))
        | ServerError::Parser(ParserError::Internal(_))
        | ServerError::Client(_)
        | ServerError::Internal(_) => (Code::Internal, "internal error"),
    }
}

fn log_level(code: Code) -> tracing::Level {
    match code {
        Code::Internal => tracing::Level::ERROR,
        Code::Cancelled
        | Code::FailedPrecondition
        | Code::InvalidArgument
        | Code::NotFound
        | Code::Unimplemented
        | Code::Aborted => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    }
}

/// Boundary converter from [`ServerError`] to a wire [`Status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    metrics: ServerMetrics,
}

impl ErrorMapper {
    pub fn new(metrics: ServerMetrics) -> Self {
        Self { metrics }
    }

    /// Maps the error, emitting the `error{method, status}` counter and one
    /// log record. Pre-classified statuses keep their message verbatim so
    /// clients can match on e.g. the watermark text.
    pub fn map(&self, method: &str, request: &dyn std::fmt::Debug, err: ServerError) -> Status {
        let (code, description) = classify(&err);
        let status_label = code_label(code);
        self.metrics.record_error(method, status_label);

        match log_level(code) {
            tracing::Level::ERROR => tracing::error!(
                method,
                status = status_label,
                description,
                request = ?request,
                error = %err,
                "server error"
            ),
            tracing::Level::WARN => tracing::warn!(
                method,
                status = status_label,
                description,
                request = ?request,
                error = %err,
                "server error"
            ),
            _ => tracing::info!(
                method,
                status = status_label,
                description,
                request = ?request,
                error = %err,
                "server error"
            ),
        }

        match err {
            ServerError::Rpc(status) => status,
            other => Status::new(code, format!("{description}: {other}")),
        }
    }
}
