use thiserror::Error;

/// Failure modes surfaced by the metadata index, the transaction index and
/// the payload object store.
///
/// The serving tier never writes, so every variant describes a read path.
/// The boundary error mapper translates these into RPC status codes; see
/// [`crate::errors`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested block, event or transaction does not exist.
    #[error("item not found")]
    ItemNotFound,

    /// The event log has no entries for the requested event tag, or the
    /// requested range was compacted away by ingestion.
    #[error("no event history")]
    NoEventHistory,

    /// The supplied event id is outside the representable range.
    #[error("invalid event id")]
    InvalidEventId,

    /// A height range reaches past what the index can serve.
    #[error("out of range")]
    OutOfRange,

    /// A height that can never exist (e.g. before the chain genesis).
    #[error("invalid height")]
    InvalidHeight,

    /// The caller went away while the storage call was in flight.
    #[error("request canceled")]
    RequestCanceled,

    /// The storage call exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    #[error("storage failure")]
    Internal(#[from] anyhow::Error),
}
