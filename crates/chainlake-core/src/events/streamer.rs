//! The long-lived event delivery loop.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::api::{
    ChainEventsResponse, EventType, INITIAL_POSITION_EARLIEST, INITIAL_POSITION_LATEST,
};
use crate::config::AppConfig;
use crate::errors::ServerError;
use crate::metrics::{ServerMetrics, EVENT_TYPE_BLOCK_ADDED, EVENT_TYPE_BLOCK_REMOVED};
use crate::storage::{MetaStorage, EVENT_ID_START};

use super::cursor::{decode_sequence, EventCursor};
use super::event_to_wire;

/// Delay before the next poll right after a non-empty batch.
const SHORT_WAIT: Duration = Duration::from_millis(10);

const BACKOFF_MULTIPLIER: f64 = 1.5;
const BACKOFF_MAX_INTERVAL: Duration = Duration::from_secs(60);
const BACKOFF_RANDOMIZATION_FACTOR: f64 = 0.5;

/// Delivers the monotonic event log to one subscriber at a time.
///
/// Sessions are stateless on the server side: the cursor arrives with the
/// request and the only session variable is the last event id sent, which
/// dies with the call. Idle streams back off exponentially between polls and
/// are aborted once the index stays quiet for the configured maximum, so
/// load balancers can move long-lived subscribers off draining hosts.
pub struct EventStreamer {
    config: Arc<AppConfig>,
    meta: Arc<dyn MetaStorage>,
    metrics: ServerMetrics,
    shutdown: CancellationToken,
}

impl EventStreamer {
    pub fn new(
        config: Arc<AppConfig>,
        meta: Arc<dyn MetaStorage>,
        metrics: ServerMetrics,
        shutdown: CancellationToken,
    ) -> Self {
        Self { config, meta, metrics, shutdown }
    }

    /// Resolves the caller-supplied cursor fields into the id to start
    /// delivery *after*, per the priority order: legacy `sequence`, then
    /// `initial_position_in_stream`, then `sequence_num`.
    pub async fn resolve_cursor(
        &self,
        request: &dyn EventCursor,
        event_tag: u32,
    ) -> Result<i64, ServerError> {
        let latest_event_tag = self.config.chain.latest_event_tag;
        if event_tag > latest_event_tag {
            return Err(Status::invalid_argument(format!(
                "unsupported event tag {event_tag}: latest event tag is {latest_event_tag}"
            ))
            .into());
        }

        let sequence = request.sequence();
        if !sequence.is_empty() {
            let event_id = decode_sequence(sequence).map_err(|err| {
                Status::invalid_argument(format!(
                    "invalid sequence: failed to decode {sequence:?} to an event id: {err}"
                ))
            })?;
            return Ok(event_id);
        }

        let initial_position = request.initial_position();
        if !initial_position.is_empty() {
            return match initial_position {
                INITIAL_POSITION_LATEST => {
                    // Tail from now: pretend the newest event was already sent.
                    Ok(self.meta.get_max_event_id(event_tag).await? - 1)
                }
                INITIAL_POSITION_EARLIEST => Ok(EVENT_ID_START - 1),
                height => {
                    let height: u64 = height.parse().map_err(|err| {
                        Status::invalid_argument(format!(
                            "invalid initial position in stream {height:?}: {err}"
                        ))
                    })?;
                    let event_id = self
                        .meta
                        .get_first_event_id_by_block_height(event_tag, height)
                        .await?;
                    Ok(event_id - 1)
                }
            };
        }

        Ok(request.sequence_num())
    }

    /// Runs the delivery loop until the subscriber goes away (clean return),
    /// the server shuts down, or the log stays idle past the configured
    /// maximum (both retryable errors).
    pub async fn run(
        &self,
        event_tag: u32,
        mut last_sent_event_id: i64,
        client_id: &str,
        tx: mpsc::Sender<Result<ChainEventsResponse, Status>>,
    ) -> Result<(), ServerError> {
        let batch_size = self.config.api.streaming_batch_size;
        let mut backoff = self.new_backoff();

        loop {
            let events = self
                .meta
                .get_events_after_event_id(event_tag, last_sent_event_id, batch_size)
                .await?;

            let wait = if events.is_empty() {
                match backoff.next_backoff() {
                    Some(wait) => wait,
                    None => return Err(ServerError::NoEventForTooLong),
                }
            } else {
                backoff.reset();
                SHORT_WAIT
            };

            for event in &events {
                let response = ChainEventsResponse { event: Some(event_to_wire(event)) };
                if tx.send(Ok(response)).await.is_err() {
                    // The subscriber's transport is closing.
                    tracing::debug!(client_id, "subscriber went away, closing stream");
                    return Ok(());
                }

                match event.event_type {
                    EventType::BlockAdded => self.metrics.record_events_served(
                        EVENT_TYPE_BLOCK_ADDED,
                        client_id,
                        event_tag,
                        1,
                    ),
                    EventType::BlockRemoved => self.metrics.record_events_served(
                        EVENT_TYPE_BLOCK_REMOVED,
                        client_id,
                        event_tag,
                        1,
                    ),
                    EventType::Unknown => {}
                }

                last_sent_event_id = event.event_id;
            }

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = tx.closed() => {
                    // The subscriber disconnected while the log was quiet.
                    tracing::debug!(client_id, "subscriber went away, closing stream");
                    return Ok(());
                }
                _ = self.shutdown.cancelled() => return Err(ServerError::ShuttingDown),
            }
        }
    }

    fn new_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.streaming_interval())
            .with_multiplier(BACKOFF_MULTIPLIER)
            .with_max_interval(BACKOFF_MAX_INTERVAL)
            .with_randomization_factor(BACKOFF_RANDOMIZATION_FACTOR)
            .with_max_elapsed_time(Some(self.config.streaming_max_no_event_time()))
            .build()
    }
}
