//! Chain-event delivery: cursors and the long-lived stream loop.

mod cursor;
mod streamer;

pub use cursor::{decode_sequence, encode_event_id, EventCursor};
pub use streamer::EventStreamer;

use crate::api::{BlockIdentifier, BlockchainEvent};
use crate::storage::EventEntry;

/// Converts an index event entry into its wire form. Both cursor encodings
/// are populated so either round-trips.
pub fn event_to_wire(event: &EventEntry) -> BlockchainEvent {
    BlockchainEvent {
        sequence: encode_event_id(event.event_id),
        sequence_num: event.event_id,
        event_type: event.event_type as i32,
        block: Some(BlockIdentifier {
            tag: event.block_tag,
            hash: event.block_hash.clone(),
            height: event.block_height,
            skipped: event.block_skipped,
            timestamp: event.block_timestamp,
        }),
        event_tag: event.event_tag,
    }
}
