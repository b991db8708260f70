//! Event-log cursors.
//!
//! Cursors live with the caller; the server holds no per-subscriber state.
//! The legacy `sequence` field is the decimal-string form of an event id,
//! the preferred `sequence_num` is the same value as an integer; both
//! round-trip identically.

use std::num::ParseIntError;

use crate::api::{ChainEventsRequest, GetChainEventsRequest};

pub fn encode_event_id(event_id: i64) -> String {
    event_id.to_string()
}

pub fn decode_sequence(sequence: &str) -> Result<i64, ParseIntError> {
    sequence.parse()
}

/// Cursor fields shared by the streaming and the bounded-pull event
/// requests.
///
/// Note the collision inherited from the wire format: an empty `sequence`
/// with `sequence_num == 0` is indistinguishable from "no cursor supplied";
/// both start delivery after event id 0.
pub trait EventCursor: Send + Sync {
    /// Deprecated decimal-string cursor; wins over everything else when
    /// non-empty.
    fn sequence(&self) -> &str;

    /// `LATEST`, `EARLIEST`, or a decimal block height.
    fn initial_position(&self) -> &str;

    /// Numeric cursor; used only when the other two fields are empty.
    fn sequence_num(&self) -> i64;
}

impl EventCursor for ChainEventsRequest {
    fn sequence(&self) -> &str {
        &self.sequence
    }

    fn initial_position(&self) -> &str {
        &self.initial_position_in_stream
    }

    fn sequence_num(&self) -> i64 {
        self.sequence_num
    }
}

impl EventCursor for GetChainEventsRequest {
    fn sequence(&self) -> &str {
        &self.sequence
    }

    fn initial_position(&self) -> &str {
        &self.initial_position_in_stream
    }

    fn sequence_num(&self) -> i64 {
        self.sequence_num
    }
}
