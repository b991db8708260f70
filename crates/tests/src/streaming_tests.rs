//! Event-stream delivery: cursor positions, ordering, idle timeout and
//! graceful shutdown.

use std::time::Duration;

use tokio::time::timeout;
use tokio_stream::StreamExt;
use tonic::{Code, Request, Status};

use chainlake_core::api::chain_lake_server::ChainLake;
use chainlake_core::api::{
    ChainEventsRequest, ChainEventsResponse, GetLatestBlockRequest, INITIAL_POSITION_EARLIEST,
};

use crate::fixtures::{added_event, removed_event, TestLake};

fn stream_request(initial_position: &str, sequence_num: i64) -> Request<ChainEventsRequest> {
    Request::new(ChainEventsRequest {
        sequence: String::new(),
        initial_position_in_stream: initial_position.to_string(),
        event_tag: 1,
        sequence_num,
    })
}

async fn next_item(
    stream: &mut tokio_stream::wrappers::ReceiverStream<Result<ChainEventsResponse, Status>>,
    wait: Duration,
) -> Option<Result<ChainEventsResponse, Status>> {
    timeout(wait, stream.next()).await.expect("stream stalled")
}

fn sequence_num(item: Option<Result<ChainEventsResponse, Status>>) -> i64 {
    item.expect("stream ended")
        .expect("stream errored")
        .event
        .expect("empty response")
        .sequence_num
}

#[tokio::test]
async fn earliest_cursor_replays_the_log_then_tails_new_events() {
    let lake = TestLake::builder().with_fast_streaming(10_000).build();
    lake.seed_events(vec![added_event(1, 100), added_event(2, 101), added_event(3, 102)]);

    let mut stream = lake
        .server
        .stream_chain_events(stream_request(INITIAL_POSITION_EARLIEST, 0))
        .await
        .unwrap()
        .into_inner();

    for expected in 1..=3 {
        assert_eq!(sequence_num(next_item(&mut stream, Duration::from_secs(2)).await), expected);
    }

    // The stream blocks on an empty log; a new event arrives and is
    // delivered on the next poll.
    lake.meta.append_event(added_event(4, 103));
    assert_eq!(sequence_num(next_item(&mut stream, Duration::from_secs(2)).await), 4);
}

#[tokio::test]
async fn height_cursor_starts_at_the_first_event_for_that_height() {
    let lake = TestLake::builder().with_fast_streaming(10_000).build();
    lake.seed_events(vec![added_event(41, 249), added_event(42, 250), added_event(43, 251)]);

    let mut stream = lake
        .server
        .stream_chain_events(stream_request("250", 0))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(sequence_num(next_item(&mut stream, Duration::from_secs(2)).await), 42);
    assert_eq!(sequence_num(next_item(&mut stream, Duration::from_secs(2)).await), 43);
}

#[tokio::test]
async fn unknown_height_cursor_fails_before_the_stream_opens() {
    let lake = TestLake::builder().with_fast_streaming(10_000).build();
    lake.seed_events(vec![added_event(1, 100)]);

    let status = lake
        .server
        .stream_chain_events(stream_request("999", 0))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn delivery_is_strictly_increasing_across_polls() {
    let lake = TestLake::builder()
        .with_fast_streaming(10_000)
        .with_config(|config| config.api.streaming_batch_size = 5)
        .build();
    let mut events = Vec::new();
    for id in 1..=20 {
        events.push(if id % 5 == 0 {
            removed_event(id, 100 + id as u64)
        } else {
            added_event(id, 100 + id as u64)
        });
    }
    lake.seed_events(events);

    let mut stream = lake
        .server
        .stream_chain_events(stream_request(INITIAL_POSITION_EARLIEST, 0))
        .await
        .unwrap()
        .into_inner();

    let mut last = 0;
    for _ in 0..20 {
        let event = next_item(&mut stream, Duration::from_secs(2))
            .await
            .expect("stream ended")
            .expect("stream errored")
            .event
            .expect("empty response");
        assert!(event.sequence_num > last, "{} !> {last}", event.sequence_num);
        // Both cursor encodings round-trip identically.
        assert_eq!(event.sequence, event.sequence_num.to_string());
        last = event.sequence_num;
    }
    assert_eq!(last, 20);
}

#[tokio::test]
async fn idle_stream_aborts_after_the_quiet_period() {
    let lake = TestLake::builder().with_fast_streaming(150).build();

    let mut stream = lake
        .server
        .stream_chain_events(stream_request(INITIAL_POSITION_EARLIEST, 0))
        .await
        .unwrap()
        .into_inner();

    let item = next_item(&mut stream, Duration::from_secs(5)).await;
    let status = item.expect("stream ended silently").unwrap_err();
    assert_eq!(status.code(), Code::Aborted);
    assert!(status.message().contains("please retry after a moment"));
}

#[tokio::test]
async fn shutdown_aborts_streams_while_unary_requests_complete() {
    let lake = TestLake::builder().with_fast_streaming(60_000).build();
    lake.seed_blocks(1, 100..101);

    let mut streams = Vec::new();
    for _ in 0..3 {
        let stream = lake
            .server
            .stream_chain_events(stream_request(INITIAL_POSITION_EARLIEST, 0))
            .await
            .unwrap()
            .into_inner();
        streams.push(stream);
    }

    // Let the streams reach their poll loops, then signal shutdown.
    tokio::time::sleep(Duration::from_millis(50)).await;
    lake.server.shutdown_token().cancel();

    for stream in &mut streams {
        let item = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("stream did not observe shutdown");
        let status = item.expect("stream ended silently").unwrap_err();
        assert_eq!(status.code(), Code::Aborted);
        assert!(status.message().contains("please retry after a moment"));
    }

    // Unary requests are unaffected by the stream drain.
    let response = lake
        .server
        .get_latest_block(Request::new(GetLatestBlockRequest { tag: 1 }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.height, 100);
}

#[tokio::test]
async fn dropped_subscribers_do_not_disturb_the_rest() {
    let lake = TestLake::builder().with_fast_streaming(10_000).build();
    lake.seed_events(vec![added_event(1, 100), added_event(2, 101)]);

    let mut first = lake
        .server
        .stream_chain_events(stream_request(INITIAL_POSITION_EARLIEST, 0))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(sequence_num(next_item(&mut first, Duration::from_secs(2)).await), 1);
    drop(first);

    // Disconnect handling itself is covered next to the delivery loop;
    // here we only care that a new subscriber is unaffected and starts
    // from its own cursor.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut second = lake
        .server
        .stream_chain_events(stream_request("", 1))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(sequence_num(next_item(&mut second, Duration::from_secs(2)).await), 2);
}
