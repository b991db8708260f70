//! Unary handler behavior against the in-memory backends.

use tonic::{Code, Request};

use chainlake_core::api::chain_lake_server::ChainLake;
use chainlake_core::api::{
    AccountStateQuery, Compression, GetBlockByTransactionRequest, GetBlockFileRequest,
    GetBlockFilesByRangeRequest, GetChainEventsRequest, GetChainMetadataRequest,
    GetLatestBlockRequest, GetNativeBlockRequest, GetNativeBlocksByRangeRequest,
    GetNativeTransactionRequest, GetRawBlockRequest, GetRawBlocksByRangeRequest,
    GetRosettaBlockRequest, GetRosettaBlocksByRangeRequest, GetVerifiedAccountStateRequest,
    GetVersionedChainEventRequest,
};
use chainlake_core::storage::EventEntry;

use crate::fixtures::{
    added_event, block_meta, payload_for, transaction_record, TestLake,
};

#[tokio::test]
async fn latest_block_returns_the_watermark() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_latest_block(Request::new(GetLatestBlockRequest { tag: 1 }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.height, 109);
    assert_eq!(response.hash, "0x6d");
    assert_eq!(response.tag, 1);
}

#[tokio::test]
async fn raw_range_returns_payloads_in_height_order() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_raw_blocks_by_range(Request::new(GetRawBlocksByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 102,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.blocks.len(), 2);
    assert_eq!(response.blocks[0].height, 100);
    assert_eq!(response.blocks[1].height, 101);
    assert_eq!(response.blocks[0].data, payload_for(100));
    assert_eq!(lake.blob.downloads(), 2);
}

#[tokio::test]
async fn file_range_presigns_every_block_without_downloading() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_block_files_by_range(Request::new(GetBlockFilesByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 103,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.files.len(), 3);
    for (offset, file) in response.files.iter().enumerate() {
        let height = 100 + offset as u64;
        assert_eq!(file.height, height);
        assert!(file.file_url.contains(&format!("blocks/1/{height}.json.gz")));
        assert_eq!(file.compression, Compression::Gzip as i32);
        assert!(!file.skipped);
    }
    // Presigning never pulls payloads.
    assert_eq!(lake.blob.downloads(), 0);
}

#[tokio::test]
async fn native_range_parses_every_payload_in_height_order() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_native_blocks_by_range(Request::new(GetNativeBlocksByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 102,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.blocks.len(), 2);
    assert_eq!(response.blocks[0].height, 100);
    assert_eq!(response.blocks[1].height, 101);
    assert_eq!(response.blocks[0].transactions[0].payload, payload_for(100));
    assert_eq!(response.blocks[1].transactions[0].payload, payload_for(101));
    assert_eq!(lake.blob.downloads(), 2);
}

#[tokio::test]
async fn rosetta_range_is_gated_and_serves_payloads_when_enabled() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let status = lake
        .server
        .get_rosetta_blocks_by_range(Request::new(GetRosettaBlocksByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 102,
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
    assert_eq!(lake.blob.downloads(), 0);

    let lake = TestLake::builder()
        .with_config(|config| config.chain.feature.rosetta_parser = true)
        .build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_rosetta_blocks_by_range(Request::new(GetRosettaBlocksByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 102,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.blocks.len(), 2);
    assert_eq!(response.blocks[0].height, 100);
    assert_eq!(response.blocks[0].payload, payload_for(100));
    assert_eq!(response.blocks[1].payload, payload_for(101));
}

#[tokio::test]
async fn range_past_the_watermark_never_touches_payload_storage() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);
    // A reorg shortened the chain after the heights were indexed.
    lake.meta.set_watermark(1, 108);

    let status = lake
        .server
        .get_raw_blocks_by_range(Request::new(GetRawBlocksByRangeRequest {
            tag: 1,
            start_height: 100,
            end_height: 110,
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::FailedPrecondition);
    assert!(status.message().contains("exceeded latest watermark 108"));
    assert_eq!(lake.blob.downloads(), 0);
}

#[tokio::test]
async fn missing_block_is_not_found() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let status = lake
        .server
        .get_raw_block(Request::new(GetRawBlockRequest {
            tag: 1,
            height: 500,
            hash: "0xdead".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn tag_above_latest_is_invalid_argument() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let status = lake
        .server
        .get_latest_block(Request::new(GetLatestBlockRequest { tag: 9 }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("latest tag is 1"));
}

#[tokio::test]
async fn block_file_carries_presigned_url_and_compression() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_block_file(Request::new(GetBlockFileRequest {
            tag: 1,
            height: 100,
            hash: "0x64".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    let file = response.file.unwrap();
    assert!(file.file_url.contains("blocks/1/100.json.gz"));
    assert_eq!(file.compression, Compression::Gzip as i32);
    assert_eq!(file.height, 100);
    assert!(!file.skipped);
}

#[tokio::test]
async fn skipped_height_yields_the_sentinel_file() {
    let lake = TestLake::builder().build();
    let mut skipped = block_meta(1, 100);
    skipped.skipped = true;
    skipped.object_key = String::new();
    lake.meta.insert_block(skipped);

    let response = lake
        .server
        .get_block_file(Request::new(GetBlockFileRequest {
            tag: 1,
            height: 100,
            hash: "0x64".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    let file = response.file.unwrap();
    assert!(file.skipped);
    assert!(file.file_url.is_empty());
    assert_eq!(lake.blob.downloads(), 0);
}

#[tokio::test]
async fn native_block_goes_through_the_parser() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_native_block(Request::new(GetNativeBlockRequest {
            tag: 1,
            height: 101,
            hash: "0x65".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    let block = response.block.unwrap();
    assert_eq!(block.height, 101);
    assert_eq!(block.transactions.len(), 1);
    assert_eq!(block.transactions[0].payload, payload_for(101));
}

#[tokio::test]
async fn rosetta_without_a_parser_is_unimplemented_and_cheap() {
    let lake = TestLake::builder().build();
    lake.seed_blocks(1, 100..110);

    let status = lake
        .server
        .get_rosetta_block(Request::new(GetRosettaBlockRequest {
            tag: 1,
            height: 100,
            hash: "0x64".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unimplemented);
    assert_eq!(lake.blob.downloads(), 0);
}

#[tokio::test]
async fn rosetta_with_a_parser_serves_the_payload() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.feature.rosetta_parser = true)
        .build();
    lake.seed_blocks(1, 100..110);

    let response = lake
        .server
        .get_rosetta_block(Request::new(GetRosettaBlockRequest {
            tag: 1,
            height: 100,
            hash: "0x64".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.block.unwrap().payload, payload_for(100));
}

#[tokio::test]
async fn transaction_lookups_are_feature_gated() {
    let lake = TestLake::builder().build();

    let status = lake
        .server
        .get_block_by_transaction(Request::new(GetBlockByTransactionRequest {
            tag: 1,
            transaction_hash: "0xDEAD".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unimplemented);
}

#[tokio::test]
async fn reorged_transaction_records_are_filtered() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.feature.transaction_indexing = true)
        .build();

    let mut canonical = block_meta(1, 10);
    canonical.hash = "0xB".to_string();
    lake.meta.insert_block(canonical);

    // Two historical inclusions at height 10; only 0xB is still canonical.
    lake.transactions
        .add_transaction(transaction_record(1, "0xDEAD", 10, "0xA"));
    lake.transactions
        .add_transaction(transaction_record(1, "0xDEAD", 10, "0xB"));

    let response = lake
        .server
        .get_block_by_transaction(Request::new(GetBlockByTransactionRequest {
            tag: 1,
            transaction_hash: "0xDEAD".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.blocks.len(), 1);
    assert_eq!(response.blocks[0].hash, "0xB");
    assert_eq!(response.blocks[0].height, 10);
}

#[tokio::test]
async fn native_transaction_is_extracted_from_the_canonical_block() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.feature.transaction_indexing = true)
        .build();
    lake.seed_blocks(1, 10..11);
    lake.transactions
        .add_transaction(transaction_record(1, "0xDEAD", 10, "0xa"));

    let response = lake
        .server
        .get_native_transaction(Request::new(GetNativeTransactionRequest {
            tag: 1,
            transaction_hash: "0xDEAD".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.transactions.len(), 1);
    assert_eq!(response.transactions[0].hash, "0xDEAD");
    assert_eq!(response.transactions[0].block_height, 10);
}

#[tokio::test]
async fn verified_account_state_composes_proof_and_parser() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.feature.verified_account_state = true)
        .build();
    lake.seed_blocks(1, 100..101);

    let response = lake
        .server
        .get_verified_account_state(Request::new(GetVerifiedAccountStateRequest {
            req: Some(AccountStateQuery {
                tag: 1,
                height: 100,
                hash: "0x64".to_string(),
                account: "0xabc".to_string(),
            }),
        }))
        .await
        .unwrap()
        .into_inner();

    let state = response.response.unwrap();
    assert_eq!(state.account, "0xabc");
    assert_eq!(state.balance, "1000000000");
}

#[tokio::test]
async fn verified_account_state_is_feature_gated() {
    let lake = TestLake::builder().build();

    let status = lake
        .server
        .get_verified_account_state(Request::new(GetVerifiedAccountStateRequest { req: None }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unimplemented);
}

#[tokio::test]
async fn chain_events_pull_is_bounded_and_defaults_to_one() {
    let lake = TestLake::builder().build();
    lake.seed_events(vec![added_event(1, 100), added_event(2, 101), added_event(3, 102)]);

    let response = lake
        .server
        .get_chain_events(Request::new(GetChainEventsRequest {
            sequence: String::new(),
            initial_position_in_stream: String::new(),
            event_tag: 1,
            sequence_num: 1,
            max_num_events: 2,
        }))
        .await
        .unwrap()
        .into_inner();
    let ids: Vec<i64> = response.events.iter().map(|event| event.sequence_num).collect();
    assert_eq!(ids, vec![2, 3]);

    let response = lake
        .server
        .get_chain_events(Request::new(GetChainEventsRequest {
            sequence: String::new(),
            initial_position_in_stream: String::new(),
            event_tag: 1,
            sequence_num: 0,
            max_num_events: 0,
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].sequence_num, 1);
}

#[tokio::test]
async fn versioned_event_resolution_prefers_the_newest_match() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.latest_event_tag = 2)
        .build();

    let from = added_event(3, 300);
    lake.seed_events(vec![from.clone()]);

    // The same logical event appears twice in the target namespace after a
    // remove/re-add cycle; id 9 is the survivor.
    let matching = |event_id: i64| EventEntry { event_id, event_tag: 2, ..from.clone() };
    let mut different = matching(8);
    different.block_hash = "0xother".to_string();
    lake.seed_events(vec![matching(7), different, matching(9)]);

    let response = lake
        .server
        .get_versioned_chain_event(Request::new(GetVersionedChainEventRequest {
            from_event_tag: 1,
            to_event_tag: 2,
            from_sequence: String::new(),
            from_sequence_num: 3,
        }))
        .await
        .unwrap()
        .into_inner();

    let event = response.event.unwrap();
    assert_eq!(event.sequence_num, 9);
    assert_eq!(event.event_tag, 2);
}

#[tokio::test]
async fn versioned_event_without_a_match_is_an_internal_error() {
    let lake = TestLake::builder()
        .with_config(|config| config.chain.latest_event_tag = 2)
        .build();
    lake.seed_events(vec![added_event(3, 300)]);

    let status = lake
        .server
        .get_versioned_chain_event(Request::new(GetVersionedChainEventRequest {
            from_event_tag: 1,
            to_event_tag: 2,
            from_sequence: String::new(),
            from_sequence_num: 3,
        }))
        .await
        .unwrap_err();

    // An unmatched event is an unclassified failure, not a lookup miss.
    assert_eq!(status.code(), Code::Internal);
    assert!(status.message().contains("cannot find matching event"));
}

#[tokio::test]
async fn chain_metadata_is_a_config_passthrough() {
    let lake = TestLake::builder()
        .with_config(|config| {
            config.chain.latest_block_tag = 2;
            config.chain.stable_block_tag = 1;
            config.chain.latest_event_tag = 3;
            config.chain.stable_event_tag = 2;
        })
        .build();

    let response = lake
        .server
        .get_chain_metadata(Request::new(GetChainMetadataRequest {}))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.latest_block_tag, 2);
    assert_eq!(response.stable_block_tag, 1);
    assert_eq!(response.latest_event_tag, 3);
    assert_eq!(response.stable_event_tag, 2);
}
