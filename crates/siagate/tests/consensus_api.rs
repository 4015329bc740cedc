//! End-to-end tests of the query surface over the reference engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use siagate::consensus::{
    ChangeSink, ConsensusChange, ConsensusSet, MemoryConsensusSet, SubscriberId,
};
use siagate::core::{
    Block, BlockHeight, BlockId, ConsensusChangeId, ConsensusConstants, Currency,
    FoundationUnlockHashUpdate, Network, Target, Transaction, TransactionBuilder, UnlockHash,
};
use siagate::stream::StreamConfig;
use siagate::{ApiConfig, ApiError, BlockQuery, CancelHandle, CancelSignal, ChangeDecoder, ConsensusApi};
use siagate_testkit::fixtures::GENESIS_SIACOINS;
use siagate_testkit::{read_changes, TestChain};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn api_for(chain: &TestChain) -> ConsensusApi {
    ConsensusApi::new(chain.consensus_set(), ApiConfig::default())
}

/// Wraps the reference engine, counting unsubscribes and optionally hiding
/// the tip block.
struct CountingSet {
    inner: Arc<MemoryConsensusSet>,
    unsubscribes: AtomicUsize,
    hide_tip: bool,
}

impl CountingSet {
    fn new(inner: Arc<MemoryConsensusSet>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            unsubscribes: AtomicUsize::new(0),
            hide_tip: false,
        })
    }

    fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsensusSet for CountingSet {
    fn constants(&self) -> ConsensusConstants {
        self.inner.constants()
    }

    async fn height(&self) -> BlockHeight {
        self.inner.height().await
    }

    async fn block_at_height(&self, height: BlockHeight) -> Option<Block> {
        if self.hide_tip && height == self.inner.height().await {
            return None;
        }
        self.inner.block_at_height(height).await
    }

    async fn block_by_id(&self, id: &BlockId) -> Option<(Block, BlockHeight)> {
        self.inner.block_by_id(id).await
    }

    async fn child_target(&self, id: &BlockId) -> Option<Target> {
        self.inner.child_target(id).await
    }

    async fn synced(&self) -> bool {
        self.inner.synced().await
    }

    async fn foundation_unlock_hashes(&self) -> (UnlockHash, UnlockHash) {
        self.inner.foundation_unlock_hashes().await
    }

    async fn try_transaction_set(
        &self,
        txns: &[Transaction],
    ) -> siagate::consensus::Result<ConsensusChange> {
        self.inner.try_transaction_set(txns).await
    }

    async fn consensus_set_subscribe(
        &self,
        subscriber: SubscriberId,
        start: ConsensusChangeId,
        sink: ChangeSink,
        cancel: CancelSignal,
    ) -> siagate::consensus::Result<()> {
        self.inner
            .consensus_set_subscribe(subscriber, start, sink, cancel)
            .await
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.unsubscribe(subscriber);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tip Summary
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tip_summary() {
    init_tracing();
    let chain = TestChain::with_seed([1; 32]);
    chain.mine_empty(2).await.unwrap();
    chain.cs.set_synced(true).await;
    let api = api_for(&chain);

    let tip = api.consensus().await.unwrap();
    assert!(tip.synced);
    assert_eq!(tip.height, 2);
    assert_eq!(
        tip.current_block,
        chain.cs.block_at_height(2).await.unwrap().id()
    );
    assert_eq!(
        (
            tip.foundation_primary_unlock_hash,
            tip.foundation_failsafe_unlock_hash
        ),
        (chain.unlock_hash(), chain.unlock_hash())
    );
    // the engine runs the testing network; the default config has no say
    assert_eq!(
        tip.constants,
        ConsensusConstants::for_network(Network::Testing)
    );

    let json = serde_json::to_value(&tip).unwrap();
    assert_eq!(json["siafundportion"], "39/1000");
    assert!(json.get("roottarget").is_some());
}

#[tokio::test]
async fn test_missing_tip_block_is_internal_error() {
    init_tracing();
    let chain = TestChain::with_seed([2; 32]);
    let hidden = Arc::new(CountingSet {
        inner: chain.cs.clone(),
        unsubscribes: AtomicUsize::new(0),
        hide_tip: true,
    });
    let api = ConsensusApi::new(hidden, ApiConfig::default());

    let err = api.consensus().await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.message(), "Failed to fetch block for current height");
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Lookup
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_block_lookup_by_id_and_height() -> anyhow::Result<()> {
    init_tracing();
    let chain = TestChain::with_seed([3; 32]);
    let spend = chain.spend_genesis_coin(UnlockHash::from_bytes([4; 32]));
    let change = chain.mine(vec![spend.clone()]).await?;
    let block = change.applied_blocks[0].clone();
    let api = api_for(&chain);

    let by_height = api.consensus_blocks(BlockQuery::by_height("1")).await?;
    let by_id = api
        .consensus_blocks(BlockQuery::by_id(block.id().to_hex()))
        .await?;
    assert_eq!(by_height, by_id);

    assert_eq!(by_id.id, block.id());
    assert_eq!(by_id.height, 1);
    assert_eq!(by_id.parent_id, block.parent_id);
    assert_eq!(by_id.transaction_ids, vec![spend.id()]);
    assert_eq!(by_id.transactions[0].id, spend.id());
    assert_eq!(
        by_id.transactions[0].siacoin_outputs[0].id,
        spend.siacoin_output_id(0)
    );
    assert_eq!(by_id.siacoin_output_ids.len(), 1);
    assert_eq!(
        by_id.siacoin_output_ids[0].key,
        format!("{}_0", spend.id())
    );

    let genesis = api.consensus_blocks(BlockQuery::by_height("0")).await?;
    let constants = api.constants();
    assert_eq!(
        genesis.difficulty,
        constants.root_target.difficulty(&constants.root_depth)
    );
    Ok(())
}

#[tokio::test]
async fn test_block_lookup_errors() {
    init_tracing();
    let chain = TestChain::with_seed([5; 32]);
    let api = api_for(&chain);

    let cases = [
        (
            BlockQuery {
                id: Some(BlockId::default().to_hex()),
                height: Some("0".into()),
            },
            "can't specify both id and height",
        ),
        (BlockQuery::default(), "either id or height has to be provided"),
        (
            BlockQuery {
                id: Some(String::new()),
                height: None,
            },
            "either id or height has to be provided",
        ),
        (BlockQuery::by_id("not-hex"), "failed to unmarshal blockid"),
        (BlockQuery::by_height("one"), "failed to parse block height"),
        (BlockQuery::by_height("99"), "block doesn't exist"),
        (
            BlockQuery::by_id(BlockId::from_bytes([0xee; 32]).to_hex()),
            "block doesn't exist",
        ),
    ];
    for (query, message) in cases {
        let err = api.consensus_blocks(query).await.unwrap_err();
        assert_eq!(err, ApiError::BadRequest(message.to_string()));
        assert_eq!(err.status_code(), 400);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validate_transaction_set() {
    init_tracing();
    let chain = TestChain::with_seed([6; 32]);
    let api = api_for(&chain);

    let spend = chain.spend_genesis_coin(UnlockHash::from_bytes([7; 32]));
    let body = serde_json::to_vec(&vec![spend.clone()]).unwrap();
    api.validate_transaction_set(&body).await.unwrap();

    // trial application left the chain alone
    assert_eq!(chain.cs.height().await, 0);
    assert!(chain.cs.siacoin_output(&chain.coin).await.is_some());
    assert!(chain
        .cs
        .siacoin_output(&spend.siacoin_output_id(0))
        .await
        .is_none());
    api.validate_transaction_set(&body).await.unwrap();
}

#[tokio::test]
async fn test_validate_transaction_set_errors() {
    init_tracing();
    let chain = TestChain::with_seed([8; 32]);
    let api = api_for(&chain);

    let err = api
        .validate_transaction_set(b"{not json")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
    assert!(err
        .message()
        .starts_with("could not decode transaction set: "));

    // creates value from nothing
    let inflate = TransactionBuilder::new()
        .siacoin_input(chain.coin, chain.unlock_conditions())
        .siacoin_output(Currency::from(10_000_000u64), chain.unlock_hash())
        .sign(&chain.keypair);
    let body = serde_json::to_vec(&[inflate]).unwrap();
    let err = api.validate_transaction_set(&body).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));
    assert_eq!(err.status_code(), 400);
    assert!(err
        .message()
        .starts_with("transaction set validation failed: "));
    assert!(chain.cs.siacoin_output(&chain.coin).await.is_some());
}

#[tokio::test]
async fn test_rejected_set_leaves_tip_summary_unchanged() {
    init_tracing();
    let chain = TestChain::with_seed([14; 32]);
    chain.mine_empty(1).await.unwrap();
    let api = api_for(&chain);
    let before = api.consensus().await.unwrap();

    // the first transaction is valid and touches the trial state; the second
    // moves the Foundation without spending a Foundation-owned output
    let update = FoundationUnlockHashUpdate {
        new_primary: UnlockHash::from_bytes([0x61; 32]),
        new_failsafe: UnlockHash::from_bytes([0x62; 32]),
    };
    let unauthorized = TransactionBuilder::new()
        .arbitrary_data(update.to_arbitrary_data())
        .build();
    let set = vec![
        chain.spend_genesis_coin(UnlockHash::from_bytes([0x63; 32])),
        unauthorized,
    ];
    let body = serde_json::to_vec(&set).unwrap();
    let err = api.validate_transaction_set(&body).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));

    assert_eq!(api.consensus().await.unwrap(), before);

    // an authorized update passes validation but is still not committed
    let authorized = TransactionBuilder::new()
        .siacoin_input(chain.coin, chain.unlock_conditions())
        .siacoin_output(Currency::from(GENESIS_SIACOINS), chain.unlock_hash())
        .arbitrary_data(update.to_arbitrary_data())
        .sign(&chain.keypair);
    let body = serde_json::to_vec(&[authorized]).unwrap();
    api.validate_transaction_set(&body).await.unwrap();
    assert_eq!(api.consensus().await.unwrap(), before);
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriptions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_subscribe_from_beginning_replays_history() {
    init_tracing();
    let chain = TestChain::with_seed([9; 32]);
    chain.mine_empty(2).await.unwrap();
    let api = api_for(&chain);
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let cancel = CancelHandle::new();

    let handle = api
        .subscribe(
            &ConsensusChangeId::BEGINNING.to_hex(),
            server,
            cancel.signal(),
        )
        .await
        .unwrap();

    let replay = read_changes(&mut client, 3).await;
    let timestamps: Vec<_> = replay
        .iter()
        .map(|c| c.applied_blocks[0].timestamp)
        .collect();
    assert_eq!(replay.len(), 3);
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        replay[0].applied_blocks[0],
        chain.cs.block_at_height(0).await.unwrap()
    );

    let live = chain.mine(vec![]).await.unwrap();
    assert_eq!(read_changes(&mut client, 1).await, vec![live]);

    cancel.cancel();
    let report = handle.join().await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.changes_written, 4);
}

#[tokio::test]
async fn test_subscribe_from_recent_skips_history() {
    init_tracing();
    let chain = TestChain::with_seed([10; 32]);
    chain.mine_empty(3).await.unwrap();
    let api = api_for(&chain);
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let cancel = CancelHandle::new();

    let handle = api
        .subscribe(&ConsensusChangeId::RECENT.to_hex(), server, cancel.signal())
        .await
        .unwrap();
    let live = chain.mine(vec![]).await.unwrap();
    let changes = read_changes(&mut client, 1).await;
    assert_eq!(changes, vec![live.clone()]);

    // resume from the change just seen
    cancel.cancel();
    handle.join().await.unwrap();
    let newer = chain.mine(vec![]).await.unwrap();
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let cancel = CancelHandle::new();
    let handle = api
        .subscribe(&live.id.to_hex(), server, cancel.signal())
        .await
        .unwrap();
    assert_eq!(read_changes(&mut client, 1).await, vec![newer]);
    cancel.cancel();
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_stalled_subscriber_does_not_hold_up_blocks() {
    init_tracing();
    let chain = TestChain::with_seed([15; 32]);
    let config = ApiConfig {
        stream: StreamConfig {
            channel_capacity: 1,
            ..StreamConfig::default()
        },
    };
    let api = ConsensusApi::new(chain.consensus_set(), config);
    let recent = ConsensusChangeId::RECENT.to_hex();

    // too small to hold even one change, and never read
    let (stalled_client, stalled_server) = tokio::io::duplex(16);
    let stalled = api
        .subscribe(&recent, stalled_server, CancelSignal::never())
        .await
        .unwrap();
    let (mut healthy_client, healthy_server) = tokio::io::duplex(64 * 1024);
    let cancel = CancelHandle::new();
    let healthy = api
        .subscribe(&recent, healthy_server, cancel.signal())
        .await
        .unwrap();

    let mut received = Vec::new();
    for _ in 0..10 {
        let change = tokio::time::timeout(Duration::from_secs(2), chain.mine(vec![]))
            .await
            .expect("block acceptance waited on a subscriber")
            .unwrap();
        let next = read_changes(&mut healthy_client, 1).await;
        assert_eq!(next, vec![change]);
        received.extend(next);
    }
    assert_eq!(received.len(), 10);
    assert_eq!(chain.cs.subscriber_count(), 1);

    drop(stalled_client);
    let report = stalled.join().await.unwrap();
    assert!(report.error.is_some());
    assert!(report.changes_written < 10);

    cancel.cancel();
    let report = healthy.join().await.unwrap();
    assert_eq!(report.changes_written, 10);
    assert_eq!(chain.cs.subscriber_count(), 0);
}

#[tokio::test]
async fn test_subscribe_errors() {
    init_tracing();
    let chain = TestChain::with_seed([11; 32]);
    let counting = CountingSet::new(chain.cs.clone());
    let api = ConsensusApi::new(counting.clone(), ApiConfig::default());

    let (_client, server) = tokio::io::duplex(1024);
    let err = api
        .subscribe("zz", server, CancelSignal::never())
        .await
        .unwrap_err();
    assert!(err.message().starts_with("could not decode ID: "));
    // never reached the consensus set
    assert_eq!(counting.unsubscribes(), 0);

    let (_client, server) = tokio::io::duplex(1024);
    let unknown = ConsensusChangeId::from_bytes([0x5a; 32]);
    let err = api
        .subscribe(&unknown.to_hex(), server, CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.message().starts_with("could not subscribe: "));
    assert_eq!(counting.unsubscribes(), 1);
    assert_eq!(chain.cs.subscriber_count(), 0);
}

#[tokio::test]
async fn test_cancel_stops_delivery_and_unsubscribes_once() {
    init_tracing();
    let chain = TestChain::with_seed([12; 32]);
    let counting = CountingSet::new(chain.cs.clone());
    let api = ConsensusApi::new(counting.clone(), ApiConfig::default());
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let cancel = CancelHandle::new();

    let handle = api
        .subscribe(&ConsensusChangeId::RECENT.to_hex(), server, cancel.signal())
        .await
        .unwrap();
    assert_eq!(chain.cs.subscriber_count(), 1);
    chain.mine(vec![]).await.unwrap();
    assert_eq!(read_changes(&mut client, 1).await.len(), 1);

    cancel.cancel();
    let report = handle.join().await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.changes_written, 1);
    assert_eq!(counting.unsubscribes(), 1);
    assert_eq!(chain.cs.subscriber_count(), 0);

    // nothing more reaches the connection
    chain.mine(vec![]).await.unwrap();
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    let (after, err) = ChangeDecoder::new(rest).decode_all();
    assert!(after.is_empty());
    assert!(err.is_none());
    assert_eq!(counting.unsubscribes(), 1);
}

#[tokio::test]
async fn test_dropped_client_unsubscribes_once() {
    init_tracing();
    let chain = TestChain::with_seed([13; 32]);
    let counting = CountingSet::new(chain.cs.clone());
    let api = ConsensusApi::new(counting.clone(), ApiConfig::default());
    let (client, server) = tokio::io::duplex(1024);

    let handle = api
        .subscribe(
            &ConsensusChangeId::RECENT.to_hex(),
            server,
            CancelSignal::never(),
        )
        .await
        .unwrap();
    drop(client);
    chain.mine(vec![]).await.unwrap();

    let report = handle.join().await.unwrap();
    assert!(!report.cancelled);
    assert!(report.error.is_some());
    assert_eq!(counting.unsubscribes(), 1);
    assert_eq!(chain.cs.subscriber_count(), 0);
}
