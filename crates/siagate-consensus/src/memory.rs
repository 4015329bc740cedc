//! In-memory implementation of the ConsensusSet trait.
//!
//! A single-chain reference engine: blocks must extend the tip, the tip can be
//! reverted, and every step is published as a [`ConsensusChange`]. There is no
//! fork choice, proof-of-work check or signature verification.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Permit;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

use siagate_core::{
    Block, BlockHeight, BlockId, ConsensusChangeId, ConsensusConstants, Currency, FileContract,
    FileContractId, Network, SiacoinOutput, SiacoinOutputId, SiafundOutput, SiafundOutputId,
    Target, Transaction, UnlockHash,
};

use crate::cancel::CancelSignal;
use crate::change::{ConsensusChange, SubscriberId};
use crate::error::{ConsensusError, Result};
use crate::ledger::{Diffs, Ledger};
use crate::traits::{ChangeSink, ConsensusSet};

/// In-memory consensus set.
///
/// Lock order: `publish`, then `state`. The `subscribers` lock is never held
/// across an await, and no lock is held while waiting on a subscriber.
pub struct MemoryConsensusSet {
    constants: ConsensusConstants,
    state: RwLock<ChainState>,
    /// Serializes change production, fan-out and registration.
    publish: AsyncMutex<()>,
    subscribers: Mutex<Vec<Subscriber>>,
}

struct ChainState {
    /// Index is height.
    blocks: Vec<ProcessedBlock>,
    block_index: HashMap<BlockId, BlockHeight>,
    ledger: Ledger,
    /// Every change ever published, in order.
    changes: Vec<ConsensusChange>,
    synced: bool,
}

struct ProcessedBlock {
    block: Block,
    id: BlockId,
    diffs: Diffs,
}

struct Subscriber {
    id: SubscriberId,
    sink: ChangeSink,
    cancel: CancelSignal,
}

impl MemoryConsensusSet {
    /// Create a consensus set whose chain starts at `genesis`.
    ///
    /// Genesis transactions are applied without validation. The genesis block is
    /// published as the first change.
    pub fn new(
        genesis: Block,
        network: Network,
        foundation_primary: UnlockHash,
        foundation_failsafe: UnlockHash,
    ) -> Self {
        let constants = ConsensusConstants::for_network(network);
        let mut ledger = Ledger {
            foundation_primary,
            foundation_failsafe,
            ..Ledger::default()
        };
        let mut diffs = Diffs::default();
        for txn in &genesis.transactions {
            ledger.apply_genesis_transaction(txn, &mut diffs);
        }

        let id = genesis.id();
        let change = build_change(0, vec![], vec![genesis.clone()], &diffs, constants.root_target, false);
        let mut block_index = HashMap::new();
        block_index.insert(id, 0);

        Self {
            constants,
            state: RwLock::new(ChainState {
                blocks: vec![ProcessedBlock {
                    block: genesis,
                    id,
                    diffs,
                }],
                block_index,
                ledger,
                changes: vec![change],
                synced: false,
            }),
            publish: AsyncMutex::new(()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Extend the chain with `block` and publish the change.
    pub async fn accept_block(&self, block: Block) -> Result<ConsensusChange> {
        let _publish = self.publish.lock().await;
        let change = {
            let mut state = self.state.write().await;
            let tip = state.tip().id;
            let id = block.id();
            if state.block_index.contains_key(&id) {
                return Err(ConsensusError::BlockKnown(id));
            }
            if block.parent_id != tip {
                return Err(ConsensusError::OrphanBlock {
                    parent: block.parent_id,
                    tip,
                });
            }

            let height = state.blocks.len() as BlockHeight;
            let mut ledger = state.ledger.clone();
            let mut diffs = Diffs::default();
            for txn in &block.transactions {
                ledger.apply_transaction(txn, height, &self.constants, &mut diffs)?;
            }
            ledger.expire_contracts(height, &mut diffs);

            let seq = state.changes.len() as u64;
            let change = build_change(
                seq,
                vec![],
                vec![block.clone()],
                &diffs,
                self.constants.root_target,
                state.synced,
            );
            state.ledger = ledger;
            state.block_index.insert(id, height);
            state.blocks.push(ProcessedBlock { block, id, diffs });
            state.changes.push(change.clone());
            info!(block_id = %id, height, "block accepted");
            change
        };
        self.fan_out(&change);
        Ok(change)
    }

    /// Remove the tip block and publish the change.
    pub async fn revert_tip(&self) -> Result<ConsensusChange> {
        let _publish = self.publish.lock().await;
        let change = {
            let mut state = self.state.write().await;
            if state.blocks.len() <= 1 {
                return Err(ConsensusError::RevertGenesis);
            }
            let processed = state
                .blocks
                .pop()
                .ok_or_else(|| ConsensusError::Internal("empty chain".into()))?;
            let inverted = processed.diffs.inverted();
            state.ledger.apply_diffs(&inverted);
            if let Some((primary, failsafe)) = processed.diffs.foundation_before {
                state.ledger.foundation_primary = primary;
                state.ledger.foundation_failsafe = failsafe;
            }
            state.block_index.remove(&processed.id);

            let seq = state.changes.len() as u64;
            let change = build_change(
                seq,
                vec![processed.block],
                vec![],
                &inverted,
                self.constants.root_target,
                state.synced,
            );
            state.changes.push(change.clone());
            info!(
                block_id = %processed.id,
                height = state.blocks.len() as u64,
                "block reverted"
            );
            change
        };
        self.fan_out(&change);
        Ok(change)
    }

    /// Mark the set as synced (or not). Reported in later changes.
    pub async fn set_synced(&self, synced: bool) {
        self.state.write().await.synced = synced;
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    pub async fn siacoin_output(&self, id: &SiacoinOutputId) -> Option<SiacoinOutput> {
        self.state.read().await.ledger.siacoin_outputs.get(id).cloned()
    }

    pub async fn siafund_output(&self, id: &SiafundOutputId) -> Option<SiafundOutput> {
        self.state.read().await.ledger.siafund_outputs.get(id).cloned()
    }

    pub async fn file_contract(&self, id: &FileContractId) -> Option<FileContract> {
        self.state.read().await.ledger.file_contracts.get(id).cloned()
    }

    /// Snapshot of all unspent siacoin outputs.
    pub async fn siacoin_outputs(&self) -> HashMap<SiacoinOutputId, SiacoinOutput> {
        self.state.read().await.ledger.siacoin_outputs.clone()
    }

    /// Snapshot of all unspent siafund outputs.
    pub async fn siafund_outputs(&self) -> HashMap<SiafundOutputId, SiafundOutput> {
        self.state.read().await.ledger.siafund_outputs.clone()
    }

    /// Snapshot of all open file contracts.
    pub async fn file_contracts(&self) -> HashMap<FileContractId, FileContract> {
        self.state.read().await.ledger.file_contracts.clone()
    }

    pub async fn siafund_pool(&self) -> Currency {
        self.state.read().await.ledger.siafund_pool
    }

    /// The id of the most recent change.
    pub async fn recent_change_id(&self) -> ConsensusChangeId {
        let state = self.state.read().await;
        state
            .changes
            .last()
            .map(|c| c.id)
            .unwrap_or(ConsensusChangeId::BEGINNING)
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver `change` to every registered subscriber, in registration order.
    ///
    /// Never waits on a subscriber. One whose channel is full has fallen behind
    /// and is dropped along with its sink, so its stream ends instead of
    /// skipping a change. Must be called with `publish` held and `state`
    /// released.
    fn fan_out(&self, change: &ConsensusChange) {
        let mut subs = self.lock_subscribers();
        subs.retain(|s| {
            if s.cancel.is_cancelled() {
                debug!(subscriber = %s.id, "dropping cancelled subscriber");
                return false;
            }
            match s.sink.try_send(change.clone()) {
                Ok(()) => {
                    debug!(subscriber = %s.id, change_id = %change.id, "change delivered");
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %s.id, change_id = %change.id, "subscriber fell behind, dropping");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %s.id, "dropping closed subscriber");
                    false
                }
            }
        });
    }
}

impl ChainState {
    fn tip(&self) -> &ProcessedBlock {
        // the chain always holds genesis
        &self.blocks[self.blocks.len() - 1]
    }

    /// Index into `changes` of the first change after `start`.
    fn resume_index(&self, start: &ConsensusChangeId) -> Result<usize> {
        if *start == ConsensusChangeId::BEGINNING {
            return Ok(0);
        }
        if *start == ConsensusChangeId::RECENT {
            return Ok(self.changes.len());
        }
        self.changes
            .iter()
            .position(|c| c.id == *start)
            .map(|i| i + 1)
            .ok_or(ConsensusError::InvalidConsensusChangeId(*start))
    }
}

/// Wait for room in `sink`, giving up if the subscriber is cancelled or gone.
async fn reserve<'a>(
    sink: &'a ChangeSink,
    cancel: &mut CancelSignal,
) -> Result<Permit<'a, ConsensusChange>> {
    if cancel.is_cancelled() {
        return Err(ConsensusError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConsensusError::Cancelled),
        permit = sink.reserve() => permit.map_err(|_| ConsensusError::SubscriberClosed),
    }
}

fn build_change(
    seq: u64,
    reverted: Vec<Block>,
    applied: Vec<Block>,
    diffs: &Diffs,
    child_target: Target,
    synced: bool,
) -> ConsensusChange {
    ConsensusChange {
        id: ConsensusChange::compute_id(seq, &reverted, &applied),
        reverted_blocks: reverted,
        applied_blocks: applied,
        siacoin_output_diffs: diffs.siacoin_outputs.clone(),
        file_contract_diffs: diffs.file_contracts.clone(),
        siafund_output_diffs: diffs.siafund_outputs.clone(),
        siafund_pool_diffs: diffs.siafund_pool.clone(),
        child_target,
        synced,
    }
}

#[async_trait]
impl ConsensusSet for MemoryConsensusSet {
    fn constants(&self) -> ConsensusConstants {
        self.constants.clone()
    }

    async fn height(&self) -> BlockHeight {
        (self.state.read().await.blocks.len() - 1) as BlockHeight
    }

    async fn block_at_height(&self, height: BlockHeight) -> Option<Block> {
        let state = self.state.read().await;
        state
            .blocks
            .get(usize::try_from(height).ok()?)
            .map(|pb| pb.block.clone())
    }

    async fn block_by_id(&self, id: &BlockId) -> Option<(Block, BlockHeight)> {
        let state = self.state.read().await;
        let height = *state.block_index.get(id)?;
        state
            .blocks
            .get(height as usize)
            .map(|pb| (pb.block.clone(), height))
    }

    async fn child_target(&self, id: &BlockId) -> Option<Target> {
        let state = self.state.read().await;
        state
            .block_index
            .contains_key(id)
            .then_some(self.constants.root_target)
    }

    async fn synced(&self) -> bool {
        self.state.read().await.synced
    }

    async fn foundation_unlock_hashes(&self) -> (UnlockHash, UnlockHash) {
        let state = self.state.read().await;
        (
            state.ledger.foundation_primary,
            state.ledger.foundation_failsafe,
        )
    }

    async fn try_transaction_set(&self, txns: &[Transaction]) -> Result<ConsensusChange> {
        let state = self.state.read().await;
        let height = state.blocks.len() as BlockHeight;
        let mut scratch = state.ledger.clone();
        let mut diffs = Diffs::default();
        for txn in txns {
            if let Err(e) = scratch.apply_transaction(txn, height, &self.constants, &mut diffs) {
                warn!(txn_id = %txn.id(), error = %e, "transaction set rejected");
                return Err(e);
            }
        }
        let seq = state.changes.len() as u64;
        Ok(build_change(
            seq,
            vec![],
            vec![],
            &diffs,
            self.constants.root_target,
            state.synced,
        ))
    }

    async fn consensus_set_subscribe(
        &self,
        subscriber: SubscriberId,
        start: ConsensusChangeId,
        sink: ChangeSink,
        mut cancel: CancelSignal,
    ) -> Result<()> {
        let mut next = self.state.read().await.resume_index(&start)?;
        info!(subscriber = %subscriber, start = %start, from = next, "subscriber registering");

        loop {
            {
                // fill the channel without waiting; registering only once the
                // log is exhausted keeps catch-up and fan-out gap-free
                let _publish = self.publish.lock().await;
                let state = self.state.read().await;
                while let Some(change) = state.changes.get(next) {
                    match sink.try_send(change.clone()) {
                        Ok(()) => next += 1,
                        Err(TrySendError::Full(_)) => break,
                        Err(TrySendError::Closed(_)) => return Err(ConsensusError::SubscriberClosed),
                    }
                }
                if next == state.changes.len() {
                    if cancel.is_cancelled() {
                        return Err(ConsensusError::Cancelled);
                    }
                    self.lock_subscribers().push(Subscriber {
                        id: subscriber,
                        sink,
                        cancel,
                    });
                    debug!(subscriber = %subscriber, delivered = next, "subscriber caught up");
                    return Ok(());
                }
            }

            // the log is append-only, so `next` stays valid with no lock held
            let permit = reserve(&sink, &mut cancel).await?;
            let change = self
                .state
                .read()
                .await
                .changes
                .get(next)
                .cloned()
                .ok_or_else(|| ConsensusError::Internal("change log shrank".into()))?;
            permit.send(change);
            next += 1;
        }
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        let mut subs = self.lock_subscribers();
        let before = subs.len();
        subs.retain(|s| s.id != subscriber);
        if subs.len() != before {
            info!(subscriber = %subscriber, "subscriber removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siagate_core::{Keypair, TransactionBuilder, UnlockConditions};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Chain {
        cs: MemoryConsensusSet,
        uc: UnlockConditions,
        coin: SiacoinOutputId,
    }

    fn chain() -> Chain {
        let kp = Keypair::from_seed(&[0x21; 32]);
        let uc = UnlockConditions::single_key(kp.public_key());
        let funding = TransactionBuilder::new()
            .siacoin_output(Currency::from(1_000u64), uc.unlock_hash())
            .build();
        let coin = funding.siacoin_output_id(0);
        let genesis = Block {
            timestamp: 1,
            transactions: vec![funding],
            ..Block::default()
        };
        let cs = MemoryConsensusSet::new(
            genesis,
            Network::Testing,
            UnlockHash::from_bytes([0xf0; 32]),
            UnlockHash::from_bytes([0xf1; 32]),
        );
        Chain { cs, uc, coin }
    }

    async fn next_block(cs: &MemoryConsensusSet, txns: Vec<Transaction>) -> Block {
        let height = cs.height().await;
        let parent = cs.block_at_height(height).await.unwrap();
        Block {
            parent_id: parent.id(),
            timestamp: parent.timestamp + 1,
            transactions: txns,
            ..Block::default()
        }
    }

    #[tokio::test]
    async fn test_genesis_state() {
        let c = chain();
        assert_eq!(c.cs.height().await, 0);
        assert!(c.cs.siacoin_output(&c.coin).await.is_some());
        let genesis = c.cs.block_at_height(0).await.unwrap();
        assert_eq!(c.cs.block_by_id(&genesis.id()).await.unwrap().1, 0);
        assert!(c.cs.child_target(&genesis.id()).await.is_some());
        assert!(c.cs.block_at_height(1).await.is_none());
    }

    #[tokio::test]
    async fn test_accept_and_revert() {
        let c = chain();
        let spend = TransactionBuilder::new()
            .siacoin_input(c.coin, c.uc.clone())
            .siacoin_output(Currency::from(1_000u64), c.uc.unlock_hash())
            .build();
        let block = next_block(&c.cs, vec![spend.clone()]).await;
        let change = c.cs.accept_block(block.clone()).await.unwrap();
        assert_eq!(change.applied_blocks, vec![block.clone()]);
        assert_eq!(c.cs.height().await, 1);
        assert!(c.cs.siacoin_output(&c.coin).await.is_none());

        let reverted = c.cs.revert_tip().await.unwrap();
        assert_eq!(reverted.reverted_blocks, vec![block.clone()]);
        assert_eq!(c.cs.height().await, 0);
        assert!(c.cs.siacoin_output(&c.coin).await.is_some());
        assert!(c.cs.siacoin_output(&spend.siacoin_output_id(0)).await.is_none());
        assert!(c.cs.block_by_id(&block.id()).await.is_none());
    }

    #[tokio::test]
    async fn test_orphan_rejected() {
        let c = chain();
        let orphan = Block {
            parent_id: BlockId::from_bytes([9; 32]),
            ..Block::default()
        };
        assert!(matches!(
            c.cs.accept_block(orphan).await,
            Err(ConsensusError::OrphanBlock { .. })
        ));
        assert!(matches!(
            c.cs.revert_tip().await,
            Err(ConsensusError::RevertGenesis)
        ));
    }

    #[tokio::test]
    async fn test_invalid_block_leaves_state_untouched() {
        let c = chain();
        let bad = TransactionBuilder::new()
            .siacoin_input(c.coin, c.uc.clone())
            .siacoin_output(Currency::from(5u64), c.uc.unlock_hash())
            .build();
        let block = next_block(&c.cs, vec![bad]).await;
        assert!(c.cs.accept_block(block).await.is_err());
        assert_eq!(c.cs.height().await, 0);
        assert!(c.cs.siacoin_output(&c.coin).await.is_some());
    }

    #[tokio::test]
    async fn test_try_transaction_set_has_no_side_effects() {
        let c = chain();
        let spend = TransactionBuilder::new()
            .siacoin_input(c.coin, c.uc.clone())
            .siacoin_output(Currency::from(1_000u64), c.uc.unlock_hash())
            .build();
        let change = c.cs.try_transaction_set(&[spend.clone()]).await.unwrap();
        assert_eq!(change.siacoin_output_diffs.len(), 2);
        assert!(c.cs.siacoin_output(&c.coin).await.is_some());

        // Same output spent twice across the set.
        let again = TransactionBuilder::new()
            .siacoin_input(c.coin, c.uc.clone())
            .siacoin_output(Currency::from(1_000u64), UnlockHash::default())
            .build();
        assert!(c.cs.try_transaction_set(&[spend, again]).await.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_from_beginning_and_recent() {
        let c = chain();
        let block = next_block(&c.cs, vec![]).await;
        c.cs.accept_block(block).await.unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        c.cs
            .consensus_set_subscribe(
                SubscriberId::random(),
                ConsensusChangeId::BEGINNING,
                tx,
                CancelSignal::never(),
            )
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().applied_blocks[0].timestamp, 1);
        assert_eq!(rx.recv().await.unwrap().applied_blocks[0].timestamp, 2);
        assert!(rx.try_recv().is_err());

        let (tx, mut rx) = mpsc::channel(16);
        c.cs
            .consensus_set_subscribe(
                SubscriberId::random(),
                ConsensusChangeId::RECENT,
                tx,
                CancelSignal::never(),
            )
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(c.cs.subscriber_count(), 2);

        let block = next_block(&c.cs, vec![]).await;
        c.cs.accept_block(block.clone()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().applied_blocks, vec![block]);
    }

    #[tokio::test]
    async fn test_subscribe_from_change_id() {
        let c = chain();
        let first = c.cs.recent_change_id().await;
        let block = next_block(&c.cs, vec![]).await;
        c.cs.accept_block(block.clone()).await.unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        c.cs
            .consensus_set_subscribe(SubscriberId::random(), first, tx, CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().applied_blocks, vec![block]);
    }

    #[tokio::test]
    async fn test_unknown_change_id_rejected() {
        let c = chain();
        let (tx, _rx) = mpsc::channel(4);
        let bogus = ConsensusChangeId::from_bytes([0x12; 32]);
        let err = c
            .cs
            .consensus_set_subscribe(SubscriberId::random(), bogus, tx, CancelSignal::never())
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::InvalidConsensusChangeId(bogus));
        assert_eq!(c.cs.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_subscriber_is_dropped() {
        let c = chain();
        let id = SubscriberId::random();
        let (tx, rx) = mpsc::channel(4);
        c.cs
            .consensus_set_subscribe(id, ConsensusChangeId::RECENT, tx, CancelSignal::never())
            .await
            .unwrap();
        drop(rx);
        let block = next_block(&c.cs, vec![]).await;
        c.cs.accept_block(block).await.unwrap();
        assert_eq!(c.cs.subscriber_count(), 0);

        // Unsubscribing an unknown id is a no-op.
        c.cs.unsubscribe(id);
    }

    #[tokio::test]
    async fn test_stalled_subscriber_is_dropped_without_blocking() {
        let c = chain();
        let (stalled_tx, mut stalled_rx) = mpsc::channel(1);
        let (healthy_tx, mut healthy_rx) = mpsc::channel(1);
        for sink in [stalled_tx, healthy_tx] {
            c.cs
                .consensus_set_subscribe(
                    SubscriberId::random(),
                    ConsensusChangeId::RECENT,
                    sink,
                    CancelSignal::never(),
                )
                .await
                .unwrap();
        }

        let mut first = None;
        for _ in 0..10 {
            let block = next_block(&c.cs, vec![]).await;
            let change = tokio::time::timeout(Duration::from_secs(2), c.cs.accept_block(block))
                .await
                .expect("accept_block waited on a full subscriber")
                .unwrap();
            assert_eq!(healthy_rx.recv().await.unwrap(), change);
            first.get_or_insert(change);
        }
        assert_eq!(c.cs.subscriber_count(), 1);

        // the stalled subscriber keeps what it was sent, then sees the end
        assert_eq!(stalled_rx.recv().await, first);
        assert!(stalled_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_slow_catch_up_does_not_block_blocks() {
        let c = chain();
        for _ in 0..3 {
            let block = next_block(&c.cs, vec![]).await;
            c.cs.accept_block(block).await.unwrap();
        }

        let (tx, mut rx) = mpsc::channel(1);
        let subscribe = c.cs.consensus_set_subscribe(
            SubscriberId::random(),
            ConsensusChangeId::BEGINNING,
            tx,
            CancelSignal::never(),
        );
        let produce_and_drain = async {
            // the subscriber has a full channel and a backlog at this point
            let block = next_block(&c.cs, vec![]).await;
            tokio::time::timeout(Duration::from_secs(2), c.cs.accept_block(block))
                .await
                .expect("accept_block waited on catch-up")
                .unwrap();
            let mut timestamps = Vec::new();
            for _ in 0..5 {
                timestamps.push(rx.recv().await.unwrap().applied_blocks[0].timestamp);
            }
            (timestamps, rx)
        };
        let (registered, (timestamps, mut rx)) = tokio::join!(subscribe, produce_and_drain);
        registered.unwrap();

        // the block accepted mid catch-up arrives once, in order
        assert_eq!(timestamps, vec![1, 2, 3, 4, 5]);
        assert!(rx.try_recv().is_err());
        assert_eq!(c.cs.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_foundation_update_applies_and_reverts() {
        let kp = Keypair::from_seed(&[0x31; 32]);
        let uc = UnlockConditions::single_key(kp.public_key());
        let funding = TransactionBuilder::new()
            .siacoin_output(Currency::from(10u64), uc.unlock_hash())
            .build();
        let genesis = Block {
            transactions: vec![funding.clone()],
            ..Block::default()
        };
        let cs = MemoryConsensusSet::new(
            genesis,
            Network::Testing,
            uc.unlock_hash(),
            UnlockHash::from_bytes([0xf1; 32]),
        );

        let update = siagate_core::FoundationUnlockHashUpdate {
            new_primary: UnlockHash::from_bytes([0xa1; 32]),
            new_failsafe: UnlockHash::from_bytes([0xa2; 32]),
        };
        let txn = TransactionBuilder::new()
            .siacoin_input(funding.siacoin_output_id(0), uc.clone())
            .siacoin_output(Currency::from(10u64), uc.unlock_hash())
            .arbitrary_data(update.to_arbitrary_data())
            .build();
        let block = next_block(&cs, vec![txn]).await;
        cs.accept_block(block).await.unwrap();
        assert_eq!(
            cs.foundation_unlock_hashes().await,
            (update.new_primary, update.new_failsafe)
        );

        cs.revert_tip().await.unwrap();
        assert_eq!(cs.foundation_unlock_hashes().await.0, uc.unlock_hash());
    }
}
