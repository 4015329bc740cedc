//! ConsensusSet trait: the interface to the chain state machine.
//!
//! The query and streaming layers never mutate the chain. They read through
//! this trait and register subscribers with it.

use async_trait::async_trait;
use tokio::sync::mpsc;

use siagate_core::{
    Block, BlockHeight, BlockId, ConsensusChangeId, ConsensusConstants, Target, Transaction,
    UnlockHash,
};

use crate::cancel::CancelSignal;
use crate::change::{ConsensusChange, SubscriberId};
use crate::error::Result;

/// Where a consensus set delivers changes for one subscriber.
pub type ChangeSink = mpsc::Sender<ConsensusChange>;

/// The consensus set: chain state, trial validation, and change subscriptions.
///
/// # Subscription contract
///
/// - `consensus_set_subscribe` sends every change after `start` to `sink`, in
///   order, then registers the subscriber for future changes. Catch-up and
///   registration are atomic with respect to new blocks: no change is skipped
///   or delivered twice.
/// - `start` is [`ConsensusChangeId::BEGINNING`], [`ConsensusChangeId::RECENT`],
///   or the id of a change this set has produced.
/// - `cancel` is checked between deliveries. Once it fires nothing more is sent.
/// - Producing a change never waits on a subscriber. A subscriber whose sink
///   is full when a change is published is removed and its sink dropped, so
///   its stream ends rather than skipping a change.
/// - `unsubscribe` is synchronous so it can run from a `Drop` impl. It is a
///   no-op for unknown subscribers.
#[async_trait]
pub trait ConsensusSet: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Chain Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The constants table this set enforces.
    fn constants(&self) -> ConsensusConstants;

    /// Height of the current tip.
    async fn height(&self) -> BlockHeight;

    /// The block at `height` on the current chain.
    async fn block_at_height(&self, height: BlockHeight) -> Option<Block>;

    /// A block on the current chain and its height.
    async fn block_by_id(&self, id: &BlockId) -> Option<(Block, BlockHeight)>;

    /// The target a child of block `id` must meet.
    async fn child_target(&self, id: &BlockId) -> Option<Target>;

    /// Whether the set believes it has caught up with the network.
    async fn synced(&self) -> bool;

    /// The current Foundation primary and failsafe unlock hashes.
    async fn foundation_unlock_hashes(&self) -> (UnlockHash, UnlockHash);

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply `txns` to a scratch copy of the current state.
    ///
    /// Returns the change the set would produce. Committed state is untouched
    /// whatever the outcome.
    async fn try_transaction_set(&self, txns: &[Transaction]) -> Result<ConsensusChange>;

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Catch `subscriber` up from `start` and register it for future changes.
    async fn consensus_set_subscribe(
        &self,
        subscriber: SubscriberId,
        start: ConsensusChangeId,
        sink: ChangeSink,
        cancel: CancelSignal,
    ) -> Result<()>;

    /// Remove `subscriber` from the registry.
    fn unsubscribe(&self, subscriber: SubscriberId);
}
