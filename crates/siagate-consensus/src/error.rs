//! Error types for the consensus module.

use siagate_core::{BlockId, ConsensusChangeId, CoreError};
use thiserror::Error;

/// Errors reported by a consensus set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// A transaction broke a consensus rule.
    #[error("{0}")]
    InvalidTransaction(String),

    /// The block does not extend the current tip.
    #[error("block parent {parent} is not the current tip {tip}")]
    OrphanBlock { parent: BlockId, tip: BlockId },

    /// The block is already part of the chain.
    #[error("block {0} is already in the chain")]
    BlockKnown(BlockId),

    /// No block matches the query.
    #[error("block not found: {0}")]
    MissingBlock(String),

    /// The genesis block cannot be reverted.
    #[error("cannot revert the genesis block")]
    RevertGenesis,

    /// The resumption point is not a change this set has produced.
    #[error("consensus change id not recognized: {0}")]
    InvalidConsensusChangeId(ConsensusChangeId),

    /// The subscriber's cancel signal fired.
    #[error("subscription cancelled")]
    Cancelled,

    /// The subscriber stopped receiving changes.
    #[error("subscriber closed")]
    SubscriberClosed,

    /// Internal consistency error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Ledger arithmetic or encoding failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;
