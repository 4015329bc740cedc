//! # Siagate Consensus
//!
//! The consensus-set interface and its in-memory reference engine.
//!
//! ## Overview
//!
//! The query and streaming layers treat the chain state machine as an injected
//! collaborator behind the [`ConsensusSet`] trait. They read tip and block data,
//! trial-apply transaction sets, and register subscribers for the ordered feed
//! of [`ConsensusChange`]s.
//!
//! ## Key Types
//!
//! - [`ConsensusSet`] - The async trait the rest of Siagate consumes
//! - [`MemoryConsensusSet`] - Single-chain reference engine
//! - [`ConsensusChange`] - An atomic, ordered delta with per-object diffs
//! - [`CancelHandle`] / [`CancelSignal`] - Subscription cancellation
//!
//! ## Design Notes
//!
//! - **Gap-free catch-up**: Catch-up and registration happen under the same
//!   lock that serializes block application
//! - **Bounded delivery**: Each subscriber has its own bounded channel
//! - **Trial application**: `try_transaction_set` works on a scratch copy

pub mod cancel;
pub mod change;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod traits;

pub use cancel::{CancelHandle, CancelSignal};
pub use change::{
    ConsensusChange, DiffDirection, FileContractDiff, SiacoinOutputDiff, SiafundOutputDiff,
    SiafundPoolDiff, SubscriberId,
};
pub use error::{ConsensusError, Result};
pub use memory::MemoryConsensusSet;
pub use traits::{ChangeSink, ConsensusSet};
