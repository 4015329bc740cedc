//! # Siagate
//!
//! The consensus query and change-notification surface of a Sia-style node.
//!
//! ## Overview
//!
//! Siagate sits between clients and a chain state machine. It provides:
//!
//! - **Tip summary**: Current height, block, target and the constants table
//! - **Block lookup**: Blocks by ID or height, with every output and contract ID
//!   derived and attached
//! - **Trial validation**: Transaction sets checked against a scratch copy of
//!   the current state
//! - **Change subscriptions**: An ordered, resumable stream of consensus changes
//!
//! The chain itself is an injected [`ConsensusSet`]. Siagate reads from it and
//! registers subscribers with it, but never applies blocks.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use siagate::{ApiConfig, BlockQuery, ConsensusApi};
//! use siagate::consensus::MemoryConsensusSet;
//! use siagate::core::{Block, Network, UnlockHash};
//!
//! async fn example() {
//!     let cs = Arc::new(MemoryConsensusSet::new(
//!         Block::default(),
//!         Network::Standard,
//!         UnlockHash::default(),
//!         UnlockHash::default(),
//!     ));
//!     let api = ConsensusApi::new(cs, ApiConfig::default());
//!
//!     let tip = api.consensus().await.unwrap();
//!     let genesis = api
//!         .consensus_blocks(BlockQuery::by_height("0"))
//!         .await
//!         .unwrap();
//!     assert_eq!(tip.current_block, genesis.id);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `siagate::core` - Ledger types, canonical encoding, ID derivation
//! - `siagate::consensus` - The consensus-set trait and reference engine
//! - `siagate::stream` - Change streaming and its codec

pub mod api;
pub mod config;
pub mod error;
pub mod views;

pub use siagate_consensus as consensus;
pub use siagate_core as core;
pub use siagate_stream as stream;

pub use api::{BlockQuery, ConsensusApi};
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use views::{ConsensusBlocksGet, ConsensusGet, KeyedOutputId, TransactionView};

pub use siagate_consensus::{CancelHandle, CancelSignal, ConsensusChange, ConsensusSet};
pub use siagate_core::{ConsensusChangeId, Transaction, TransactionId};
pub use siagate_stream::{ChangeDecoder, StreamReport, SubscriptionHandle};
