//! # Siagate Core
//!
//! Pure primitives for Siagate: ledger types, canonical encoding and the
//! ID-derivation scheme.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over ledger data structures.
//!
//! ## Key Types
//!
//! - [`Transaction`] - The atomic component of a block
//! - [`TransactionId`], [`SiacoinOutputId`], [`SiafundOutputId`], [`FileContractId`] -
//!   Content-addressed identifiers (Blake3)
//! - [`Specifier`] - 16-byte domain-separation tag
//! - [`Currency`] - 256-bit unsigned amounts with checked arithmetic
//!
//! ## Identifiers
//!
//! Every identifier is derived, never assigned. See the [`ids`] module for the
//! pre-image layout of each kind.

pub mod block;
pub mod canonical;
pub mod constants;
pub mod crypto;
pub mod currency;
pub mod error;
pub mod ids;
pub mod specifier;
pub mod target;
pub mod transaction;
pub mod types;

pub use block::{Block, BlockHeight, BlockNonce, Timestamp};
pub use canonical::{canonical_transaction_bytes, canonical_transaction_bytes_no_signatures};
pub use constants::{ConsensusConstants, Network, SiafundPortion};
pub use crypto::{Hash256, Keypair};
pub use currency::Currency;
pub use error::{CoreError, Result};
pub use ids::ProofStatus;
pub use specifier::Specifier;
pub use target::Target;
pub use transaction::{
    CoveredFields, FileContract, FileContractRevision, FoundationUnlockHashUpdate, SiaPublicKey,
    SiacoinInput, SiacoinOutput, SiafundInput, SiafundOutput, StorageProof, Transaction,
    TransactionBuilder, TransactionSignature, UnlockConditions,
};
pub use types::{
    BlockId, ConsensusChangeId, FileContractId, OutputId, SiacoinOutputId, SiafundOutputId,
    TransactionId, UnlockHash,
};
