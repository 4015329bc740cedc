//! # Siagate Testkit
//!
//! Testing utilities for Siagate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Specifier bytes and canonical encodings every
//!   implementation must reproduce
//! - **Generators**: Proptest strategies for transactions and their parts
//! - **Fixtures**: A funded testing-network chain and stream helpers
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use siagate_testkit::generators::{transaction_from_params, TransactionParams};
//!
//! proptest! {
//!     #[test]
//!     fn id_is_deterministic(params: TransactionParams) {
//!         let t1 = transaction_from_params(&params);
//!         let t2 = transaction_from_params(&params);
//!         prop_assert_eq!(t1.id(), t2.id());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use siagate_testkit::fixtures::TestChain;
//!
//! async fn example() {
//!     let chain = TestChain::new();
//!     let spend = chain.spend_genesis_coin(chain.unlock_hash());
//!     chain.mine(vec![spend]).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{read_changes, TestChain};
pub use generators::{transaction_from_params, TransactionParams};
pub use vectors::{encoding_vectors, specifier_vectors, verify_all_vectors};
