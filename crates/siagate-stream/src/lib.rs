//! # Siagate Stream
//!
//! Resumable streaming of consensus changes to remote consumers.
//!
//! ## Overview
//!
//! A client names a resumption point (a [`ConsensusChangeId`], or one of the
//! `BEGINNING` / `RECENT` sentinels) and hands over a writer. The
//! [`ChangeStreamer`] registers with the consensus set and writes each change
//! as one CBOR item until the client cancels or the set ends the stream.
//!
//! ## Key Types
//!
//! - [`ChangeStreamer`] - Starts subscriptions
//! - [`SubscriptionHandle`] - A running stream; resolves to a [`StreamReport`]
//! - [`SubscriptionGuard`] - Exactly-once unsubscribe on drop
//! - [`ChangeEncoder`] / [`ChangeDecoder`] - The wire codec
//! - [`StreamConfig`] - Channel capacity and flush policy
//!
//! [`ConsensusChangeId`]: siagate_core::ConsensusChangeId

pub mod codec;
pub mod config;
pub mod error;
pub mod streamer;

pub use codec::{ChangeDecoder, ChangeEncoder};
pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use streamer::{ChangeStreamer, StreamReport, SubscriptionGuard, SubscriptionHandle};
