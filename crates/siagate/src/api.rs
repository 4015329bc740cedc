//! The consensus query surface.
//!
//! `ConsensusApi` answers tip, block and validation queries from an injected
//! consensus set and hands subscription requests to the change streamer. It
//! never mutates chain state.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tracing::{debug, error, warn};

use siagate_consensus::{CancelSignal, ConsensusSet};
use siagate_core::{BlockHeight, BlockId, ConsensusChangeId, ConsensusConstants, Transaction};
use siagate_stream::{ChangeStreamer, StreamError, SubscriptionHandle};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::views::{self, ConsensusBlocksGet, ConsensusGet, TipState};

/// Parameters of a block lookup. Exactly one must be present.
///
/// Empty strings count as absent, as they do for query-string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockQuery {
    pub id: Option<String>,
    pub height: Option<String>,
}

impl BlockQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            height: None,
        }
    }

    pub fn by_height(height: impl Into<String>) -> Self {
        Self {
            id: None,
            height: Some(height.into()),
        }
    }
}

/// Which block a query resolved to.
enum Lookup {
    Id(BlockId),
    Height(BlockHeight),
}

fn present(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|s| !s.is_empty())
}

impl BlockQuery {
    fn resolve(&self) -> Result<Lookup> {
        match (present(&self.id), present(&self.height)) {
            (Some(_), Some(_)) => Err(ApiError::bad_request("can't specify both id and height")),
            (None, None) => Err(ApiError::bad_request(
                "either id or height has to be provided",
            )),
            (Some(id), None) => id
                .parse()
                .map(Lookup::Id)
                .map_err(|_| ApiError::bad_request("failed to unmarshal blockid")),
            (None, Some(height)) => height
                .trim()
                .parse()
                .map(Lookup::Height)
                .map_err(|_| ApiError::bad_request("failed to parse block height")),
        }
    }
}

/// Query handlers over a consensus set.
#[derive(Clone)]
pub struct ConsensusApi {
    cs: Arc<dyn ConsensusSet>,
    constants: ConsensusConstants,
    streamer: ChangeStreamer,
}

impl ConsensusApi {
    /// The constants table comes from `cs`, so views always describe the
    /// chain they were read from.
    pub fn new(cs: Arc<dyn ConsensusSet>, config: ApiConfig) -> Self {
        let streamer = ChangeStreamer::new(Arc::clone(&cs), config.stream);
        Self {
            constants: cs.constants(),
            cs,
            streamer,
        }
    }

    pub fn constants(&self) -> &ConsensusConstants {
        &self.constants
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Summarize the current tip and the constants table.
    pub async fn consensus(&self) -> Result<ConsensusGet> {
        let height = self.cs.height().await;
        let Some(block) = self.cs.block_at_height(height).await else {
            error!(height, "no block at the tip height");
            return Err(ApiError::internal(
                "Failed to fetch block for current height",
            ));
        };
        let current_block = block.id();
        let target = self
            .cs
            .child_target(&current_block)
            .await
            .unwrap_or(self.constants.root_target);
        let (foundation_primary, foundation_failsafe) = self.cs.foundation_unlock_hashes().await;

        let tip = TipState {
            synced: self.cs.synced().await,
            height,
            current_block,
            target,
            foundation_primary,
            foundation_failsafe,
        };
        Ok(views::consensus_get(tip, &self.constants))
    }

    /// Look a block up by ID or by height.
    pub async fn consensus_blocks(&self, query: BlockQuery) -> Result<ConsensusBlocksGet> {
        let found = match query.resolve()? {
            Lookup::Id(id) => self.cs.block_by_id(&id).await,
            Lookup::Height(height) => self
                .cs
                .block_at_height(height)
                .await
                .map(|block| (block, height)),
        };
        let Some((block, height)) = found else {
            return Err(ApiError::bad_request("block doesn't exist"));
        };

        // the target this block had to meet; genesis has no parent to ask
        let target = self
            .cs
            .child_target(&block.parent_id)
            .await
            .unwrap_or(self.constants.root_target);
        let difficulty = target.difficulty(&self.constants.root_depth);
        Ok(views::consensus_blocks_get(&block, height, difficulty))
    }

    /// Check a JSON-encoded transaction set against the current state.
    ///
    /// Nothing is committed whatever the outcome.
    pub async fn validate_transaction_set(&self, body: &[u8]) -> Result<()> {
        let txns: Vec<Transaction> = serde_json::from_slice(body).map_err(|e| {
            ApiError::bad_request(format!("could not decode transaction set: {e}"))
        })?;
        match self.cs.try_transaction_set(&txns).await {
            Ok(change) => {
                debug!(txns = txns.len(), change_id = %change.id, "transaction set valid");
                Ok(())
            }
            Err(e) => {
                warn!(txns = txns.len(), error = %e, "transaction set rejected");
                Err(ApiError::ValidationFailed(format!(
                    "transaction set validation failed: {e}"
                )))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Stream every consensus change after `id` to `writer`.
    ///
    /// `id` is the hex form of a change ID, or of the `BEGINNING` / `RECENT`
    /// sentinels. Errors are only returned before the first byte is written;
    /// once the stream is running it ends silently and reports through the
    /// handle.
    pub async fn subscribe<W>(
        &self,
        id: &str,
        writer: W,
        cancel: CancelSignal,
    ) -> Result<SubscriptionHandle>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let start: ConsensusChangeId = id
            .parse()
            .map_err(|e| ApiError::bad_request(format!("could not decode ID: {e}")))?;
        self.streamer
            .subscribe(start, writer, cancel)
            .await
            .map_err(|e| match e {
                e @ StreamError::Registry(_) => ApiError::bad_request(e.to_string()),
                other => {
                    error!(error = %other, "subscription task failed");
                    ApiError::internal(other.to_string())
                }
            })
    }
}
