//! API configuration.

use serde::{Deserialize, Serialize};

use siagate_stream::StreamConfig;

/// Configuration for [`ConsensusApi`](crate::ConsensusApi).
///
/// There is no network setting: the constants table is whatever the injected
/// consensus set enforces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Settings for change subscriptions.
    pub stream: StreamConfig,
}
