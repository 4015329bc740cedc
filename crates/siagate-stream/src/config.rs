//! Stream configuration.

use serde::{Deserialize, Serialize};

/// Configuration for change streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Capacity of each subscriber's change channel.
    pub channel_capacity: usize,
    /// Flush the connection after every change.
    pub flush_each_change: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            flush_each_change: true,
        }
    }
}
