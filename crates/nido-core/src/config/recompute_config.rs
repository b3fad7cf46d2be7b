use serde::{Deserialize, Serialize};

use super::defaults;

/// Synchronous recompute path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeConfig {
    /// Re-fetch attempts when a measurement date turns out stale mid-batch.
    pub stale_date_retries: u32,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            stale_date_retries: defaults::DEFAULT_STALE_DATE_RETRIES,
        }
    }
}
