use serde::{Deserialize, Serialize};

use super::defaults;

/// Asynchronous projection path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Items per atomic multi-item write; the cascade chunks batches to
    /// stay below this.
    pub transact_ceiling: usize,
    /// Records per secondary-index page when walking a subject's records.
    pub invalidation_page_size: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            transact_ceiling: defaults::DEFAULT_TRANSACT_CEILING,
            invalidation_page_size: defaults::DEFAULT_INVALIDATION_PAGE_SIZE,
        }
    }
}
