use crate::constants::MAX_TRANSACT_ITEMS;

/// One strongly-consistent re-fetch on a stale measurement date.
pub const DEFAULT_STALE_DATE_RETRIES: u32 = 1;

/// Items per atomic multi-item write.
pub const DEFAULT_TRANSACT_CEILING: usize = MAX_TRANSACT_ITEMS;

/// Records fetched per secondary-index page during cascade invalidation.
pub const DEFAULT_INVALIDATION_PAGE_SIZE: usize = 100;
