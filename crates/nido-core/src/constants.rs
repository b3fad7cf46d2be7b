/// nido system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Below this magnitude the LMS lambda is treated as zero (log branch).
pub const LMS_EPSILON: f64 = 1e-12;

/// Weight measurements arrive in grams; reference tables are in kilograms.
pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;

/// Rounding applied to computed percentiles.
pub const PERCENTILE_DECIMALS: u32 = 2;

/// Rounding applied to computed z-scores.
pub const ZSCORE_DECIMALS: u32 = 4;

/// Rounding applied to reported LMS parameters.
pub const LMS_DECIMALS: u32 = 6;

/// Platform ceiling on items per atomic multi-item write.
pub const MAX_TRANSACT_ITEMS: usize = 25;

/// Gestational week bounds for premature subjects.
pub const MIN_GESTATIONAL_WEEK: u8 = 20;
pub const MAX_PREMATURE_GESTATIONAL_WEEK: u8 = 37;

/// Gestational week assigned to full-term subjects.
pub const TERM_GESTATIONAL_WEEK: u8 = 40;
