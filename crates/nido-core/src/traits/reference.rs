use crate::errors::NidoResult;
use crate::models::LmsRow;
use crate::records::{MeasurementType, Sex};

/// Supplies the raw LMS rows for one reference table family.
///
/// Loaded once per (type, sex) and treated as immutable for the process
/// lifetime; the provider caches the day-indexed form.
pub trait IReferenceSource: Send + Sync {
    /// Rows ordered by day for the given table. An empty vector means the
    /// table is unavailable for this combination.
    fn rows(&self, measurement_type: MeasurementType, sex: Sex) -> NidoResult<Vec<LmsRow>>;
}
