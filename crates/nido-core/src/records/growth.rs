use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::measurement::{Measurements, PercentileSet};

/// How a growth record entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSource {
    /// Entered by a user as a dated measurement.
    Manual,
    /// Derived from the subject's birth fields by the projector.
    Birth,
}

/// A dated set of measurements for one subject.
///
/// The percentile cache, when present, corresponds exactly to the current
/// measurements evaluated against the subject's current sex and date of
/// birth. Absence of the cache is the staleness token: readers treat a
/// present cache as fresh, and recompute is owed whenever it is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub owner_id: String,
    pub measurement_date: NaiveDate,
    pub measurements: Measurements,
    /// Cached percentiles; `None` means recompute is owed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<PercentileSet>,
    pub source: MeasurementSource,
    /// Materialized in-memory by the synchronous path, not yet persisted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GrowthRecord {
    /// Whether the percentile cache is missing (recompute owed).
    pub fn is_stale(&self) -> bool {
        self.percentiles.is_none()
    }

    pub fn is_birth_sourced(&self) -> bool {
        self.source == MeasurementSource::Birth
    }
}
