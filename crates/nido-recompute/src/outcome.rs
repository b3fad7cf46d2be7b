//! Response shapes for the synchronous recompute entry point.
//!
//! One struct per scope variant; each carries only the fields its branch
//! produces.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use nido_core::records::{GrowthRecord, MeasurementType, PercentileSet, Subject};

use crate::classifier::RecomputeScope;

/// A growth record annotated with the percentiles freshly computed for it
/// during this request, for client-side diffing against the stored cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: GrowthRecord,
    /// Absent when this record was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_percentiles: Option<PercentileSet>,
}

/// FULL scope result: every record reconsidered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRecompute {
    pub subject: Subject,
    pub records: Vec<AnnotatedRecord>,
    /// Records whose percentile cache was actually refreshed.
    pub updated_count: usize,
    /// Records considered, including skips.
    pub total_considered: usize,
    /// Union of measurement types touched across all updates.
    pub metrics_touched: BTreeSet<MeasurementType>,
    pub duration_ms: u64,
}

/// BIRTH_ONLY scope result: birth percentiles plus one representative record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthOnlyRecompute {
    pub subject: Subject,
    pub birth_percentiles: PercentileSet,
    /// The canonical birth record, or a synthesized in-memory stand-in when
    /// the asynchronous projector has not materialized one yet.
    pub record: GrowthRecord,
}

/// Why no recompute ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Synchronous recompute was not requested by the caller.
    NotRequested,
    /// No percentile-impacting field changed.
    NoRelevantChanges,
    /// BIRTH_ONLY scope with no birth measurements left.
    NoBirthMeasurements,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotRequested => f.write_str("synchronous recompute not requested"),
            SkipReason::NoRelevantChanges => f.write_str("no relevant fields changed"),
            SkipReason::NoBirthMeasurements => f.write_str("no birth measurements"),
        }
    }
}

/// NONE scope (or early-exit) result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSkipped {
    pub subject: Subject,
    pub reason: SkipReason,
}

/// Closed result of one synchronous recompute request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum RecomputeOutcome {
    Full(FullRecompute),
    BirthOnly(BirthOnlyRecompute),
    Skipped(RecomputeSkipped),
}

impl RecomputeOutcome {
    pub fn scope(&self) -> RecomputeScope {
        match self {
            RecomputeOutcome::Full(_) => RecomputeScope::Full,
            RecomputeOutcome::BirthOnly(_) => RecomputeScope::BirthOnly,
            RecomputeOutcome::Skipped(_) => RecomputeScope::None,
        }
    }

    pub fn subject(&self) -> &Subject {
        match self {
            RecomputeOutcome::Full(full) => &full.subject,
            RecomputeOutcome::BirthOnly(birth) => &birth.subject,
            RecomputeOutcome::Skipped(skip) => &skip.subject,
        }
    }
}

/// Per-record result inside a FULL batch. Expected, recoverable conditions
/// are values here, not errors; the batch loop consumes them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordOutcome {
    Updated(PercentileSet),
    Skipped(RecordSkip),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordSkip {
    /// No computable metric (all values null/non-positive, or every metric
    /// hit a degenerate reference row).
    EmptyResult,
    /// Measurement date still precedes birth after the consistent-read
    /// retry.
    StaleDate,
    /// The per-record cache write failed; siblings are unaffected.
    PersistFailed,
}

impl fmt::Display for RecordSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSkip::EmptyResult => f.write_str("empty result"),
            RecordSkip::StaleDate => f.write_str("stale measurement date"),
            RecordSkip::PersistFailed => f.write_str("persist failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use nido_core::records::{MeasurementSource, Sex};
    use uuid::Uuid;

    fn a_subject() -> Subject {
        let now = Utc::now();
        Subject {
            id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            name: "Mia".to_string(),
            sex: Sex::Female,
            date_of_birth: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            premature: false,
            gestational_week: Some(40),
            birth_weight: None,
            birth_height: None,
            birth_head_circumference: None,
            birth_record_id: None,
            birth_percentiles: None,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn skipped_outcome_serializes_with_mode_tag() {
        let outcome = RecomputeOutcome::Skipped(RecomputeSkipped {
            subject: a_subject(),
            reason: SkipReason::NotRequested,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "skipped");
        assert_eq!(json["reason"], "not-requested");
        assert!(json["subject"]["dateOfBirth"].is_string());
    }

    #[test]
    fn annotated_record_flattens_and_omits_absent_percentiles() {
        let now = Utc::now();
        let annotated = AnnotatedRecord {
            record: GrowthRecord {
                id: Uuid::new_v4(),
                subject_id: Uuid::new_v4(),
                owner_id: "user-1".to_string(),
                measurement_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                measurements: Default::default(),
                percentiles: None,
                source: MeasurementSource::Manual,
                synthetic: false,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            calculated_percentiles: None,
        };
        let json = serde_json::to_value(&annotated).unwrap();
        assert!(json.get("measurementDate").is_some());
        assert!(json.get("calculatedPercentiles").is_none());
        assert!(json.get("record").is_none());
    }

    #[test]
    fn outcome_scope_matches_variant() {
        let skipped = RecomputeOutcome::Skipped(RecomputeSkipped {
            subject: a_subject(),
            reason: SkipReason::NoRelevantChanges,
        });
        assert_eq!(skipped.scope(), RecomputeScope::None);
    }
}
