//! Growth-record change observer: decides whether a record event owes a
//! recompute, and runs the per-record task when it does.

use serde::{Deserialize, Serialize};

use nido_core::errors::NidoResult;
use nido_core::records::GrowthRecord;

use crate::recompute_task::{RecordRecomputeTask, TaskOutcome};

/// Before/after images of a growth-record mutation from the record feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthChangeEvent {
    pub before: Option<GrowthRecord>,
    pub after: Option<GrowthRecord>,
}

impl GrowthChangeEvent {
    pub fn insert(after: GrowthRecord) -> Self {
        Self { before: None, after: Some(after) }
    }

    pub fn modify(before: GrowthRecord, after: GrowthRecord) -> Self {
        Self { before: Some(before), after: Some(after) }
    }
}

pub struct GrowthChangeObserver {
    task: RecordRecomputeTask,
}

impl GrowthChangeObserver {
    pub fn new(task: RecordRecomputeTask) -> Self {
        Self { task }
    }

    /// Run the recompute task when the event warrants it.
    ///
    /// A recompute is owed on insert, when a measurement moved at 2
    /// decimals, or when the percentile cache is absent. Everything else —
    /// notably the MODIFY the task's own cache write produces — is ignored,
    /// which is the other half of the loop-prevention story.
    pub fn observe(&self, event: &GrowthChangeEvent) -> NidoResult<Option<TaskOutcome>> {
        let Some(after) = &event.after else {
            return Ok(None);
        };
        if !needs_recompute(event.before.as_ref(), after) {
            tracing::debug!(record_id = %after.id, "record change owes no recompute");
            return Ok(None);
        }
        self.task.run(after.id).map(Some)
    }
}

fn needs_recompute(before: Option<&GrowthRecord>, after: &GrowthRecord) -> bool {
    if after.is_stale() {
        return true;
    }
    match before {
        None => true,
        Some(before) => !before.measurements.rounded_eq(&after.measurements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use nido_core::records::{MeasurementSource, MeasurementType, Measurements, PercentileSet};
    use uuid::Uuid;

    fn record(weight: f64, cached: bool) -> GrowthRecord {
        let now = Utc::now();
        let percentiles = cached.then(|| {
            [(MeasurementType::Weight, 50.0)]
                .into_iter()
                .collect::<PercentileSet>()
        });
        GrowthRecord {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            owner_id: "user-1".to_string(),
            measurement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            measurements: [(MeasurementType::Weight, weight)].into_iter().collect(),
            percentiles,
            source: MeasurementSource::Manual,
            synthetic: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn insert_always_owes_recompute() {
        let after = record(3500.0, true);
        assert!(needs_recompute(None, &after));
    }

    #[test]
    fn missing_cache_owes_recompute() {
        let before = record(3500.0, true);
        let after = record(3500.0, false);
        assert!(needs_recompute(Some(&before), &after));
    }

    #[test]
    fn measurement_shift_owes_recompute() {
        let before = record(3500.0, true);
        let mut after = record(3600.0, true);
        after.id = before.id;
        assert!(needs_recompute(Some(&before), &after));
    }

    #[test]
    fn sub_centesimal_noise_does_not() {
        let before = record(3500.001, true);
        let mut after = record(3500.004, true);
        after.id = before.id;
        assert!(!needs_recompute(Some(&before), &after));
    }

    #[test]
    fn cache_write_echo_is_ignored() {
        // The task's own percentile write comes back as a MODIFY with the
        // same measurements and a present cache.
        let before = record(3500.0, false);
        let mut after = record(3500.0, true);
        after.id = before.id;
        assert!(!needs_recompute(Some(&before), &after));
    }

    #[test]
    fn no_measurements_key_mismatch_triggers() {
        let before = record(3500.0, true);
        let mut after = before.clone();
        after.measurements = Measurements::new();
        // Cache still present but a value disappeared entirely.
        assert!(needs_recompute(Some(&before), &after));
    }
}
