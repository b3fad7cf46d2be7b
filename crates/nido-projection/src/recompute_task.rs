//! Per-record asynchronous recompute, triggered out-of-band after a cache
//! invalidation or a record change.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use nido_core::errors::NidoResult;
use nido_core::records::{GrowthRecord, Subject};
use nido_core::traits::IRecordStore;
use nido_percentile::PercentileCalculator;

/// Terminal state of one task run. Every variant is a valid end state; the
/// task never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Fresh percentiles persisted.
    Updated,
    /// Fresh percentiles equal the stored ones at 2 decimals; no write.
    /// This is what stops a write-event-recompute-write cycle.
    Unchanged,
    /// Record gone by the time the task ran.
    RecordMissing,
    /// Owning subject gone or inactive.
    SubjectMissing,
    /// Measurement date precedes the date of birth even after realignment.
    InvalidDate,
    /// No computable measurement values.
    NothingToCompute,
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskOutcome::Updated => "updated",
            TaskOutcome::Unchanged => "unchanged",
            TaskOutcome::RecordMissing => "record missing",
            TaskOutcome::SubjectMissing => "subject missing",
            TaskOutcome::InvalidDate => "invalid date",
            TaskOutcome::NothingToCompute => "nothing to compute",
        };
        f.write_str(s)
    }
}

pub struct RecordRecomputeTask {
    store: Arc<dyn IRecordStore>,
    calculator: Arc<PercentileCalculator>,
}

impl RecordRecomputeTask {
    pub fn new(store: Arc<dyn IRecordStore>, calculator: Arc<PercentileCalculator>) -> Self {
        Self { store, calculator }
    }

    /// Recompute one record's percentiles from current store state.
    ///
    /// Reads are strongly consistent: the task often runs moments after the
    /// write that triggered it, and a replica lag here would recompute
    /// against the very staleness it is meant to fix. The write is skipped
    /// when the result matches the stored cache at 2 decimals.
    pub fn run(&self, record_id: Uuid) -> NidoResult<TaskOutcome> {
        let Some(mut record) = self.store.get_record_consistent(record_id)? else {
            tracing::info!(record_id = %record_id, "record vanished before recompute");
            return Ok(TaskOutcome::RecordMissing);
        };

        let subject = match self.store.get_subject(record.subject_id)? {
            Some(subject) if subject.is_active => subject,
            _ => {
                tracing::warn!(
                    record_id = %record_id,
                    subject_id = %record.subject_id,
                    "subject missing or inactive; leaving cache empty"
                );
                return Ok(TaskOutcome::SubjectMissing);
            }
        };

        self.realign_birth_date(&subject, &mut record);

        let computed = self.calculator.compute_all(
            subject.sex,
            subject.date_of_birth,
            record.measurement_date,
            &record.measurements,
        );
        let fresh = match computed {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::warn!(record_id = %record_id, error = %err, "recompute failed");
                return Ok(TaskOutcome::InvalidDate);
            }
        };
        if fresh.is_empty() {
            return Ok(TaskOutcome::NothingToCompute);
        }

        if let Some(stored) = &record.percentiles {
            if stored.rounded_eq(&fresh) {
                tracing::info!(record_id = %record_id, "percentiles unchanged; skipping write");
                return Ok(TaskOutcome::Unchanged);
            }
        }

        self.store
            .set_record_percentiles(record_id, &fresh, Utc::now())?;
        tracing::info!(record_id = %record_id, "percentile cache refreshed");
        Ok(TaskOutcome::Updated)
    }

    /// The canonical birth record tracks the date of birth; if the two have
    /// drifted, realign before computing and persist the new date so both
    /// recompute paths settle on the same record state.
    fn realign_birth_date(&self, subject: &Subject, record: &mut GrowthRecord) {
        if subject.birth_record_id != Some(record.id) {
            return;
        }
        if record.measurement_date == subject.date_of_birth {
            return;
        }
        tracing::info!(
            record_id = %record.id,
            old_date = %record.measurement_date,
            new_date = %subject.date_of_birth,
            "realigning birth record date"
        );
        record.measurement_date = subject.date_of_birth;
        if let Err(err) =
            self.store
                .set_record_measurement_date(record.id, subject.date_of_birth, Utc::now())
        {
            tracing::warn!(record_id = %record.id, error = %err, "birth-date realignment write failed");
        }
    }
}
