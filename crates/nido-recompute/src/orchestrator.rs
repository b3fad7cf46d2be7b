//! RecomputeOrchestrator — runs entirely within one subject-update request.
//!
//! The subject's field changes are already committed before this runs, so a
//! recompute failure degrades to "subject updated, percentiles may be stale"
//! rather than rolling the request back.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use nido_core::config::RecomputeConfig;
use nido_core::errors::{NidoError, NidoResult, PercentileError, StorageError};
use nido_core::records::{
    GrowthRecord, MeasurementSource, PercentileSet, Subject, SubjectField,
};
use nido_core::traits::IRecordStore;
use nido_percentile::PercentileCalculator;

use crate::classifier::{classify, RecomputeScope};
use crate::outcome::{
    AnnotatedRecord, BirthOnlyRecompute, FullRecompute, RecomputeOutcome, RecomputeSkipped,
    RecordOutcome, RecordSkip, SkipReason,
};

/// Records fetched per page when walking a subject's history.
const FETCH_PAGE_SIZE: usize = 100;

pub struct RecomputeOrchestrator {
    store: Arc<dyn IRecordStore>,
    calculator: Arc<PercentileCalculator>,
    config: RecomputeConfig,
}

impl RecomputeOrchestrator {
    pub fn new(store: Arc<dyn IRecordStore>, calculator: Arc<PercentileCalculator>) -> Self {
        Self::with_config(store, calculator, RecomputeConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn IRecordStore>,
        calculator: Arc<PercentileCalculator>,
        config: RecomputeConfig,
    ) -> Self {
        Self {
            store,
            calculator,
            config,
        }
    }

    /// Synchronous recompute entry point.
    ///
    /// Called after the subject's field changes are persisted. Classifies
    /// the changed set, recomputes the implied records, and returns the
    /// refreshed data in one of three scope-keyed shapes.
    pub fn handle_subject_update(
        &self,
        subject_id: Uuid,
        owner_id: &str,
        changed: &BTreeSet<SubjectField>,
        sync: bool,
    ) -> NidoResult<RecomputeOutcome> {
        let subject = self.accessible_subject(subject_id, owner_id)?;

        if !sync {
            return Ok(RecomputeOutcome::Skipped(RecomputeSkipped {
                subject,
                reason: SkipReason::NotRequested,
            }));
        }

        let scope = classify(changed);
        tracing::info!(
            subject_id = %subject_id,
            ?changed,
            ?scope,
            "subject update classified"
        );

        match scope {
            RecomputeScope::Full => self.run_full(subject),
            RecomputeScope::BirthOnly => self.run_birth_only(subject),
            RecomputeScope::None => Ok(RecomputeOutcome::Skipped(RecomputeSkipped {
                subject,
                reason: SkipReason::NoRelevantChanges,
            })),
        }
    }

    /// Ownership/existence gate: inactive subjects are indistinguishable
    /// from absent ones for callers.
    fn accessible_subject(&self, subject_id: Uuid, owner_id: &str) -> NidoResult<Subject> {
        let subject = self
            .store
            .get_subject(subject_id)?
            .ok_or(StorageError::SubjectNotFound(subject_id))?;
        if subject.owner_id != owner_id {
            return Err(StorageError::AccessDenied {
                resource: "subject",
                id: subject_id,
            }
            .into());
        }
        if !subject.is_active {
            return Err(StorageError::SubjectNotFound(subject_id).into());
        }
        Ok(subject)
    }

    fn fetch_all_records(&self, subject_id: Uuid) -> NidoResult<Vec<GrowthRecord>> {
        let mut records = Vec::new();
        let mut page = None;
        loop {
            let result = self
                .store
                .query_by_subject(subject_id, page, FETCH_PAGE_SIZE)?;
            records.extend(result.records);
            match result.next {
                Some(next) => page = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    /// FULL scope: every growth record is reconsidered, each persisted
    /// independently — one record's failure never blocks its siblings.
    fn run_full(&self, mut subject: Subject) -> NidoResult<RecomputeOutcome> {
        let start = Instant::now();
        let records = self.fetch_all_records(subject.id)?;
        let total_considered = records.len();

        let mut updated_count = 0;
        let mut metrics_touched = BTreeSet::new();
        let mut annotated = Vec::with_capacity(total_considered);

        for mut record in records {
            self.realign_birth_record(&subject, &mut record);

            match self.recompute_record(&subject, &mut record) {
                RecordOutcome::Updated(percentiles) => {
                    updated_count += 1;
                    metrics_touched.extend(percentiles.types());
                    record.percentiles = Some(percentiles.clone());
                    annotated.push(AnnotatedRecord {
                        record,
                        calculated_percentiles: Some(percentiles),
                    });
                }
                RecordOutcome::Skipped(reason) => {
                    tracing::info!(
                        record_id = %record.id,
                        %reason,
                        "record skipped during full recompute"
                    );
                    annotated.push(AnnotatedRecord {
                        record,
                        calculated_percentiles: None,
                    });
                }
            }
        }

        self.refresh_birth_percentiles(&mut subject);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            subject_id = %subject.id,
            updated_count,
            total_considered,
            duration_ms,
            "full recompute finished"
        );

        Ok(RecomputeOutcome::Full(FullRecompute {
            subject,
            records: annotated,
            updated_count,
            total_considered,
            metrics_touched,
            duration_ms,
        }))
    }

    /// Realign the canonical birth record's measurement date to the current
    /// date of birth, persisting the alignment before recompute.
    fn realign_birth_record(&self, subject: &Subject, record: &mut GrowthRecord) {
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
            "realigning birth record to new date of birth"
        );
        record.measurement_date = subject.date_of_birth;
        if let Err(err) = self.store.set_record_measurement_date(
            record.id,
            subject.date_of_birth,
            Utc::now(),
        ) {
            tracing::warn!(record_id = %record.id, error = %err, "birth-date realignment write failed");
        }
    }

    /// Compute and persist one record's percentiles. An `InvalidDateRange`
    /// is retried once against a strongly-consistent read (the realignment
    /// race), then skipped.
    fn recompute_record(&self, subject: &Subject, record: &mut GrowthRecord) -> RecordOutcome {
        let computed = self.calculator.compute_all(
            subject.sex,
            subject.date_of_birth,
            record.measurement_date,
            &record.measurements,
        );

        let percentiles = match computed {
            Ok(percentiles) => percentiles,
            Err(NidoError::Percentile(PercentileError::InvalidDateRange { .. })) => {
                match self.retry_with_fresh_read(subject, record) {
                    Some(percentiles) => percentiles,
                    None => return RecordOutcome::Skipped(RecordSkip::StaleDate),
                }
            }
            Err(err) => {
                tracing::warn!(record_id = %record.id, error = %err, "record recompute failed");
                return RecordOutcome::Skipped(RecordSkip::EmptyResult);
            }
        };

        if percentiles.is_empty() {
            return RecordOutcome::Skipped(RecordSkip::EmptyResult);
        }

        match self
            .store
            .set_record_percentiles(record.id, &percentiles, Utc::now())
        {
            Ok(()) => RecordOutcome::Updated(percentiles),
            Err(err) => {
                tracing::error!(record_id = %record.id, error = %err, "percentile persist failed");
                RecordOutcome::Skipped(RecordSkip::PersistFailed)
            }
        }
    }

    /// Re-fetch the record with a strongly-consistent read and retry the
    /// computation. Returns `None` when the date is still invalid or the
    /// fresh read shows nothing new.
    fn retry_with_fresh_read(
        &self,
        subject: &Subject,
        record: &mut GrowthRecord,
    ) -> Option<PercentileSet> {
        for _ in 0..self.config.stale_date_retries {
            let fresh = match self.store.get_record_consistent(record.id) {
                Ok(Some(fresh)) => fresh,
                Ok(None) => return None,
                Err(err) => {
                    tracing::warn!(record_id = %record.id, error = %err, "consistent re-fetch failed");
                    return None;
                }
            };
            if fresh.measurement_date == record.measurement_date {
                tracing::warn!(
                    record_id = %record.id,
                    "unable to refresh stale measurement date"
                );
                return None;
            }
            record.measurement_date = fresh.measurement_date;
            record.measurements = fresh.measurements;
            match self.calculator.compute_all(
                subject.sex,
                subject.date_of_birth,
                record.measurement_date,
                &record.measurements,
            ) {
                Ok(percentiles) => {
                    tracing::info!(
                        record_id = %record.id,
                        refreshed_date = %record.measurement_date,
                        "retry after consistent re-fetch succeeded"
                    );
                    return Some(percentiles);
                }
                Err(err) => {
                    tracing::warn!(record_id = %record.id, error = %err, "retry after re-fetch failed");
                }
            }
        }
        None
    }

    /// Recompute and persist birth percentiles on the subject, when birth
    /// measurements exist. Failures here are logged, never fatal to the
    /// surrounding FULL batch.
    fn refresh_birth_percentiles(&self, subject: &mut Subject) {
        let birth = subject.birth_measurements();
        if !birth.has_any_positive() {
            return;
        }
        match self.calculator.compute_all(
            subject.sex,
            subject.date_of_birth,
            subject.date_of_birth,
            &birth,
        ) {
            Ok(percentiles) if !percentiles.is_empty() => {
                match self
                    .store
                    .set_birth_percentiles(subject.id, &percentiles, Utc::now())
                {
                    Ok(()) => subject.birth_percentiles = Some(percentiles),
                    Err(err) => {
                        tracing::error!(subject_id = %subject.id, error = %err, "birth percentile persist failed");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(subject_id = %subject.id, error = %err, "birth percentile compute failed");
            }
        }
    }

    /// BIRTH_ONLY scope: recompute birth percentiles and return one
    /// representative birth record, synthesized when the asynchronous
    /// projector has not materialized it yet.
    fn run_birth_only(&self, mut subject: Subject) -> NidoResult<RecomputeOutcome> {
        let birth = subject.birth_measurements();
        if !birth.has_any_positive() {
            return Ok(RecomputeOutcome::Skipped(RecomputeSkipped {
                subject,
                reason: SkipReason::NoBirthMeasurements,
            }));
        }

        let percentiles = self.calculator.compute_all(
            subject.sex,
            subject.date_of_birth,
            subject.date_of_birth,
            &birth,
        )?;
        if percentiles.is_empty() {
            return Ok(RecomputeOutcome::Skipped(RecomputeSkipped {
                subject,
                reason: SkipReason::NoBirthMeasurements,
            }));
        }

        // Unlike per-record writes in a FULL batch, this persist is the
        // whole point of the branch; its failure fails the request.
        self.store
            .set_birth_percentiles(subject.id, &percentiles, Utc::now())?;
        subject.birth_percentiles = Some(percentiles.clone());

        let mut record = self
            .existing_birth_record(&subject)
            .unwrap_or_else(|| synthesize_birth_record(&subject));
        record.percentiles = Some(percentiles.clone());

        Ok(RecomputeOutcome::BirthOnly(BirthOnlyRecompute {
            subject,
            birth_percentiles: percentiles,
            record,
        }))
    }

    /// The persisted birth record, if its date already matches the DOB.
    fn existing_birth_record(&self, subject: &Subject) -> Option<GrowthRecord> {
        let birth_id = subject.birth_record_id?;
        match self.store.get_record(birth_id) {
            Ok(Some(record)) if record.measurement_date == subject.date_of_birth => Some(record),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(record_id = %birth_id, error = %err, "birth record fetch failed");
                None
            }
        }
    }
}

/// In-memory stand-in for the birth record so the BIRTH_ONLY response is
/// self-consistent without waiting for the asynchronous path.
fn synthesize_birth_record(subject: &Subject) -> GrowthRecord {
    let now = Utc::now();
    GrowthRecord {
        id: subject.birth_record_id.unwrap_or_else(Uuid::new_v4),
        subject_id: subject.id,
        owner_id: subject.owner_id.clone(),
        measurement_date: subject.date_of_birth,
        measurements: subject.birth_measurements(),
        percentiles: None,
        source: MeasurementSource::Birth,
        synthetic: true,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
