//! BirthMeasurementProjector: one subject change event in, a consistent
//! canonical birth record out.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nido_core::config::ProjectionConfig;
use nido_core::errors::NidoResult;
use nido_core::models::ChangeEvent;
use nido_core::records::{GrowthRecord, MeasurementSource, Measurements, Subject};
use nido_core::traits::{IRecomputeDispatch, IRecordStore, WriteOp};

use crate::invalidation::{InvalidationSummary, PercentileInvalidator};

/// What happened to the canonical birth record for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BirthAction {
    /// Birth record created or replaced; pointer ensured.
    Upserted { record_id: Uuid },
    /// Birth record deleted; pointer cleared.
    Deleted { record_id: Uuid },
    /// Nothing to reconcile.
    Unchanged,
}

/// Outcome of projecting one change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionReport {
    pub birth: BirthAction,
    pub invalidation: Option<InvalidationSummary>,
}

pub struct BirthMeasurementProjector {
    store: Arc<dyn IRecordStore>,
    invalidator: PercentileInvalidator,
}

impl BirthMeasurementProjector {
    pub fn new(
        store: Arc<dyn IRecordStore>,
        dispatch: Arc<dyn IRecomputeDispatch>,
        config: ProjectionConfig,
    ) -> Self {
        let invalidator = PercentileInvalidator::new(store.clone(), dispatch, config);
        Self { store, invalidator }
    }

    /// Project one change event from the subject feed.
    ///
    /// Reconciles the canonical birth record against the after-image, then
    /// runs cascade invalidation when sex or date of birth moved. Replaying
    /// the same event converges: the upsert keys on a stable record id,
    /// the delete tolerates an absent record, and clearing an absent cache
    /// changes nothing.
    pub fn apply(&self, event: &ChangeEvent) -> NidoResult<ProjectionReport> {
        let Some(after) = &event.after else {
            // Subject deletions carry no after-image; record cleanup is the
            // owning service's concern, not this projection's.
            return Ok(ProjectionReport {
                birth: BirthAction::Unchanged,
                invalidation: None,
            });
        };

        let birth_values = after.birth_measurements().normalized();
        let birth = if birth_values.has_any_positive() {
            self.upsert_birth_record(after, birth_values)?
        } else if let Some(record_id) = after.birth_record_id {
            self.delete_birth_record(after.id, record_id)?
        } else {
            BirthAction::Unchanged
        };

        let invalidation = if event.reference_inputs_changed() {
            Some(self.invalidator.invalidate_subject(after.id)?)
        } else {
            None
        };

        Ok(ProjectionReport {
            birth,
            invalidation,
        })
    }

    /// Create or replace the canonical birth record and ensure the subject
    /// points at it, in one atomic write. The percentile cache is left
    /// absent on purpose: that absence is the recompute trigger.
    fn upsert_birth_record(
        &self,
        subject: &Subject,
        measurements: Measurements,
    ) -> NidoResult<BirthAction> {
        let record_id = match subject.birth_record_id {
            Some(record_id) => record_id,
            // The first insert event predates the pointer write, so its
            // image alone cannot tell a replay from a fresh insert; the
            // stored subject can. Only mint a new id when neither knows
            // of a birth record.
            None => self
                .store
                .get_subject(subject.id)?
                .and_then(|current| current.birth_record_id)
                .unwrap_or_else(Uuid::new_v4),
        };
        let now = Utc::now();
        let created_at = match self.store.get_record(record_id)? {
            Some(existing) => existing.created_at,
            None => now,
        };

        let record = GrowthRecord {
            id: record_id,
            subject_id: subject.id,
            owner_id: subject.owner_id.clone(),
            measurement_date: subject.date_of_birth,
            measurements,
            percentiles: None,
            source: MeasurementSource::Birth,
            synthetic: false,
            notes: None,
            created_at,
            updated_at: now,
        };

        // Record and pointer land together or not at all; a lone record
        // would be orphaned, a lone pointer would dangle.
        self.store.transact_write(&[
            WriteOp::PutRecord(record),
            WriteOp::SetBirthPointerIfAbsent {
                subject_id: subject.id,
                record_id,
            },
        ])?;

        tracing::info!(
            subject_id = %subject.id,
            record_id = %record_id,
            "canonical birth record upserted"
        );
        Ok(BirthAction::Upserted { record_id })
    }

    /// All birth values gone: drop the record and the pointer atomically.
    fn delete_birth_record(&self, subject_id: Uuid, record_id: Uuid) -> NidoResult<BirthAction> {
        self.store.transact_write(&[
            WriteOp::DeleteRecord { record_id },
            WriteOp::ClearBirthPointer { subject_id },
        ])?;

        tracing::info!(
            subject_id = %subject_id,
            record_id = %record_id,
            "canonical birth record removed"
        );
        Ok(BirthAction::Deleted { record_id })
    }
}
