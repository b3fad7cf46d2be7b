use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::NidoResult;
use crate::records::{GrowthRecord, PercentileSet, Subject};

/// Opaque pagination cursor for secondary-index queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(pub String);

/// One page of growth records, sorted by measurement date descending.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<GrowthRecord>,
    pub next: Option<PageToken>,
}

/// One operation inside an atomic multi-item write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Full put of a growth record (create or replace).
    PutRecord(GrowthRecord),
    /// Delete a growth record; deleting an absent record is a no-op.
    DeleteRecord { record_id: Uuid },
    /// Remove the percentile cache, marking the record stale.
    ClearRecordPercentiles { record_id: Uuid },
    /// Set the subject's birth-record pointer only if it is not already set.
    SetBirthPointerIfAbsent { subject_id: Uuid, record_id: Uuid },
    /// Clear the subject's birth-record pointer.
    ClearBirthPointer { subject_id: Uuid },
}

/// Record-store boundary. The store must support atomic multi-item writes
/// (bounded by `max_transact_items`) and strongly-consistent point reads.
///
/// Concurrent writers race last-write-wins per field; no row locks are
/// taken. The percentile cache is always recomputable from current state,
/// so staleness is self-healing rather than locked out.
pub trait IRecordStore: Send + Sync {
    // --- Subjects ---
    fn get_subject(&self, id: Uuid) -> NidoResult<Option<Subject>>;
    fn put_subject(&self, subject: &Subject) -> NidoResult<()>;
    /// Persist recomputed birth percentiles onto the subject.
    fn set_birth_percentiles(
        &self,
        subject_id: Uuid,
        percentiles: &PercentileSet,
        modified_at: DateTime<Utc>,
    ) -> NidoResult<()>;

    // --- Growth records ---
    fn get_record(&self, id: Uuid) -> NidoResult<Option<GrowthRecord>>;
    /// Strongly-consistent point read, required by the stale-date retry.
    fn get_record_consistent(&self, id: Uuid) -> NidoResult<Option<GrowthRecord>>;
    fn put_record(&self, record: &GrowthRecord) -> NidoResult<()>;
    fn delete_record(&self, id: Uuid) -> NidoResult<()>;
    /// Persist a recomputed percentile cache for one record.
    fn set_record_percentiles(
        &self,
        record_id: Uuid,
        percentiles: &PercentileSet,
        updated_at: DateTime<Utc>,
    ) -> NidoResult<()>;
    /// Persist a realigned measurement date for one record.
    fn set_record_measurement_date(
        &self,
        record_id: Uuid,
        measurement_date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> NidoResult<()>;

    // --- Secondary index ---
    /// Page through a subject's growth records, sorted by measurement date
    /// descending.
    fn query_by_subject(
        &self,
        subject_id: Uuid,
        page: Option<PageToken>,
        limit: usize,
    ) -> NidoResult<RecordPage>;

    // --- Transactions ---
    /// Atomic multi-item write: every operation succeeds or none do.
    /// Fails with `StorageError::TransactionTooLarge` beyond
    /// `max_transact_items`; the caller owns chunking.
    fn transact_write(&self, ops: &[WriteOp]) -> NidoResult<()>;
    /// Platform ceiling on items per `transact_write` call.
    fn max_transact_items(&self) -> usize;
}
