use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use nido_core::constants::MAX_TRANSACT_ITEMS;
use nido_core::errors::{NidoResult, StorageError};
use nido_core::records::{GrowthRecord, PercentileSet, Subject};
use nido_core::traits::{IRecordStore, PageToken, RecordPage, WriteOp};

#[derive(Default)]
struct StoreInner {
    subjects: HashMap<Uuid, Subject>,
    records: HashMap<Uuid, GrowthRecord>,
    /// Record ids whose next percentile write fails (partial-failure tests).
    fail_percentile_writes: HashSet<Uuid>,
    /// When set, the next transact_write fails before applying anything.
    fail_next_transact: bool,
    /// Item count of every transact_write call, in order.
    transact_sizes: Vec<usize>,
}

/// In-memory `IRecordStore` with all-or-nothing transactional writes and a
/// configurable item ceiling.
pub struct MemoryRecordStore {
    inner: Mutex<StoreInner>,
    ceiling: usize,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_ceiling(MAX_TRANSACT_ITEMS)
    }

    /// Lowered ceilings make chunking observable with small datasets.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            ceiling,
        }
    }

    pub fn insert_subject(&self, subject: Subject) {
        self.inner
            .lock()
            .unwrap()
            .subjects
            .insert(subject.id, subject);
    }

    pub fn insert_record(&self, record: GrowthRecord) {
        self.inner.lock().unwrap().records.insert(record.id, record);
    }

    /// Test inspection: current subject state.
    pub fn subject(&self, id: Uuid) -> Option<Subject> {
        self.inner.lock().unwrap().subjects.get(&id).cloned()
    }

    /// Test inspection: current record state.
    pub fn record(&self, id: Uuid) -> Option<GrowthRecord> {
        self.inner.lock().unwrap().records.get(&id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Fail the next percentile write for this record.
    pub fn fail_percentile_write(&self, record_id: Uuid) {
        self.inner
            .lock()
            .unwrap()
            .fail_percentile_writes
            .insert(record_id);
    }

    /// Fail the next transactional write outright, with nothing applied.
    pub fn fail_next_transact(&self) {
        self.inner.lock().unwrap().fail_next_transact = true;
    }

    /// Item counts of all transactional writes, in call order.
    pub fn transact_sizes(&self) -> Vec<usize> {
        self.inner.lock().unwrap().transact_sizes.clone()
    }
}

impl IRecordStore for MemoryRecordStore {
    fn get_subject(&self, id: Uuid) -> NidoResult<Option<Subject>> {
        Ok(self.inner.lock().unwrap().subjects.get(&id).cloned())
    }

    fn put_subject(&self, subject: &Subject) -> NidoResult<()> {
        self.inner
            .lock()
            .unwrap()
            .subjects
            .insert(subject.id, subject.clone());
        Ok(())
    }

    fn set_birth_percentiles(
        &self,
        subject_id: Uuid,
        percentiles: &PercentileSet,
        modified_at: DateTime<Utc>,
    ) -> NidoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let subject = inner
            .subjects
            .get_mut(&subject_id)
            .ok_or(StorageError::SubjectNotFound(subject_id))?;
        subject.birth_percentiles = Some(percentiles.clone());
        subject.modified_at = modified_at;
        Ok(())
    }

    fn get_record(&self, id: Uuid) -> NidoResult<Option<GrowthRecord>> {
        Ok(self.inner.lock().unwrap().records.get(&id).cloned())
    }

    fn get_record_consistent(&self, id: Uuid) -> NidoResult<Option<GrowthRecord>> {
        // A single in-process map is always strongly consistent.
        self.get_record(id)
    }

    fn put_record(&self, record: &GrowthRecord) -> NidoResult<()> {
        self.inner
            .lock()
            .unwrap()
            .records
            .insert(record.id, record.clone());
        Ok(())
    }

    fn delete_record(&self, id: Uuid) -> NidoResult<()> {
        self.inner.lock().unwrap().records.remove(&id);
        Ok(())
    }

    fn set_record_percentiles(
        &self,
        record_id: Uuid,
        percentiles: &PercentileSet,
        updated_at: DateTime<Utc>,
    ) -> NidoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_percentile_writes.remove(&record_id) {
            return Err(StorageError::Unavailable("injected write failure".to_string()).into());
        }
        let record = inner
            .records
            .get_mut(&record_id)
            .ok_or(StorageError::RecordNotFound(record_id))?;
        record.percentiles = Some(percentiles.clone());
        record.updated_at = updated_at;
        Ok(())
    }

    fn set_record_measurement_date(
        &self,
        record_id: Uuid,
        measurement_date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> NidoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .get_mut(&record_id)
            .ok_or(StorageError::RecordNotFound(record_id))?;
        record.measurement_date = measurement_date;
        record.updated_at = updated_at;
        Ok(())
    }

    fn query_by_subject(
        &self,
        subject_id: Uuid,
        page: Option<PageToken>,
        limit: usize,
    ) -> NidoResult<RecordPage> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<GrowthRecord> = inner
            .records
            .values()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        // Measurement date descending, id as a stable tiebreak.
        records.sort_by(|a, b| {
            b.measurement_date
                .cmp(&a.measurement_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset = match page {
            Some(PageToken(token)) => token.parse::<usize>().map_err(|_| {
                StorageError::ConditionFailed(format!("bad page token: {token}"))
            })?,
            None => 0,
        };
        let page_records: Vec<GrowthRecord> =
            records.iter().skip(offset).take(limit).cloned().collect();
        let consumed = offset + page_records.len();
        let next = (consumed < records.len()).then(|| PageToken(consumed.to_string()));

        Ok(RecordPage {
            records: page_records,
            next,
        })
    }

    fn transact_write(&self, ops: &[WriteOp]) -> NidoResult<()> {
        if ops.len() > self.ceiling {
            return Err(StorageError::TransactionTooLarge {
                items: ops.len(),
                ceiling: self.ceiling,
            }
            .into());
        }
        // One lock held across all ops makes the batch atomic; nothing below
        // can fail, so all-or-nothing holds trivially.
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_transact {
            inner.fail_next_transact = false;
            return Err(StorageError::TransactionFailed {
                reason: "injected transaction failure".to_string(),
            }
            .into());
        }
        inner.transact_sizes.push(ops.len());
        for op in ops {
            match op {
                WriteOp::PutRecord(record) => {
                    inner.records.insert(record.id, record.clone());
                }
                WriteOp::DeleteRecord { record_id } => {
                    inner.records.remove(record_id);
                }
                WriteOp::ClearRecordPercentiles { record_id } => {
                    if let Some(record) = inner.records.get_mut(record_id) {
                        record.percentiles = None;
                    }
                }
                WriteOp::SetBirthPointerIfAbsent { subject_id, record_id } => {
                    if let Some(subject) = inner.subjects.get_mut(subject_id) {
                        if subject.birth_record_id.is_none() {
                            subject.birth_record_id = Some(*record_id);
                        }
                    }
                }
                WriteOp::ClearBirthPointer { subject_id } => {
                    if let Some(subject) = inner.subjects.get_mut(subject_id) {
                        subject.birth_record_id = None;
                    }
                }
            }
        }
        Ok(())
    }

    fn max_transact_items(&self) -> usize {
        self.ceiling
    }
}
