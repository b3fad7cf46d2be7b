//! Cascade invalidation: clear every cached percentile a subject owns, in
//! bounded atomic batches, then nudge each record toward recompute.

use std::sync::Arc;

use uuid::Uuid;

use nido_core::config::ProjectionConfig;
use nido_core::errors::NidoResult;
use nido_core::traits::{IRecomputeDispatch, IRecordStore, WriteOp};

/// What one cascade did: caches cleared, atomic batches written, and how
/// many recompute dispatches could not be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationSummary {
    pub cleared: usize,
    pub batches: usize,
    pub dispatch_failures: usize,
}

pub struct PercentileInvalidator {
    store: Arc<dyn IRecordStore>,
    dispatch: Arc<dyn IRecomputeDispatch>,
    config: ProjectionConfig,
}

impl PercentileInvalidator {
    pub fn new(
        store: Arc<dyn IRecordStore>,
        dispatch: Arc<dyn IRecomputeDispatch>,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            store,
            dispatch,
            config,
        }
    }

    /// Remove the percentile cache of every growth record the subject owns.
    ///
    /// Records are paged through the secondary index, then cleared in
    /// `⌈N/ceiling⌉` atomic batches. Clearing an already-absent cache is a
    /// no-op in effect, so replays are harmless. After each batch commits,
    /// a fire-and-forget recompute is dispatched per record; a failed
    /// dispatch is logged and counted, never retried — the missing cache
    /// remains the durable signal that recompute is still owed.
    pub fn invalidate_subject(&self, subject_id: Uuid) -> NidoResult<InvalidationSummary> {
        let record_ids = self.collect_record_ids(subject_id)?;
        let ceiling = self
            .config
            .transact_ceiling
            .min(self.store.max_transact_items())
            .max(1);

        let mut summary = InvalidationSummary::default();
        for chunk in record_ids.chunks(ceiling) {
            let ops: Vec<WriteOp> = chunk
                .iter()
                .map(|record_id| WriteOp::ClearRecordPercentiles {
                    record_id: *record_id,
                })
                .collect();
            self.store.transact_write(&ops)?;
            summary.batches += 1;
            summary.cleared += chunk.len();

            // Dispatch only after the clears are durable.
            for record_id in chunk {
                if let Err(err) = self.dispatch.dispatch(*record_id) {
                    tracing::warn!(record_id = %record_id, error = %err, "recompute dispatch failed");
                    summary.dispatch_failures += 1;
                }
            }
        }

        tracing::info!(
            subject_id = %subject_id,
            cleared = summary.cleared,
            batches = summary.batches,
            dispatch_failures = summary.dispatch_failures,
            "percentile cascade invalidation finished"
        );
        Ok(summary)
    }

    fn collect_record_ids(&self, subject_id: Uuid) -> NidoResult<Vec<Uuid>> {
        let mut ids = Vec::new();
        let mut page = None;
        loop {
            let result = self.store.query_by_subject(
                subject_id,
                page,
                self.config.invalidation_page_size,
            )?;
            ids.extend(result.records.iter().map(|r| r.id));
            match result.next {
                Some(next) => page = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }
}
