use std::sync::Arc;

use chrono::NaiveDate;

use nido_core::config::ProjectionConfig;
use nido_core::errors::{NidoError, StorageError};
use nido_core::models::ChangeEvent;
use nido_core::records::{MeasurementSource, MeasurementType, Sex};
use nido_projection::{BirthAction, BirthMeasurementProjector};
use test_fixtures::{growth_record, subject, MemoryRecordStore, RecordingDispatch};

fn dob() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn projector_with_ceiling(
    ceiling: usize,
) -> (
    Arc<MemoryRecordStore>,
    Arc<RecordingDispatch>,
    BirthMeasurementProjector,
) {
    let store = Arc::new(MemoryRecordStore::with_ceiling(ceiling));
    let dispatch = Arc::new(RecordingDispatch::new());
    let config = ProjectionConfig {
        transact_ceiling: ceiling,
        ..ProjectionConfig::default()
    };
    let projector = BirthMeasurementProjector::new(store.clone(), dispatch.clone(), config);
    (store, dispatch, projector)
}

fn projector() -> (
    Arc<MemoryRecordStore>,
    Arc<RecordingDispatch>,
    BirthMeasurementProjector,
) {
    projector_with_ceiling(25)
}

#[test]
fn insert_with_birth_weight_materializes_birth_record_and_pointer() {
    let (store, _dispatch, projector) = projector();
    let mut s = subject("Mia", Sex::Female, dob());
    s.birth_weight = Some(3300.0);
    store.insert_subject(s.clone());

    let report = projector.apply(&ChangeEvent::insert(s.clone())).unwrap();

    let record_id = match report.birth {
        BirthAction::Upserted { record_id } => record_id,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert!(report.invalidation.is_none());

    let record = store.record(record_id).unwrap();
    assert_eq!(record.measurement_date, dob());
    assert_eq!(record.source, MeasurementSource::Birth);
    assert_eq!(record.measurements.get(MeasurementType::Weight), Some(3300.0));
    // Cache left absent on purpose: that is the recompute trigger.
    assert!(record.percentiles.is_none());

    assert_eq!(store.subject(s.id).unwrap().birth_record_id, Some(record_id));
    // Record put and pointer set travel in one atomic write.
    assert_eq!(store.transact_sizes(), vec![2]);
}

#[test]
fn redelivering_the_pointer_less_insert_event_creates_no_duplicate() {
    let (store, _dispatch, projector) = projector();
    let mut s = subject("Una", Sex::Female, dob());
    s.birth_weight = Some(3300.0);
    store.insert_subject(s.clone());

    // At-least-once delivery: the very same insert event arrives twice,
    // both times with an image that predates the pointer write.
    let event = ChangeEvent::insert(s.clone());
    let first = projector.apply(&event).unwrap();
    let second = projector.apply(&event).unwrap();

    let first_id = match first.birth {
        BirthAction::Upserted { record_id } => record_id,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert_eq!(second.birth, BirthAction::Upserted { record_id: first_id });
    assert_eq!(store.record_count(), 1);
    assert_eq!(store.subject(s.id).unwrap().birth_record_id, Some(first_id));
}

#[test]
fn replaying_the_event_keeps_a_single_birth_record() {
    let (store, _dispatch, projector) = projector();
    let mut s = subject("Leo", Sex::Male, dob());
    s.birth_weight = Some(3500.0);
    store.insert_subject(s.clone());

    let first = projector.apply(&ChangeEvent::insert(s.clone())).unwrap();
    let first_id = match first.birth {
        BirthAction::Upserted { record_id } => record_id,
        other => panic!("expected upsert, got {other:?}"),
    };
    let created_at = store.record(first_id).unwrap().created_at;

    // The pointer write itself surfaces as a MODIFY whose image carries it.
    let pointed = store.subject(s.id).unwrap();
    let second = projector
        .apply(&ChangeEvent::modify(s.clone(), pointed))
        .unwrap();

    assert_eq!(second.birth, BirthAction::Upserted { record_id: first_id });
    assert_eq!(store.record_count(), 1);
    assert_eq!(store.record(first_id).unwrap().created_at, created_at);
}

#[test]
fn clearing_all_birth_values_deletes_record_and_pointer() {
    let (store, _dispatch, projector) = projector();
    let mut before = subject("Ada", Sex::Female, dob());
    before.birth_weight = Some(3300.0);
    let birth_record = growth_record(
        &before,
        dob(),
        [(MeasurementType::Weight, 3300.0)].into_iter().collect(),
    );
    before.birth_record_id = Some(birth_record.id);
    store.insert_subject(before.clone());
    store.insert_record(birth_record.clone());

    let mut after = before.clone();
    after.birth_weight = None;

    let report = projector
        .apply(&ChangeEvent::modify(before, after.clone()))
        .unwrap();

    assert_eq!(
        report.birth,
        BirthAction::Deleted { record_id: birth_record.id }
    );
    assert_eq!(store.record_count(), 0);
    assert_eq!(store.subject(after.id).unwrap().birth_record_id, None);

    // Replay against the already-clean state is harmless.
    let replay = projector
        .apply(&ChangeEvent::modify(after.clone(), after.clone()))
        .unwrap();
    assert_eq!(
        replay.birth,
        BirthAction::Deleted { record_id: birth_record.id }
    );
    assert_eq!(store.record_count(), 0);
}

#[test]
fn no_birth_values_and_no_pointer_is_a_noop() {
    let (store, dispatch, projector) = projector();
    let s = subject("Ben", Sex::Male, dob());
    store.insert_subject(s.clone());

    let report = projector.apply(&ChangeEvent::insert(s)).unwrap();

    assert_eq!(report.birth, BirthAction::Unchanged);
    assert!(report.invalidation.is_none());
    assert!(store.transact_sizes().is_empty());
    assert!(dispatch.dispatched().is_empty());
}

#[test]
fn sex_change_cascade_chunks_batches_and_dispatches_per_record() {
    let (store, dispatch, projector) = projector_with_ceiling(2);
    let mut before = subject("Ivy", Sex::Male, dob());
    store.insert_subject(before.clone());

    let mut record_ids = Vec::new();
    for month in 1..=5u32 {
        let date = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
        let mut record = growth_record(
            &before,
            date,
            [(MeasurementType::Weight, 5000.0)].into_iter().collect(),
        );
        record.percentiles = Some([(MeasurementType::Weight, 50.0)].into_iter().collect());
        record_ids.push(record.id);
        store.insert_record(record);
    }

    let mut after = before.clone();
    after.sex = Sex::Female;

    let report = projector.apply(&ChangeEvent::modify(before, after)).unwrap();

    let summary = report.invalidation.unwrap();
    assert_eq!(summary.cleared, 5);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.dispatch_failures, 0);
    // 5 records under a ceiling of 2 means batches of 2, 2, 1.
    assert_eq!(store.transact_sizes(), vec![2, 2, 1]);

    for id in &record_ids {
        assert!(store.record(*id).unwrap().percentiles.is_none());
    }
    let mut dispatched = dispatch.dispatched();
    dispatched.sort();
    record_ids.sort();
    assert_eq!(dispatched, record_ids);
}

#[test]
fn dispatch_failure_is_counted_but_caches_still_clear() {
    let (store, dispatch, projector) = projector();
    let before = subject("Zoe", Sex::Female, dob());
    store.insert_subject(before.clone());

    let mut record = growth_record(
        &before,
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        [(MeasurementType::Height, 58.0)].into_iter().collect(),
    );
    record.percentiles = Some([(MeasurementType::Height, 50.0)].into_iter().collect());
    let record_id = record.id;
    store.insert_record(record);
    dispatch.fail_all();

    let mut after = before.clone();
    after.date_of_birth = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let report = projector.apply(&ChangeEvent::modify(before, after)).unwrap();

    let summary = report.invalidation.unwrap();
    assert_eq!(summary.cleared, 1);
    assert_eq!(summary.dispatch_failures, 1);
    // The cleared cache stays the durable signal despite the lost dispatch.
    assert!(store.record(record_id).unwrap().percentiles.is_none());
}

#[test]
fn failed_upsert_transaction_leaves_no_partial_state() {
    let (store, _dispatch, projector) = projector();
    let mut s = subject("Ora", Sex::Female, dob());
    s.birth_weight = Some(3300.0);
    store.insert_subject(s.clone());
    store.fail_next_transact();

    let err = projector.apply(&ChangeEvent::insert(s.clone())).unwrap_err();

    assert!(matches!(
        err,
        NidoError::Storage(StorageError::TransactionFailed { .. })
    ));
    // Neither the record nor the pointer landed alone.
    assert_eq!(store.record_count(), 0);
    assert_eq!(store.subject(s.id).unwrap().birth_record_id, None);
}

#[test]
fn unrelated_field_change_skips_invalidation() {
    let (store, dispatch, projector) = projector();
    let before = subject("Kai", Sex::Male, dob());
    store.insert_subject(before.clone());
    let mut record = growth_record(
        &before,
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        [(MeasurementType::Weight, 4500.0)].into_iter().collect(),
    );
    record.percentiles = Some([(MeasurementType::Weight, 50.0)].into_iter().collect());
    let record_id = record.id;
    store.insert_record(record);

    let mut after = before.clone();
    after.name = "Kai Jr".to_string();

    let report = projector.apply(&ChangeEvent::modify(before, after)).unwrap();

    assert!(report.invalidation.is_none());
    assert!(store.record(record_id).unwrap().percentiles.is_some());
    assert!(dispatch.dispatched().is_empty());
}
