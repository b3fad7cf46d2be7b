use std::sync::Arc;

use chrono::NaiveDate;

use nido_core::errors::{NidoError, PercentileError};
use nido_core::records::{MeasurementType, Measurements, Sex};
use nido_percentile::{PercentileCalculator, ReferenceTableProvider};
use test_fixtures::StaticReferenceSource;

fn calculator() -> PercentileCalculator {
    let provider = Arc::new(ReferenceTableProvider::new(Box::new(StaticReferenceSource)));
    PercentileCalculator::new(provider)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn median_weight_is_50th_percentile() {
    // Male weight table at day 0 has M = 3.5 kg; 3500 g sits on the median.
    let reading = calculator()
        .compute(MeasurementType::Weight, Sex::Male, 3500.0, 0)
        .unwrap();
    assert_eq!(reading.percentile, 50.0);
    assert_eq!(reading.zscore, 0.0);
    assert_eq!(reading.lms.m, 3.5);
}

#[test]
fn weight_converts_grams_to_kilograms() {
    // 7000 g at day 182 against M = 7.9 kg: below median, percentile < 50.
    let reading = calculator()
        .compute(MeasurementType::Weight, Sex::Male, 7000.0, 182)
        .unwrap();
    assert!(reading.percentile < 50.0);
    assert!(reading.percentile > 0.0);
}

#[test]
fn sex_selects_a_different_table_family() {
    let calc = calculator();
    let male = calc
        .compute(MeasurementType::Weight, Sex::Male, 7000.0, 182)
        .unwrap();
    let female = calc
        .compute(MeasurementType::Weight, Sex::Female, 7000.0, 182)
        .unwrap();
    // Female median at day 182 is lower, so the same value ranks higher.
    assert!(female.percentile > male.percentile);
}

#[test]
fn nearest_day_is_used_when_exact_day_missing() {
    // Day 100 is closest to table day 91.
    let reading = calculator()
        .compute(MeasurementType::Height, Sex::Male, 61.0, 100)
        .unwrap();
    assert_eq!(reading.lms.day, 91);
    assert_eq!(reading.percentile, 50.0);
}

#[test]
fn measurement_before_birth_is_invalid_date_range() {
    let err = PercentileCalculator::age_in_days(date(2024, 1, 10), date(2024, 1, 9)).unwrap_err();
    assert!(matches!(err, PercentileError::InvalidDateRange { .. }));

    let calc = calculator();
    let measurements: Measurements =
        [(MeasurementType::Weight, 4000.0)].into_iter().collect();
    let result = calc.compute_all(Sex::Male, date(2024, 1, 10), date(2024, 1, 9), &measurements);
    assert!(matches!(
        result,
        Err(NidoError::Percentile(PercentileError::InvalidDateRange { .. }))
    ));
}

#[test]
fn non_positive_value_is_an_explicit_error_never_nan() {
    let err = calculator()
        .compute(MeasurementType::Weight, Sex::Male, 0.0, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        NidoError::Percentile(PercentileError::InvalidLmsParameters { .. })
    ));
}

#[test]
fn compute_all_skips_nulls_and_non_positive_values() {
    let calc = calculator();
    let mut measurements = Measurements::new();
    measurements.set(MeasurementType::Weight, Some(3500.0));
    measurements.set(MeasurementType::Height, None);
    measurements.set(MeasurementType::HeadCircumference, Some(-2.0));

    let set = calc
        .compute_all(Sex::Male, date(2024, 1, 1), date(2024, 1, 1), &measurements)
        .unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(MeasurementType::Weight), Some(50.0));
}

#[test]
fn compute_all_covers_every_present_metric() {
    let calc = calculator();
    let measurements: Measurements = [
        (MeasurementType::Weight, 3500.0),
        (MeasurementType::Height, 50.0),
        (MeasurementType::HeadCircumference, 34.5),
    ]
    .into_iter()
    .collect();

    let set = calc
        .compute_all(Sex::Male, date(2024, 1, 1), date(2024, 1, 1), &measurements)
        .unwrap();
    assert_eq!(set.len(), 3);
    for (_, p) in set.iter() {
        assert_eq!(p, 50.0);
    }
}

#[test]
fn outputs_are_deterministic() {
    let calc = calculator();
    let a = calc
        .compute(MeasurementType::Weight, Sex::Female, 6100.0, 150)
        .unwrap();
    let b = calc
        .compute(MeasurementType::Weight, Sex::Female, 6100.0, 150)
        .unwrap();
    assert_eq!(a, b);
}
