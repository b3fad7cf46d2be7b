//! PercentileCalculator — pure numeric transform from a raw measurement,
//! age, and sex to a z-score/percentile pair.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nido_core::constants::{
    GRAMS_PER_KILOGRAM, LMS_DECIMALS, PERCENTILE_DECIMALS, ZSCORE_DECIMALS,
};
use nido_core::errors::{NidoError, NidoResult, PercentileError};
use nido_core::models::LmsRow;
use nido_core::records::{round_to, MeasurementType, Measurements, PercentileSet, Sex};

use crate::lms;
use crate::provider::ReferenceTableProvider;

/// One computed percentile with its inputs, for client-side display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileReading {
    pub measurement_type: MeasurementType,
    pub sex: Sex,
    /// Raw input value (grams for weight, centimeters otherwise).
    pub value: f64,
    /// Percentile in [0, 100], rounded to 2 decimals.
    pub percentile: f64,
    /// Z-score rounded to 4 decimals.
    pub zscore: f64,
    pub age_in_days: i64,
    /// Reference row used, parameters rounded to 6 decimals.
    pub lms: LmsRow,
}

/// Stateless calculator over an injected reference-table provider.
pub struct PercentileCalculator {
    provider: Arc<ReferenceTableProvider>,
}

impl PercentileCalculator {
    pub fn new(provider: Arc<ReferenceTableProvider>) -> Self {
        Self { provider }
    }

    /// Whole days between birth and measurement.
    ///
    /// Fails with `InvalidDateRange` when the measurement precedes birth —
    /// the orchestrator's stale-date retry keys off this error.
    pub fn age_in_days(
        date_of_birth: NaiveDate,
        measurement_date: NaiveDate,
    ) -> Result<i64, PercentileError> {
        if measurement_date < date_of_birth {
            return Err(PercentileError::InvalidDateRange {
                date_of_birth,
                measurement_date,
            });
        }
        Ok((measurement_date - date_of_birth).num_days())
    }

    /// Compute percentile and z-score for one measurement.
    ///
    /// Weight is converted from grams to kilograms before table lookup;
    /// height and head circumference are centimeters throughout.
    pub fn compute(
        &self,
        measurement_type: MeasurementType,
        sex: Sex,
        raw_value: f64,
        age_in_days: i64,
    ) -> NidoResult<PercentileReading> {
        let value = match measurement_type {
            MeasurementType::Weight => raw_value / GRAMS_PER_KILOGRAM,
            _ => raw_value,
        };

        let row = self.provider.lms_for(measurement_type, sex, age_in_days)?;

        let z = lms::zscore(value, row.l, row.m, row.s).ok_or(
            PercentileError::InvalidLmsParameters {
                measurement_type,
                day: row.day,
                value,
                m: row.m,
                s: row.s,
            },
        )?;
        let percentile = lms::percentile_from_z(z);

        Ok(PercentileReading {
            measurement_type,
            sex,
            value: raw_value,
            percentile: round_to(percentile, PERCENTILE_DECIMALS),
            zscore: round_to(z, ZSCORE_DECIMALS),
            age_in_days,
            lms: LmsRow {
                day: row.day,
                l: round_to(row.l, LMS_DECIMALS),
                m: round_to(row.m, LMS_DECIMALS),
                s: round_to(row.s, LMS_DECIMALS),
            },
        })
    }

    /// Compute percentiles for every present, positive measurement.
    ///
    /// Null and non-positive values are skipped, as are per-metric failures
    /// (degenerate reference rows, missing tables) — those are logged and
    /// never corrupt sibling metrics. A measurement date before birth aborts
    /// the whole call with `InvalidDateRange`.
    pub fn compute_all(
        &self,
        sex: Sex,
        date_of_birth: NaiveDate,
        measurement_date: NaiveDate,
        measurements: &Measurements,
    ) -> NidoResult<PercentileSet> {
        let age_in_days = Self::age_in_days(date_of_birth, measurement_date)?;

        let mut result = PercentileSet::new();
        for (measurement_type, value) in measurements.iter() {
            let Some(value) = value else { continue };
            if value <= 0.0 {
                continue;
            }
            match self.compute(measurement_type, sex, value, age_in_days) {
                Ok(reading) => {
                    result.insert(measurement_type, reading.percentile);
                }
                Err(NidoError::Percentile(err)) => {
                    tracing::warn!(
                        measurement_type = %measurement_type,
                        sex = %sex,
                        value,
                        error = %err,
                        "skipping percentile for metric"
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Ok(result)
    }
}
