use chrono::NaiveDate;

use crate::records::{MeasurementType, Sex};

/// Percentile computation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PercentileError {
    #[error("measurement date {measurement_date} precedes date of birth {date_of_birth}")]
    InvalidDateRange {
        date_of_birth: NaiveDate,
        measurement_date: NaiveDate,
    },

    #[error(
        "degenerate LMS inputs for {measurement_type} at day {day}: value={value}, m={m}, s={s}"
    )]
    InvalidLmsParameters {
        measurement_type: MeasurementType,
        day: i64,
        value: f64,
        m: f64,
        s: f64,
    },

    #[error("no reference rows available for {measurement_type}/{sex}")]
    TableUnavailable {
        measurement_type: MeasurementType,
        sex: Sex,
    },
}
