use nido_core::errors::NidoResult;
use nido_core::models::LmsRow;
use nido_core::records::{MeasurementType, Sex};
use nido_core::traits::IReferenceSource;

/// Deterministic synthetic LMS tables.
///
/// Every row uses L=0 (log branch) so z-scores are hand-checkable:
/// a value equal to M yields z=0 and percentile 50. Male and female medians
/// differ so sex changes observably move percentiles.
pub struct StaticReferenceSource;

fn row(day: i64, m: f64, s: f64) -> LmsRow {
    LmsRow { day, l: 0.0, m, s }
}

impl IReferenceSource for StaticReferenceSource {
    fn rows(&self, measurement_type: MeasurementType, sex: Sex) -> NidoResult<Vec<LmsRow>> {
        // Medians in kilograms for weight, centimeters otherwise.
        let rows = match (measurement_type, sex) {
            (MeasurementType::Weight, Sex::Male) => vec![
                row(0, 3.5, 0.12),
                row(91, 6.0, 0.12),
                row(182, 7.9, 0.12),
                row(365, 9.6, 0.12),
            ],
            (MeasurementType::Weight, Sex::Female) => vec![
                row(0, 3.3, 0.12),
                row(91, 5.5, 0.12),
                row(182, 7.3, 0.12),
                row(365, 8.9, 0.12),
            ],
            (MeasurementType::Height, Sex::Male) => vec![
                row(0, 50.0, 0.035),
                row(91, 61.0, 0.035),
                row(182, 67.0, 0.035),
                row(365, 75.0, 0.035),
            ],
            (MeasurementType::Height, Sex::Female) => vec![
                row(0, 49.0, 0.035),
                row(91, 59.5, 0.035),
                row(182, 65.5, 0.035),
                row(365, 74.0, 0.035),
            ],
            (MeasurementType::HeadCircumference, Sex::Male) => vec![
                row(0, 34.5, 0.03),
                row(91, 40.5, 0.03),
                row(182, 43.0, 0.03),
                row(365, 46.0, 0.03),
            ],
            (MeasurementType::HeadCircumference, Sex::Female) => vec![
                row(0, 33.9, 0.03),
                row(91, 39.5, 0.03),
                row(182, 42.0, 0.03),
                row(365, 44.8, 0.03),
            ],
        };
        Ok(rows)
    }
}
